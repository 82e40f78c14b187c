use std::sync::Arc;

use crate::data::post_repository::PostRepository;
use crate::domain::error::DomainError;
use crate::domain::page::{Page, PageRequest};
use crate::domain::post::{Post, PostFilter, PostUpdate, validate_content, validate_title};
use tracing::instrument;
use uuid::Uuid;

#[derive(Clone)]
pub struct PostService<R: PostRepository + 'static> {
    repo: Arc<R>,
}

impl<R> PostService<R>
where
    R: PostRepository + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    /// Loads a post for its detail page, counting the view.
    pub async fn view_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.repo
            .record_view(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    pub async fn get_posts(
        &self,
        filter: PostFilter,
        page: PageRequest,
    ) -> Result<Page<Post>, DomainError> {
        let posts = self
            .repo
            .get_posts(filter, page.limit(), page.offset())
            .await?;
        let total = self.repo.count_posts(filter).await?;
        Ok(Page::new(posts, page, total))
    }

    /// Loads a post the caller is allowed to change.
    pub async fn get_own_post(&self, author_id: Uuid, post_id: Uuid) -> Result<Post, DomainError> {
        let post = self.get_post(post_id).await?;
        if post.author_id != author_id {
            return Err(DomainError::Forbidden);
        }
        Ok(post)
    }

    #[instrument(skip(self, content))]
    pub async fn create_post(
        &self,
        author_id: Uuid,
        title: String,
        content: String,
    ) -> Result<Post, DomainError> {
        validate_title(&title).map_err(DomainError::Validation)?;
        validate_content(&content).map_err(DomainError::Validation)?;
        let post = Post::new(author_id, title.trim().to_string(), content);
        self.repo.create(post).await
    }

    #[instrument(skip(self, update))]
    pub async fn update_post(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        update: PostUpdate,
    ) -> Result<Post, DomainError> {
        self.get_own_post(author_id, post_id).await?;
        if let Some(title) = &update.title {
            validate_title(title).map_err(DomainError::Validation)?;
        }
        if let Some(content) = &update.content {
            validate_content(content).map_err(DomainError::Validation)?;
        }
        let update = PostUpdate {
            title: update.title.map(|t| t.trim().to_string()),
            content: update.content,
        };
        match self.repo.update_post(post_id, author_id, update).await? {
            Some(post) => Ok(post),
            None => Err(DomainError::PostNotFound(post_id)),
        }
    }

    /// Deletes the post and returns it so its media can be cleaned up.
    #[instrument(skip(self))]
    pub async fn delete_post(&self, author_id: Uuid, post_id: Uuid) -> Result<Post, DomainError> {
        self.repo.delete_post(post_id, author_id).await
    }

    #[instrument(skip(self))]
    pub async fn set_featured(
        &self,
        is_staff: bool,
        post_id: Uuid,
        featured: bool,
    ) -> Result<Post, DomainError> {
        if !is_staff {
            return Err(DomainError::Forbidden);
        }
        self.repo
            .set_featured(post_id, featured)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))
    }
}

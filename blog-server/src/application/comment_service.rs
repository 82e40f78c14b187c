use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::error::DomainError;
use crate::domain::post::Comment;

pub const MAX_COMMENT_LEN: usize = 2000;

#[derive(Clone)]
pub struct CommentService<C, P>
where
    C: CommentRepository + 'static,
    P: PostRepository + 'static,
{
    comments: Arc<C>,
    posts: Arc<P>,
}

impl<C, P> CommentService<C, P>
where
    C: CommentRepository + 'static,
    P: PostRepository + 'static,
{
    pub fn new(comments: Arc<C>, posts: Arc<P>) -> Self {
        Self { comments, posts }
    }

    #[instrument(skip(self, content))]
    pub async fn add_comment(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        content: &str,
    ) -> Result<Comment, DomainError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::Validation("comment must not be empty".into()));
        }
        if content.chars().count() > MAX_COMMENT_LEN {
            return Err(DomainError::Validation(format!(
                "comment must be at most {MAX_COMMENT_LEN} characters"
            )));
        }
        self.comments.create(post_id, author_id, content).await
    }

    /// Newest first.
    pub async fn list(&self, post_id: Uuid) -> Result<Vec<Comment>, DomainError> {
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::PostNotFound(post_id));
        }
        self.comments.list_for_post(post_id).await
    }

    /// The comment's author and the author of the post it sits under may
    /// both delete it.
    #[instrument(skip(self))]
    pub async fn delete_comment(&self, user_id: Uuid, comment_id: Uuid) -> Result<(), DomainError> {
        let comment = self
            .comments
            .find_by_id(comment_id)
            .await?
            .ok_or(DomainError::CommentNotFound(comment_id))?;

        if comment.author_id != user_id {
            let post = self
                .posts
                .find_by_id(comment.post_id)
                .await?
                .ok_or(DomainError::PostNotFound(comment.post_id))?;
            if post.author_id != user_id {
                return Err(DomainError::Forbidden);
            }
        }
        self.comments.delete(comment_id).await
    }
}

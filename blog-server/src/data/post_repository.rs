use crate::data::db_error;
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostFilter, PostUpdate};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: Post) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError>;
    async fn update_post(
        &self,
        id: Uuid,
        author_id: Uuid,
        update: PostUpdate,
    ) -> Result<Option<Post>, DomainError>;
    /// Removes the post with its comments and votes and returns the deleted row.
    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> Result<Post, DomainError>;
    async fn get_posts(
        &self,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, DomainError>;
    async fn count_posts(&self, filter: PostFilter) -> Result<i64, DomainError>;
    /// Bumps the view counter and returns the post as it is afterwards.
    async fn record_view(&self, id: Uuid) -> Result<Option<Post>, DomainError>;
    async fn set_featured(&self, id: Uuid, featured: bool) -> Result<Option<Post>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str = "id, author_id, title, content, image_key, video_key, audio_key, \
                            view_count, featured, created_at, updated_at";

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (id, author_id, title, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post.id)
        .bind(post.author_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("failed to create post"))?;

        info!(post_id = %post.id, author_id = %post.author_id, "post created");
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("failed to find post"))
    }

    async fn update_post(
        &self,
        id: Uuid,
        author_id: Uuid,
        update: PostUpdate,
    ) -> Result<Option<Post>, DomainError> {
        let now = Utc::now();
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET
                title = COALESCE($1, title),
                content = COALESCE($2, content),
                updated_at = $3
            WHERE id = $4 AND author_id = $5
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(update.title)
        .bind(update.content)
        .bind(now)
        .bind(id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("failed to update post"))?;

        if post.is_some() {
            info!(post_id = %id, "post updated");
        }

        Ok(post)
    }

    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> Result<Post, DomainError> {
        let deleted = sqlx::query_as::<_, Post>(&format!(
            "DELETE FROM posts WHERE id = $1 AND author_id = $2 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("failed to delete post"))?;

        match deleted {
            Some(post) => {
                info!(post_id = %id, "post deleted");
                Ok(post)
            }
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
                        .bind(id)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(db_error("failed to check post"))?;

                if exists {
                    Err(DomainError::Forbidden)
                } else {
                    Err(DomainError::PostNotFound(id))
                }
            }
        }
    }

    async fn get_posts(
        &self,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, DomainError> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE ($1::uuid IS NULL OR author_id = $1)
              AND ($2::boolean IS NULL OR featured = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(filter.author_id)
        .bind(filter.featured)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("failed to fetch posts"))
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64, DomainError> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM posts
            WHERE ($1::uuid IS NULL OR author_id = $1)
              AND ($2::boolean IS NULL OR featured = $2)
            "#,
        )
        .bind(filter.author_id)
        .bind(filter.featured)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("failed to count posts"))
    }

    async fn record_view(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("failed to record post view"))
    }

    async fn set_featured(&self, id: Uuid, featured: bool) -> Result<Option<Post>, DomainError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET featured = $2 WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(featured)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("failed to feature post"))?;

        if post.is_some() {
            info!(post_id = %id, featured, "post featured flag changed");
        }
        Ok(post)
    }
}

use crate::data::db_error;
use crate::domain::error::DomainError;
use crate::domain::follow::FollowCounts;
use crate::domain::user::PublicUser;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Returns true if a new edge was created.
    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool, DomainError>;
    /// Returns true if an edge was removed.
    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool, DomainError>;
    async fn is_following(&self, follower_id: Uuid, followee_id: Uuid)
    -> Result<bool, DomainError>;
    async fn counts(&self, user_id: Uuid) -> Result<FollowCounts, DomainError>;
    async fn followers(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PublicUser>, DomainError>;
    async fn following(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PublicUser>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresFollowRepository {
    pool: PgPool,
}

impl PostgresFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowRepository for PostgresFollowRepository {
    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool, DomainError> {
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO follows (id, follower_id, followee_id, created_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(follower_id)
        .bind(followee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("failed to follow user"))?;

        if inserted.is_some() {
            info!(%follower_id, %followee_id, "follow created");
        }
        Ok(inserted.is_some())
    }

    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool, DomainError> {
        let affected = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("failed to unfollow user"))?
            .rows_affected();

        if affected > 0 {
            info!(%follower_id, %followee_id, "follow removed");
        }
        Ok(affected > 0)
    }

    async fn is_following(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("failed to check follow"))
    }

    async fn counts(&self, user_id: Uuid) -> Result<FollowCounts, DomainError> {
        sqlx::query_as::<_, FollowCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM follows WHERE followee_id = $1) AS followers,
                (SELECT COUNT(*) FROM follows WHERE follower_id = $1) AS following
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("failed to count follows"))
    }

    async fn followers(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PublicUser>, DomainError> {
        sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT u.id, u.username, u.first_name, u.last_name
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.followee_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("failed to list followers"))
    }

    async fn following(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PublicUser>, DomainError> {
        sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT u.id, u.username, u.first_name, u.last_name
            FROM follows f
            JOIN users u ON u.id = f.followee_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("failed to list following"))
    }
}

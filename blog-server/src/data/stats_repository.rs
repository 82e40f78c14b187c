use crate::data::db_error;
use crate::domain::error::DomainError;
use crate::domain::stats::{Activity, ActivityKind, SiteStats};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn site_stats(&self) -> Result<SiteStats, DomainError>;
    /// The newest `per_kind` posts, comments and sign-ups, unmerged.
    async fn recent_activity(&self, per_kind: i64) -> Result<Vec<Activity>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresStatsRepository {
    pool: PgPool,
}

impl PostgresStatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsRepository for PostgresStatsRepository {
    async fn site_stats(&self) -> Result<SiteStats, DomainError> {
        sqlx::query_as::<_, SiteStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM posts) AS posts_count,
                (SELECT COUNT(*) FROM comments) AS comments_count,
                (SELECT COUNT(*) FROM users) AS users_count
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("failed to load site stats"))
    }

    async fn recent_activity(&self, per_kind: i64) -> Result<Vec<Activity>, DomainError> {
        let posts: Vec<(String, DateTime<Utc>)> =
            sqlx::query_as("SELECT title, created_at FROM posts ORDER BY created_at DESC LIMIT $1")
                .bind(per_kind)
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("failed to load recent posts"))?;

        let comments: Vec<(String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT p.title, c.created_at
            FROM comments c
            JOIN posts p ON p.id = c.post_id
            ORDER BY c.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(per_kind)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("failed to load recent comments"))?;

        let users: Vec<(String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT username, date_joined FROM users ORDER BY date_joined DESC LIMIT $1",
        )
        .bind(per_kind)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("failed to load recent users"))?;

        let posts = posts.into_iter().map(|(title, at)| Activity {
            kind: ActivityKind::Post,
            message: format!("New post: {title}"),
            at,
        });
        let comments = comments.into_iter().map(|(title, at)| Activity {
            kind: ActivityKind::Comment,
            message: format!("New comment on '{title}'"),
            at,
        });
        let users = users.into_iter().map(|(username, at)| Activity {
            kind: ActivityKind::User,
            message: format!("New user: {username}"),
            at,
        });
        Ok(posts.chain(comments).chain(users).collect())
    }
}

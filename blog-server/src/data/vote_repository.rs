use std::collections::HashMap;

use crate::data::{db_error, is_foreign_key_violation};
use crate::domain::error::DomainError;
use crate::domain::vote::{VoteChange, VoteCounts, VoteOutcome};
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Applies `VoteChange::resolve` to the caller's vote atomically and
    /// returns the counts as of that transaction.
    async fn cast(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        requested: Option<bool>,
    ) -> Result<VoteOutcome, DomainError>;
    /// `PostNotFound` when the post does not exist.
    async fn counts(&self, post_id: Uuid) -> Result<VoteCounts, DomainError>;
    async fn counts_for(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, VoteCounts>, DomainError>;
    async fn user_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<bool>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresVoteRepository {
    pool: PgPool,
}

impl PostgresVoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COUNTS_SQL: &str = r#"
    SELECT
        COUNT(*) FILTER (WHERE is_like) AS likes,
        COUNT(*) FILTER (WHERE NOT is_like) AS dislikes
    FROM votes
    WHERE post_id = $1
"#;

const POST_COUNTS_SQL: &str = r#"
    SELECT
        COUNT(v.id) FILTER (WHERE v.is_like) AS likes,
        COUNT(v.id) FILTER (WHERE NOT v.is_like) AS dislikes
    FROM posts p
    LEFT JOIN votes v ON v.post_id = p.id
    WHERE p.id = $1
    GROUP BY p.id
"#;

async fn apply_change(
    conn: &mut PgConnection,
    change: VoteChange,
    user_id: Uuid,
    post_id: Uuid,
) -> Result<(), sqlx::Error> {
    match change {
        VoteChange::Insert(is_like) => {
            // A concurrent first vote that committed after our read turns
            // this insert into an update of that row.
            sqlx::query(
                r#"
                INSERT INTO votes (id, user_id, post_id, is_like, created_at)
                VALUES ($1, $2, $3, $4, now())
                ON CONFLICT (user_id, post_id) DO UPDATE SET is_like = EXCLUDED.is_like
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(post_id)
            .bind(is_like)
            .execute(&mut *conn)
            .await?;
        }
        VoteChange::Update(is_like) => {
            sqlx::query("UPDATE votes SET is_like = $3 WHERE user_id = $1 AND post_id = $2")
                .bind(user_id)
                .bind(post_id)
                .bind(is_like)
                .execute(&mut *conn)
                .await?;
        }
        VoteChange::Delete => {
            sqlx::query("DELETE FROM votes WHERE user_id = $1 AND post_id = $2")
                .bind(user_id)
                .bind(post_id)
                .execute(&mut *conn)
                .await?;
        }
        VoteChange::Keep => {}
    }
    Ok(())
}

#[async_trait]
impl VoteRepository for PostgresVoteRepository {
    async fn cast(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        requested: Option<bool>,
    ) -> Result<VoteOutcome, DomainError> {
        // Dropping the transaction without commit rolls it back, which also
        // covers clients that disconnect mid-request.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("failed to begin vote transaction"))?;

        let post_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
                .bind(post_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error("failed to check post"))?;
        if !post_exists {
            return Err(DomainError::PostNotFound(post_id));
        }

        let existing: Option<bool> = sqlx::query_scalar(
            "SELECT is_like FROM votes WHERE user_id = $1 AND post_id = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("failed to lock vote"))?;

        let change = VoteChange::resolve(existing, requested);
        apply_change(&mut *tx, change, user_id, post_id)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    DomainError::PostNotFound(post_id)
                } else {
                    db_error("failed to apply vote")(e)
                }
            })?;

        let counts = sqlx::query_as::<_, VoteCounts>(COUNTS_SQL)
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("failed to count votes"))?;

        tx.commit()
            .await
            .map_err(db_error("failed to commit vote"))?;

        debug!(%user_id, %post_id, action = change.action(), "vote cast");
        Ok(VoteOutcome {
            change,
            counts,
            user_vote: change.outcome(existing),
        })
    }

    async fn counts(&self, post_id: Uuid) -> Result<VoteCounts, DomainError> {
        sqlx::query_as::<_, VoteCounts>(POST_COUNTS_SQL)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("failed to count votes"))?
            .ok_or(DomainError::PostNotFound(post_id))
    }

    async fn counts_for(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, VoteCounts>, DomainError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                post_id,
                COUNT(*) FILTER (WHERE is_like) AS likes,
                COUNT(*) FILTER (WHERE NOT is_like) AS dislikes
            FROM votes
            WHERE post_id = ANY($1)
            GROUP BY post_id
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("failed to count votes"))?;

        Ok(rows
            .into_iter()
            .map(|(post_id, likes, dislikes)| (post_id, VoteCounts { likes, dislikes }))
            .collect())
    }

    async fn user_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<bool>, DomainError> {
        sqlx::query_scalar("SELECT is_like FROM votes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("failed to read vote"))
    }
}

use crate::data::{db_error, is_foreign_key_violation};
use crate::domain::error::DomainError;
use crate::domain::media::{MediaRef, MediaSlot, MediaTarget};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

/// Reads and writes the media reference column of a record.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn current(&self, target: MediaTarget) -> Result<MediaRef, DomainError>;
    async fn set(&self, target: MediaTarget, media: &MediaRef) -> Result<(), DomainError>;
}

#[derive(Clone)]
pub struct PostgresMediaRepository {
    pool: PgPool,
}

impl PostgresMediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Column of `posts` holding the slot, `None` for profile pictures.
fn post_column(slot: MediaSlot) -> Option<&'static str> {
    match slot {
        MediaSlot::PostImage => Some("image_key"),
        MediaSlot::PostVideo => Some("video_key"),
        MediaSlot::PostAudio => Some("audio_key"),
        MediaSlot::ProfilePicture => None,
    }
}

#[async_trait]
impl MediaRepository for PostgresMediaRepository {
    async fn current(&self, target: MediaTarget) -> Result<MediaRef, DomainError> {
        let column: Option<Option<String>> = match post_column(target.slot) {
            None => {
                sqlx::query_scalar("SELECT picture_key FROM profiles WHERE user_id = $1")
                    .bind(target.owner_id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_error("failed to read profile picture"))?
            }
            Some(column) => {
                let value = sqlx::query_scalar(&format!(
                    "SELECT {column} FROM posts WHERE id = $1"
                ))
                .bind(target.owner_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("failed to read post media"))?;
                if value.is_none() {
                    return Err(DomainError::PostNotFound(target.owner_id));
                }
                value
            }
        };
        // a user without a profile row yet still has the placeholder
        Ok(MediaRef::from_column(target.slot, column.flatten()))
    }

    async fn set(&self, target: MediaTarget, media: &MediaRef) -> Result<(), DomainError> {
        let key = media.to_column();
        match post_column(target.slot) {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO profiles (user_id, picture_key, updated_at)
                    VALUES ($1, $2, now())
                    ON CONFLICT (user_id)
                    DO UPDATE SET picture_key = EXCLUDED.picture_key, updated_at = now()
                    "#,
                )
                .bind(target.owner_id)
                .bind(key)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    if is_foreign_key_violation(&e) {
                        DomainError::UserNotFound(target.owner_id.to_string())
                    } else {
                        db_error("failed to save profile picture")(e)
                    }
                })?;
            }
            Some(column) => {
                let updated = sqlx::query(&format!(
                    "UPDATE posts SET {column} = $2, updated_at = now() WHERE id = $1"
                ))
                .bind(target.owner_id)
                .bind(key)
                .execute(&self.pool)
                .await
                .map_err(db_error("failed to save post media"))?;
                if updated.rows_affected() == 0 {
                    return Err(DomainError::PostNotFound(target.owner_id));
                }
            }
        }
        info!(owner_id = %target.owner_id, slot = %target.slot, "media reference saved");
        Ok(())
    }
}

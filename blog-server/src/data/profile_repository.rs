use crate::data::{db_error, is_foreign_key_violation};
use crate::domain::error::DomainError;
use crate::domain::media::{MediaRef, MediaSlot};
use crate::domain::profile::Profile;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Returns the user's profile, creating the default one on first access.
    async fn get_or_create(&self, user_id: Uuid) -> Result<Profile, DomainError>;
    async fn save(&self, profile: &Profile) -> Result<Profile, DomainError>;
    /// Creates profiles for every user without one and returns their usernames.
    async fn create_missing(&self) -> Result<Vec<String>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: Uuid,
    bio: String,
    location: String,
    birth_date: Option<NaiveDate>,
    website: String,
    twitter_handle: String,
    github_username: String,
    facebook_url: String,
    instagram_username: String,
    tiktok_username: String,
    snapchat_username: String,
    privacy: String,
    picture_key: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = DomainError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            user_id: row.user_id,
            bio: row.bio,
            location: row.location,
            birth_date: row.birth_date,
            website: row.website,
            twitter_handle: row.twitter_handle,
            github_username: row.github_username,
            facebook_url: row.facebook_url,
            instagram_username: row.instagram_username,
            tiktok_username: row.tiktok_username,
            snapchat_username: row.snapchat_username,
            privacy: row.privacy.parse()?,
            picture: MediaRef::from_column(MediaSlot::ProfilePicture, row.picture_key),
            updated_at: row.updated_at,
        })
    }
}

const PROFILE_COLUMNS: &str = "user_id, bio, location, birth_date, website, twitter_handle, \
                               github_username, facebook_url, instagram_username, tiktok_username, \
                               snapchat_username, privacy, picture_key, updated_at";

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn get_or_create(&self, user_id: Uuid) -> Result<Profile, DomainError> {
        let created = sqlx::query(
            "INSERT INTO profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DomainError::UserNotFound(user_id.to_string())
            } else {
                db_error("failed to create profile")(e)
            }
        })?;
        if created.rows_affected() > 0 {
            info!(%user_id, "profile created");
        }

        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("failed to load profile"))?;
        row.try_into()
    }

    async fn save(&self, profile: &Profile) -> Result<Profile, DomainError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            UPDATE profiles
            SET bio = $2, location = $3, birth_date = $4, website = $5,
                twitter_handle = $6, github_username = $7, facebook_url = $8,
                instagram_username = $9, tiktok_username = $10, snapchat_username = $11,
                privacy = $12, updated_at = $13
            WHERE user_id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(profile.user_id)
        .bind(&profile.bio)
        .bind(&profile.location)
        .bind(profile.birth_date)
        .bind(&profile.website)
        .bind(&profile.twitter_handle)
        .bind(&profile.github_username)
        .bind(&profile.facebook_url)
        .bind(&profile.instagram_username)
        .bind(&profile.tiktok_username)
        .bind(&profile.snapchat_username)
        .bind(profile.privacy.as_str())
        .bind(profile.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("failed to save profile"))?
        .ok_or_else(|| DomainError::UserNotFound(profile.user_id.to_string()))?;

        info!(user_id = %profile.user_id, "profile updated");
        row.try_into()
    }

    async fn create_missing(&self) -> Result<Vec<String>, DomainError> {
        sqlx::query_scalar(
            r#"
            WITH created AS (
                INSERT INTO profiles (user_id)
                SELECT u.id FROM users u
                LEFT JOIN profiles p ON p.user_id = u.id
                WHERE p.user_id IS NULL
                ON CONFLICT (user_id) DO NOTHING
                RETURNING user_id
            )
            SELECT u.username FROM created c JOIN users u ON u.id = c.user_id
            ORDER BY u.username
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("failed to create missing profiles"))
    }
}

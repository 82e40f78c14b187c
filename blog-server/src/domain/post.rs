use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::media::{MediaRef, MediaSlot};

pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub image_key: Option<String>,
    pub video_key: Option<String>,
    pub audio_key: Option<String>,
    pub view_count: i64,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(author_id: Uuid, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            content,
            image_key: None,
            video_key: None,
            audio_key: None,
            view_count: 0,
            featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn media(&self, slot: MediaSlot) -> MediaRef {
        let column = match slot {
            MediaSlot::PostImage => &self.image_key,
            MediaSlot::PostVideo => &self.video_key,
            MediaSlot::PostAudio => &self.audio_key,
            MediaSlot::ProfilePicture => return MediaRef::Empty,
        };
        MediaRef::from_column(slot, column.clone())
    }

    /// Keys of every object this post owns in the content store.
    pub fn stored_keys(&self) -> Vec<String> {
        MediaSlot::POST_SLOTS
            .iter()
            .filter_map(|slot| self.media(*slot).stored_key().map(str::to_owned))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostFilter {
    pub author_id: Option<Uuid>,
    pub featured: Option<bool>,
}

pub fn validate_title(title: &str) -> Result<(), String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("title must not be empty".into());
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(format!("title must be at most {MAX_TITLE_LEN} characters"));
    }
    Ok(())
}

pub fn validate_content(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("content must not be empty".into());
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SiteStats {
    pub posts_count: i64,
    pub comments_count: i64,
    pub users_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Post,
    Comment,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Newest first, capped at `limit`.
pub fn merge_activity(mut items: Vec<Activity>, limit: usize) -> Vec<Activity> {
    items.sort_by(|a, b| b.at.cmp(&a.at));
    items.truncate(limit);
    items
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::profile_service::ProfileView;
use crate::domain::media::MediaSlot;
use crate::domain::page::PageRequest;
use crate::domain::post::{Comment, Post, PostUpdate};
use crate::domain::user::{NewAccount, User};
use crate::domain::vote::{VoteCounts, VoteOutcome};

// ======================= AUTH =======================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl From<RegisterRequest> for NewAccount {
    fn from(req: RegisterRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            password: req.password,
        }
    }
}

/// `login` is a username or an email address.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(rename = "token_type")]
    pub token_type: String, // "Bearer"
    pub user: User,
}

// ======================= POSTS =======================

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl From<UpdatePostRequest> for PostUpdate {
    fn from(req: UpdatePostRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Username of the author.
    pub author: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct FeatureRequest {
    pub featured: bool,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
    pub view_count: i64,
    pub featured: bool,
    pub likes: i64,
    pub dislikes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_vote: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostResponse {
    pub fn new(post: Post, counts: VoteCounts, user_vote: Option<bool>) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            title: post.title,
            content: post.content,
            image_url: None,
            video_url: None,
            audio_url: None,
            view_count: post.view_count,
            featured: post.featured,
            likes: counts.likes,
            dislikes: counts.dislikes,
            user_vote,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }

    pub fn set_url(&mut self, slot: MediaSlot, url: Option<String>) {
        match slot {
            MediaSlot::PostImage => self.image_url = url,
            MediaSlot::PostVideo => self.video_url = url,
            MediaSlot::PostAudio => self.audio_url = url,
            MediaSlot::ProfilePicture => {}
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Serialize)]
pub struct MediaResponse {
    pub slot: MediaSlot,
    pub url: Option<String>,
}

// ======================= VOTES =======================

/// `true` likes, `false` dislikes, `null` clears.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub is_like: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub action: &'static str,
    pub likes: i64,
    pub dislikes: i64,
    pub user_vote: Option<bool>,
}

impl From<VoteOutcome> for VoteResponse {
    fn from(outcome: VoteOutcome) -> Self {
        Self {
            action: outcome.change.action(),
            likes: outcome.counts.likes,
            dislikes: outcome.counts.dislikes,
            user_vote: outcome.user_vote,
        }
    }
}

// ======================= COMMENTS =======================

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

// ======================= PROFILES =======================

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub view: ProfileView,
    pub picture_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl From<&PageQuery> for PageRequest {
    fn from(query: &PageQuery) -> Self {
        PageRequest::new(query.page, query.page_size)
    }
}

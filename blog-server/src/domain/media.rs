use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Shared placeholder every profile falls back to. Never deleted.
pub const DEFAULT_PROFILE_PICTURE: &str = "profile_pics/default.jpg";

const MIB: usize = 1024 * 1024;

/// What a media column currently points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum MediaRef {
    /// Nothing attached and no placeholder for this slot.
    Empty,
    /// The slot's shared default object.
    Placeholder,
    /// A user-supplied object owned by exactly one record.
    Stored(String),
}

impl MediaRef {
    pub fn from_column(slot: MediaSlot, column: Option<String>) -> Self {
        match column {
            Some(key) if key.is_empty() => slot.fallback(),
            Some(key) if key == DEFAULT_PROFILE_PICTURE => MediaRef::Placeholder,
            Some(key) => MediaRef::Stored(key),
            None => slot.fallback(),
        }
    }

    pub fn to_column(&self) -> Option<String> {
        match self {
            MediaRef::Stored(key) => Some(key.clone()),
            MediaRef::Empty | MediaRef::Placeholder => None,
        }
    }

    pub fn stored_key(&self) -> Option<&str> {
        match self {
            MediaRef::Stored(key) => Some(key.as_str()),
            _ => None,
        }
    }

    pub fn is_default(&self) -> bool {
        !matches!(self, MediaRef::Stored(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSlot {
    ProfilePicture,
    PostImage,
    PostVideo,
    PostAudio,
}

const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];
const VIDEO_TYPES: &[(&str, &str)] = &[
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
    ("video/ogg", "ogv"),
];
const AUDIO_TYPES: &[(&str, &str)] = &[
    ("audio/mpeg", "mp3"),
    ("audio/wav", "wav"),
    ("audio/x-wav", "wav"),
    ("audio/ogg", "ogg"),
];

impl MediaSlot {
    pub const POST_SLOTS: [MediaSlot; 3] =
        [MediaSlot::PostImage, MediaSlot::PostVideo, MediaSlot::PostAudio];

    pub fn prefix(self) -> &'static str {
        match self {
            MediaSlot::ProfilePicture => "profile_pics",
            MediaSlot::PostImage => "blog_images",
            MediaSlot::PostVideo => "blog_videos",
            MediaSlot::PostAudio => "blog_audio",
        }
    }

    pub fn fallback(self) -> MediaRef {
        match self {
            MediaSlot::ProfilePicture => MediaRef::Placeholder,
            _ => MediaRef::Empty,
        }
    }

    pub fn placeholder_key(self) -> Option<&'static str> {
        match self {
            MediaSlot::ProfilePicture => Some(DEFAULT_PROFILE_PICTURE),
            _ => None,
        }
    }

    pub fn max_bytes(self) -> usize {
        match self {
            MediaSlot::ProfilePicture | MediaSlot::PostImage => 10 * MIB,
            MediaSlot::PostVideo | MediaSlot::PostAudio => 50 * MIB,
        }
    }

    fn accepted(self) -> &'static [(&'static str, &'static str)] {
        match self {
            MediaSlot::ProfilePicture | MediaSlot::PostImage => IMAGE_TYPES,
            MediaSlot::PostVideo => VIDEO_TYPES,
            MediaSlot::PostAudio => AUDIO_TYPES,
        }
    }

    /// Checks an upload against this slot and returns the file extension to store it under.
    pub fn validate(self, upload: &MediaUpload) -> Result<&'static str, DomainError> {
        if upload.bytes.is_empty() {
            return Err(DomainError::Validation("uploaded file is empty".into()));
        }
        if upload.bytes.len() > self.max_bytes() {
            return Err(DomainError::PayloadTooLarge {
                limit: self.max_bytes(),
            });
        }
        let content_type = upload.content_type.to_ascii_lowercase();
        self.accepted()
            .iter()
            .find(|(mime, _)| *mime == content_type)
            .map(|(_, ext)| *ext)
            .ok_or_else(|| {
                DomainError::Validation(format!(
                    "content type {} is not accepted for {}",
                    upload.content_type, self
                ))
            })
    }

    pub fn fresh_key(self, ext: &str) -> String {
        format!("{}/{}.{}", self.prefix(), Uuid::new_v4(), ext)
    }
}

impl fmt::Display for MediaSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaSlot::ProfilePicture => "profile picture",
            MediaSlot::PostImage => "image",
            MediaSlot::PostVideo => "video",
            MediaSlot::PostAudio => "audio",
        };
        f.write_str(name)
    }
}

/// Parses the `{slot}` path segment of post media routes.
impl FromStr for MediaSlot {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaSlot::PostImage),
            "video" => Ok(MediaSlot::PostVideo),
            "audio" => Ok(MediaSlot::PostAudio),
            other => Err(DomainError::Validation(format!(
                "unknown media slot: {other}"
            ))),
        }
    }
}

/// A record's media column: the profile of a user or one slot of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaTarget {
    pub owner_id: Uuid,
    pub slot: MediaSlot,
}

impl MediaTarget {
    pub fn profile_picture(user_id: Uuid) -> Self {
        Self {
            owner_id: user_id,
            slot: MediaSlot::ProfilePicture,
        }
    }

    pub fn post(post_id: Uuid, slot: MediaSlot) -> Self {
        Self {
            owner_id: post_id,
            slot,
        }
    }
}

#[derive(Clone)]
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: Option<String>,
}

impl fmt::Debug for MediaUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaUpload")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .field("file_name", &self.file_name)
            .finish()
    }
}

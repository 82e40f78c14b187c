use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::media::MediaRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    Public,
    Private,
    /// Visible to any signed-in user.
    Registered,
}

impl Privacy {
    pub fn as_str(self) -> &'static str {
        match self {
            Privacy::Public => "public",
            Privacy::Private => "private",
            Privacy::Registered => "registered",
        }
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Privacy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Privacy::Public),
            "private" => Ok(Privacy::Private),
            "registered" => Ok(Privacy::Registered),
            other => Err(DomainError::Internal(format!(
                "unknown privacy setting: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub bio: String,
    pub location: String,
    pub birth_date: Option<NaiveDate>,
    pub website: String,
    pub twitter_handle: String,
    pub github_username: String,
    pub facebook_url: String,
    pub instagram_username: String,
    pub tiktok_username: String,
    pub snapchat_username: String,
    pub privacy: Privacy,
    pub picture: MediaRef,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            bio: String::new(),
            location: String::new(),
            birth_date: None,
            website: String::new(),
            twitter_handle: String::new(),
            github_username: String::new(),
            facebook_url: String::new(),
            instagram_username: String::new(),
            tiktok_username: String::new(),
            snapchat_username: String::new(),
            privacy: Privacy::Public,
            picture: MediaRef::Placeholder,
            updated_at: Utc::now(),
        }
    }
}

/// Settings form. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub location: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub website: Option<String>,
    pub twitter_handle: Option<String>,
    pub github_username: Option<String>,
    pub facebook_url: Option<String>,
    pub instagram_username: Option<String>,
    pub tiktok_username: Option<String>,
    pub snapchat_username: Option<String>,
    pub privacy: Option<Privacy>,
}

impl ProfileUpdate {
    pub fn normalize(mut self) -> Result<Self, String> {
        for handle in [
            &mut self.twitter_handle,
            &mut self.instagram_username,
            &mut self.tiktok_username,
        ]
        .into_iter()
        .flatten()
        {
            *handle = handle.trim().trim_start_matches('@').to_string();
        }
        for url in [&self.website, &self.facebook_url].into_iter().flatten() {
            if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("{url} is not a valid URL"));
            }
        }
        let limits = [
            ("bio", &self.bio, 500),
            ("location", &self.location, 100),
            ("website", &self.website, 200),
            ("facebook_url", &self.facebook_url, 200),
            ("twitter_handle", &self.twitter_handle, 50),
            ("github_username", &self.github_username, 50),
            ("instagram_username", &self.instagram_username, 50),
            ("tiktok_username", &self.tiktok_username, 50),
            ("snapchat_username", &self.snapchat_username, 50),
        ];
        for (name, value, max) in limits {
            if value.as_ref().is_some_and(|v| v.chars().count() > max) {
                return Err(format!("{name} must be at most {max} characters"));
            }
        }
        Ok(self)
    }

    pub fn apply(self, profile: &mut Profile) {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field { profile.$field = value; })*
            };
        }
        set!(
            bio,
            location,
            website,
            twitter_handle,
            github_username,
            facebook_url,
            instagram_username,
            tiktok_username,
            snapchat_username,
            privacy
        );
        if self.birth_date.is_some() {
            profile.birth_date = self.birth_date;
        }
        profile.updated_at = Utc::now();
    }
}

/// Who is asking to see something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    Anonymous,
    User(Uuid),
}

impl Requester {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Requester::User(_))
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Requester::User(id) => Some(*id),
            Requester::Anonymous => None,
        }
    }
}

pub fn can_view(profile: &Profile, requester: &Requester) -> bool {
    match profile.privacy {
        Privacy::Public => true,
        Privacy::Registered => requester.is_authenticated(),
        Privacy::Private => requester.user_id() == Some(profile.user_id),
    }
}

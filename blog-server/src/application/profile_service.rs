use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::data::follow_repository::FollowRepository;
use crate::data::profile_repository::ProfileRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::follow::FollowCounts;
use crate::domain::profile::{Profile, ProfileUpdate, Requester, can_view};
use crate::domain::user::{PublicUser, User};

pub const SEARCH_LIMIT: i64 = 20;

/// Everything the profile page shows about a user.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub user: PublicUser,
    pub profile: Profile,
    pub counts: FollowCounts,
    pub is_following: bool,
    pub is_own: bool,
}

#[derive(Clone)]
pub struct ProfileService<U, P, F>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    F: FollowRepository + 'static,
{
    users: Arc<U>,
    profiles: Arc<P>,
    follows: Arc<F>,
}

impl<U, P, F> ProfileService<U, P, F>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    F: FollowRepository + 'static,
{
    pub fn new(users: Arc<U>, profiles: Arc<P>, follows: Arc<F>) -> Self {
        Self {
            users,
            profiles,
            follows,
        }
    }

    pub async fn find_user(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))
    }

    /// Loads the user and profile, refusing with `Forbidden` when the
    /// profile's privacy setting hides it from `requester`.
    pub async fn visible_profile(
        &self,
        username: &str,
        requester: Requester,
    ) -> Result<(User, Profile), DomainError> {
        let user = self.find_user(username).await?;
        let profile = self.profiles.get_or_create(user.id).await?;
        if !can_view(&profile, &requester) {
            debug!(username, privacy = %profile.privacy, "profile hidden from requester");
            return Err(DomainError::Forbidden);
        }
        Ok((user, profile))
    }

    #[instrument(skip(self))]
    pub async fn view(
        &self,
        username: &str,
        requester: Requester,
    ) -> Result<ProfileView, DomainError> {
        let (user, profile) = self.visible_profile(username, requester).await?;
        let counts = self.follows.counts(user.id).await?;
        let is_following = match requester.user_id() {
            Some(viewer) if viewer != user.id => self.follows.is_following(viewer, user.id).await?,
            _ => false,
        };
        Ok(ProfileView {
            is_own: requester.user_id() == Some(user.id),
            user: user.into(),
            profile,
            counts,
            is_following,
        })
    }

    pub async fn own_profile(&self, user_id: Uuid) -> Result<Profile, DomainError> {
        self.profiles.get_or_create(user_id).await
    }

    #[instrument(skip(self, update))]
    pub async fn update_settings(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Profile, DomainError> {
        let update = update.normalize().map_err(DomainError::Validation)?;
        let mut profile = self.profiles.get_or_create(user_id).await?;
        update.apply(&mut profile);
        self.profiles.save(&profile).await
    }

    /// Case-insensitive match on username and names. A blank query finds
    /// nobody.
    pub async fn search(&self, query: &str) -> Result<Vec<PublicUser>, DomainError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.users.search(query, SEARCH_LIMIT).await
    }
}

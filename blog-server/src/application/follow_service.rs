use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::profile_service::ProfileService;
use crate::data::follow_repository::FollowRepository;
use crate::data::profile_repository::ProfileRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::follow::FollowState;
use crate::domain::page::{Page, PageRequest};
use crate::domain::profile::Requester;
use crate::domain::user::PublicUser;

#[derive(Clone)]
pub struct FollowService<U, P, F>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    F: FollowRepository + 'static,
{
    profiles: ProfileService<U, P, F>,
    follows: Arc<F>,
}

impl<U, P, F> FollowService<U, P, F>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    F: FollowRepository + 'static,
{
    pub fn new(profiles: ProfileService<U, P, F>, follows: Arc<F>) -> Self {
        Self { profiles, follows }
    }

    /// Follows `username`, or unfollows if already following.
    #[instrument(skip(self))]
    pub async fn toggle(&self, follower_id: Uuid, username: &str) -> Result<FollowState, DomainError> {
        let target = self.profiles.find_user(username).await?;
        if target.id == follower_id {
            return Err(DomainError::Validation("you cannot follow yourself".into()));
        }

        let following = if self.follows.is_following(follower_id, target.id).await? {
            self.follows.unfollow(follower_id, target.id).await?;
            false
        } else {
            self.follows.follow(follower_id, target.id).await?;
            true
        };
        info!(followee_id = %target.id, following, "follow toggled");

        let counts = self.follows.counts(target.id).await?;
        Ok(FollowState { following, counts })
    }

    pub async fn followers(
        &self,
        username: &str,
        requester: Requester,
        page: PageRequest,
    ) -> Result<Page<PublicUser>, DomainError> {
        let (user, _) = self.profiles.visible_profile(username, requester).await?;
        let counts = self.follows.counts(user.id).await?;
        let items = self
            .follows
            .followers(user.id, page.limit(), page.offset())
            .await?;
        Ok(Page::new(items, page, counts.followers))
    }

    pub async fn following(
        &self,
        username: &str,
        requester: Requester,
        page: PageRequest,
    ) -> Result<Page<PublicUser>, DomainError> {
        let (user, _) = self.profiles.visible_profile(username, requester).await?;
        let counts = self.follows.counts(user.id).await?;
        let items = self
            .follows
            .following(user.id, page.limit(), page.offset())
            .await?;
        Ok(Page::new(items, page, counts.following))
    }
}

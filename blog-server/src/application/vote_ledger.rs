use std::collections::HashMap;
use std::sync::Arc;

use tracing::{instrument, warn};
use uuid::Uuid;

use crate::data::vote_repository::VoteRepository;
use crate::domain::error::DomainError;
use crate::domain::vote::{VoteCounts, VoteOutcome};

const MAX_CAST_ATTEMPTS: u32 = 3;

/// Likes and dislikes, at most one per user and post.
#[derive(Clone)]
pub struct VoteLedger<R: VoteRepository + 'static> {
    repo: Arc<R>,
}

impl<R> VoteLedger<R>
where
    R: VoteRepository + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// `Some(true)` likes, `Some(false)` dislikes, `None` clears. Casting the
    /// polarity already on record removes the vote.
    #[instrument(skip(self))]
    pub async fn cast_vote(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        is_like: Option<bool>,
    ) -> Result<VoteOutcome, DomainError> {
        let mut attempt = 1;
        loop {
            match self.repo.cast(user_id, post_id, is_like).await {
                Err(DomainError::Conflict(reason)) if attempt < MAX_CAST_ATTEMPTS => {
                    warn!(attempt, %reason, "vote lost a race, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    pub async fn counts(&self, post_id: Uuid) -> Result<VoteCounts, DomainError> {
        self.repo.counts(post_id).await
    }

    pub async fn counts_for(
        &self,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, VoteCounts>, DomainError> {
        self.repo.counts_for(post_ids).await
    }

    pub async fn user_vote(
        &self,
        user_id: Uuid,
        post_id: Uuid,
    ) -> Result<Option<bool>, DomainError> {
        self.repo.user_vote(user_id, post_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vote::VoteChange;
    use crate::testing::InMemoryVoteRepository;

    fn ledger() -> (VoteLedger<InMemoryVoteRepository>, Arc<InMemoryVoteRepository>, Uuid) {
        let repo = Arc::new(InMemoryVoteRepository::default());
        let post_id = Uuid::new_v4();
        repo.add_post(post_id);
        (VoteLedger::new(Arc::clone(&repo)), repo, post_id)
    }

    #[tokio::test]
    async fn test_like_twice_toggles_off() {
        let (ledger, repo, post_id) = ledger();
        let user = Uuid::new_v4();

        let first = ledger.cast_vote(user, post_id, Some(true)).await.unwrap();
        assert_eq!(first.user_vote, Some(true));
        assert_eq!(first.counts, VoteCounts { likes: 1, dislikes: 0 });
        assert_eq!(first.change, VoteChange::Insert(true));

        let second = ledger.cast_vote(user, post_id, Some(true)).await.unwrap();
        assert_eq!(second.user_vote, None);
        assert_eq!(second.counts, VoteCounts::default());
        assert_eq!(repo.rows_for(user, post_id), 0);
    }

    #[tokio::test]
    async fn test_like_then_dislike_flips_in_place() {
        let (ledger, repo, post_id) = ledger();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        ledger.cast_vote(other, post_id, Some(true)).await.unwrap();

        let liked = ledger.cast_vote(user, post_id, Some(true)).await.unwrap();
        assert_eq!(liked.counts, VoteCounts { likes: 2, dislikes: 0 });

        let flipped = ledger.cast_vote(user, post_id, Some(false)).await.unwrap();
        assert_eq!(flipped.user_vote, Some(false));
        assert_eq!(flipped.change, VoteChange::Update(false));
        assert_eq!(flipped.counts, VoteCounts { likes: 1, dislikes: 1 });
        assert_eq!(repo.rows_for(user, post_id), 1);
    }

    #[tokio::test]
    async fn test_clear_removes_vote() {
        let (ledger, _repo, post_id) = ledger();
        let user = Uuid::new_v4();
        ledger.cast_vote(user, post_id, Some(false)).await.unwrap();

        let cleared = ledger.cast_vote(user, post_id, None).await.unwrap();
        assert_eq!(cleared.user_vote, None);
        assert_eq!(cleared.change, VoteChange::Delete);
        assert_eq!(ledger.counts(post_id).await.unwrap(), VoteCounts::default());
        assert_eq!(ledger.user_vote(user, post_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_any_sequence_leaves_at_most_one_row() {
        let (ledger, repo, post_id) = ledger();
        let user = Uuid::new_v4();
        let sequence = [
            Some(true),
            Some(false),
            None,
            Some(false),
            Some(false),
            Some(true),
            Some(true),
            Some(false),
        ];
        let mut expected = None;
        for requested in sequence {
            expected = VoteChange::resolve(expected, requested).outcome(expected);
            let outcome = ledger.cast_vote(user, post_id, requested).await.unwrap();
            assert_eq!(outcome.user_vote, expected);
            assert!(repo.rows_for(user, post_id) <= 1);
        }
        assert_eq!(ledger.user_vote(user, post_id).await.unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_concurrent_first_likes_leave_one_row() {
        let repo = Arc::new(InMemoryVoteRepository::racing(2));
        let post_id = Uuid::new_v4();
        repo.add_post(post_id);
        let ledger = VoteLedger::new(Arc::clone(&repo));
        let user = Uuid::new_v4();

        let (a, b) = tokio::join!(
            ledger.cast_vote(user, post_id, Some(true)),
            ledger.cast_vote(user, post_id, Some(true)),
        );
        assert_eq!(a.unwrap().user_vote, Some(true));
        assert_eq!(b.unwrap().user_vote, Some(true));
        assert_eq!(repo.rows_for(user, post_id), 1);
        assert_eq!(
            ledger.counts(post_id).await.unwrap(),
            VoteCounts { likes: 1, dislikes: 0 }
        );
    }

    #[tokio::test]
    async fn test_conflict_is_retried() {
        let (ledger, repo, post_id) = ledger();
        repo.fail_with_conflict(MAX_CAST_ATTEMPTS - 1);
        let user = Uuid::new_v4();

        let outcome = ledger.cast_vote(user, post_id, Some(true)).await.unwrap();
        assert_eq!(outcome.user_vote, Some(true));
        assert_eq!(repo.rows_for(user, post_id), 1);
    }

    #[tokio::test]
    async fn test_conflict_gives_up_after_bounded_attempts() {
        let (ledger, repo, post_id) = ledger();
        repo.fail_with_conflict(MAX_CAST_ATTEMPTS);

        let err = ledger
            .cast_vote(Uuid::new_v4(), post_id, Some(true))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_counts_for_missing_post() {
        let (ledger, _repo, post_id) = ledger();
        assert_eq!(ledger.counts(post_id).await.unwrap(), VoteCounts::default());

        let missing = Uuid::new_v4();
        let err = ledger.counts(missing).await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_vote_on_missing_post() {
        let (ledger, _repo, _post_id) = ledger();
        let missing = Uuid::new_v4();
        let err = ledger
            .cast_vote(Uuid::new_v4(), missing, Some(true))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_counts_for_many_posts() {
        let (ledger, repo, post_id) = ledger();
        let other_post = Uuid::new_v4();
        repo.add_post(other_post);
        ledger.cast_vote(Uuid::new_v4(), post_id, Some(true)).await.unwrap();
        ledger.cast_vote(Uuid::new_v4(), other_post, Some(false)).await.unwrap();

        let counts = ledger.counts_for(&[post_id, other_post]).await.unwrap();
        assert_eq!(counts[&post_id], VoteCounts { likes: 1, dislikes: 0 });
        assert_eq!(counts[&other_post], VoteCounts { likes: 0, dislikes: 1 });
    }
}

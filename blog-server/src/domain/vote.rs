use serde::Serialize;

/// What a cast does to the stored vote row of one (user, post) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    Insert(bool),
    Update(bool),
    Delete,
    Keep,
}

impl VoteChange {
    /// Toggle policy: repeating the current polarity removes the vote,
    /// a different polarity flips it in place, `None` clears it.
    pub fn resolve(existing: Option<bool>, requested: Option<bool>) -> Self {
        match (existing, requested) {
            (None, Some(is_like)) => VoteChange::Insert(is_like),
            (None, None) => VoteChange::Keep,
            (Some(current), Some(is_like)) if current == is_like => VoteChange::Delete,
            (Some(_), Some(is_like)) => VoteChange::Update(is_like),
            (Some(_), None) => VoteChange::Delete,
        }
    }

    /// The caller's vote once this change is applied on top of `existing`.
    pub fn outcome(self, existing: Option<bool>) -> Option<bool> {
        match self {
            VoteChange::Insert(is_like) | VoteChange::Update(is_like) => Some(is_like),
            VoteChange::Delete => None,
            VoteChange::Keep => existing,
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            VoteChange::Insert(_) => "added",
            VoteChange::Update(_) => "updated",
            VoteChange::Delete => "removed",
            VoteChange::Keep => "unchanged",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct VoteCounts {
    pub likes: i64,
    pub dislikes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub change: VoteChange,
    pub counts: VoteCounts,
    pub user_vote: Option<bool>,
}

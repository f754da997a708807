use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{
    api::pagination::PaginationRequest,
    common::poll::PollStatus,
    db::poll::Poll,
    mongodb::Id,
};

/// Criteria for listing polls. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollFilter {
    /// Poll must carry this category tag.
    pub category: Option<String>,
    /// Poll's effective status at listing time.
    pub status: Option<PollStatus>,
    /// Inclusive lower bound on the creation time.
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the creation time.
    pub created_to: Option<DateTime<Utc>>,
    /// Inclusive lower bound on the number of recorded votes.
    pub min_votes: Option<u64>,
    /// Inclusive upper bound on the number of recorded votes.
    pub max_votes: Option<u64>,
}

impl PollFilter {
    /// Whether the vote-count bounds are in play at all.
    pub fn filters_votes(&self) -> bool {
        self.min_votes.is_some() || self.max_votes.is_some()
    }

    /// Whether a poll with `votes` recorded votes satisfies the vote-count bounds.
    pub fn accepts_votes(&self, votes: u64) -> bool {
        self.min_votes.map_or(true, |min| votes >= min)
            && self.max_votes.map_or(true, |max| votes <= max)
    }

    /// Whether `poll`, with `votes` recorded votes, matches at `now`.
    pub fn matches(&self, poll: &Poll, votes: u64, now: DateTime<Utc>) -> bool {
        self.category
            .as_ref()
            .map_or(true, |category| poll.categories.contains(category))
            && self
                .status
                .map_or(true, |status| poll.effective_status(now) == status)
            && self.created_from.map_or(true, |from| poll.created_at >= from)
            && self.created_to.map_or(true, |to| poll.created_at <= to)
            && self.accepts_votes(votes)
    }
}

/// Storage for polls, including their alternatives and categories.
#[rocket::async_trait]
pub trait PollStore: Send + Sync {
    /// Store a new poll with all its alternatives and categories, atomically.
    async fn insert_poll(&self, poll: &Poll) -> Result<()>;

    async fn poll_by_id(&self, poll_id: Id) -> Result<Option<Poll>>;

    /// Overwrite the stored poll with the same ID.
    ///
    /// Fails with [`Error::NotFound`](crate::error::Error::NotFound) if there is none.
    async fn update_poll(&self, poll: &Poll) -> Result<()>;

    /// One page of the polls a user created, newest first, plus their total.
    async fn polls_by_creator(
        &self,
        creator: Id,
        pagination: &PaginationRequest,
    ) -> Result<(Vec<Poll>, u64)>;

    /// One page of the polls matching `filter` at `now`, newest first, plus
    /// the total number of matches.
    async fn find_polls(
        &self,
        filter: &PollFilter,
        pagination: &PaginationRequest,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Poll>, u64)>;
}

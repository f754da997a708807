use std::collections::HashMap;

use crate::error::Result;
use crate::model::{api::pagination::PaginationRequest, db::vote::Vote, mongodb::Id};

/// Durable record of admitted votes.
///
/// Implementations must enforce uniqueness of (voter, poll) themselves:
/// the admission policy's duplicate check is only a fast path, and two
/// concurrent admissions can both pass it.
#[rocket::async_trait]
pub trait VoteLedger: Send + Sync {
    /// Durably record a vote.
    ///
    /// Fails with [`Error::Conflict`](crate::error::Error::Conflict) if the
    /// voter already has a vote recorded for this poll.
    async fn record(&self, vote: &Vote) -> Result<()>;

    /// Total number of votes recorded for a poll.
    async fn count_for_poll(&self, poll_id: Id) -> Result<u64>;

    /// Vote counts per alternative. Alternatives without votes are absent.
    async fn counts_by_alternative(&self, poll_id: Id) -> Result<HashMap<Id, u64>>;

    /// The vote a voter cast in a poll, if any.
    async fn find_vote(&self, voter_id: Id, poll_id: Id) -> Result<Option<Vote>>;

    /// One page of a voter's votes, newest first, plus the voter's total.
    async fn votes_by_voter(
        &self,
        voter_id: Id,
        pagination: &PaginationRequest,
    ) -> Result<(Vec<Vote>, u64)>;
}

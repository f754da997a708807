use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    common::poll::PollStatus,
    db::poll::Poll,
};
use crate::voting::tally::Tally;

/// Live vote counts for one alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeResult {
    pub id: ApiId,
    pub text: String,
    pub votes: u64,
    /// Share of the total, rounded to two decimal places.
    pub percentage: f64,
}

/// Live results of a poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResults {
    pub poll_id: ApiId,
    pub title: String,
    pub status: PollStatus,
    pub total_votes: u64,
    /// In the poll's own alternative order.
    pub alternatives: Vec<AlternativeResult>,
}

impl PollResults {
    /// Pair a tally with the names of the poll it was computed for.
    pub fn new(poll: &Poll, tally: Tally, status: PollStatus) -> Self {
        let alternatives = poll
            .alternatives
            .iter()
            .zip(tally.alternatives)
            .map(|(alt, count)| AlternativeResult {
                id: alt.id.into(),
                text: alt.text.clone(),
                votes: count.votes,
                percentage: count.percentage,
            })
            .collect();
        Self {
            poll_id: poll.id.into(),
            title: poll.title.clone(),
            status,
            total_votes: tally.total,
            alternatives,
        }
    }
}

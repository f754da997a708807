use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    db::{poll::Poll, vote::Vote},
};

/// A user's choice in a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub alternative_id: ApiId,
}

/// Confirmation of an admitted vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub id: ApiId,
    pub poll_id: ApiId,
    pub alternative_id: ApiId,
    pub cast_at: DateTime<Utc>,
}

impl From<Vote> for VoteReceipt {
    fn from(vote: Vote) -> Self {
        Self {
            id: vote.id.into(),
            poll_id: vote.poll_id.into(),
            alternative_id: vote.alternative_id.into(),
            cast_at: vote.cast_at,
        }
    }
}

/// The alternative a user chose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenAlternative {
    pub id: ApiId,
    /// Absent if the alternative can no longer be resolved.
    pub text: Option<String>,
}

/// One entry of a user's voting history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotedPoll {
    pub poll_id: ApiId,
    /// Absent if the poll can no longer be resolved.
    pub title: Option<String>,
    pub voted_at: DateTime<Utc>,
    pub chosen: ChosenAlternative,
}

impl VotedPoll {
    /// Describe `vote`, resolving names through its poll if available.
    pub fn new(vote: Vote, poll: Option<&Poll>) -> Self {
        let text = poll
            .and_then(|poll| poll.alternative(vote.alternative_id))
            .map(|alt| alt.text.clone());
        Self {
            poll_id: vote.poll_id.into(),
            title: poll.map(|poll| poll.title.clone()),
            voted_at: vote.cast_at,
            chosen: ChosenAlternative {
                id: vote.alternative_id.into(),
                text,
            },
        }
    }
}

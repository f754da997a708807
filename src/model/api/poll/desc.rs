use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    common::poll::{PollStatus, Visibility},
    db::poll::{Alternative, Poll},
};

/// An API-friendly alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeDescription {
    pub id: ApiId,
    pub text: String,
    pub image_url: Option<String>,
}

impl From<Alternative> for AlternativeDescription {
    fn from(alt: Alternative) -> Self {
        Self {
            id: alt.id.into(),
            text: alt.text,
            image_url: alt.image_url,
        }
    }
}

/// The creator of a poll, as shown to other users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorDescription {
    pub id: ApiId,
    /// Absent if the creator's account no longer exists.
    pub name: Option<String>,
}

/// A full description of one poll, as seen by a particular user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollDescription {
    pub id: ApiId,
    pub title: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    /// Effective status at the time of the request.
    pub status: PollStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub expected_votes: Option<u32>,
    pub categories: Vec<String>,
    pub alternatives: Vec<AlternativeDescription>,
    pub created_by: CreatorDescription,
    /// Whether the requesting user has already voted.
    pub has_voted: bool,
}

impl PollDescription {
    pub fn new(
        poll: Poll,
        creator_name: Option<String>,
        has_voted: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: poll.id.into(),
            status: poll.effective_status(now),
            title: poll.title,
            description: poll.description,
            visibility: poll.visibility,
            start_time: poll.start_time,
            end_time: poll.end_time,
            expected_votes: poll.expected_votes,
            categories: poll.categories,
            alternatives: poll.alternatives.into_iter().map(Into::into).collect(),
            created_by: CreatorDescription {
                id: poll.created_by.into(),
                name: creator_name,
            },
            has_voted,
        }
    }
}

/// A summary of a poll for listings, shorter than the full `PollDescription`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSummary {
    pub id: ApiId,
    pub title: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub status: PollStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub expected_votes: Option<u32>,
    pub categories: Vec<String>,
}

impl PollSummary {
    pub fn new(poll: Poll, now: DateTime<Utc>) -> Self {
        Self {
            id: poll.id.into(),
            status: poll.effective_status(now),
            title: poll.title,
            description: poll.description,
            visibility: poll.visibility,
            start_time: poll.start_time,
            end_time: poll.end_time,
            expected_votes: poll.expected_votes,
            categories: poll.categories,
        }
    }
}

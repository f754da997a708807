use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    api::id::ApiId,
    common::poll::PollStatus,
    db::poll::{Extension, Poll},
};

/// A creator's request to extend a poll. Either field may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtendRequest {
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expected_votes: Option<u32>,
}

impl TryFrom<ExtendRequest> for Extension {
    type Error = Error;

    fn try_from(request: ExtendRequest) -> Result<Self> {
        if request.expected_votes == Some(0) {
            return Err(Error::bad_request("Expected votes must be at least 1"));
        }
        Ok(Self {
            end_time: request.end_time,
            expected_votes: request.expected_votes,
        })
    }
}

/// The closing conditions of a poll after a close or extend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingConditions {
    pub id: ApiId,
    pub status: PollStatus,
    pub end_time: Option<DateTime<Utc>>,
    pub expected_votes: Option<u32>,
}

impl ClosingConditions {
    pub fn new(poll: &Poll, now: DateTime<Utc>) -> Self {
        Self {
            id: poll.id.into(),
            status: poll.effective_status(now),
            end_time: poll.end_time,
            expected_votes: poll.expected_votes,
        }
    }
}

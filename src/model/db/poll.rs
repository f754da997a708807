use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::poll::{PollStatus, Visibility},
    mongodb::{optional_chrono_datetime, Id},
};

/// One selectable option of a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    /// Unique ID, scoped to the owning poll.
    pub id: Id,
    /// Display text.
    pub text: String,
    /// Optional image reference.
    pub image_url: Option<String>,
}

/// A poll, as stored in the database.
///
/// Alternatives and categories live inside the poll document, so a poll is
/// always written together with them or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    #[serde(rename = "_id")]
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    /// Ordered alternatives, fixed at creation.
    pub alternatives: Vec<Alternative>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,
    #[serde(default, with = "optional_chrono_datetime")]
    pub end_time: Option<DateTime<Utc>>,
    /// Cap on the number of admitted votes.
    pub expected_votes: Option<u32>,
    pub visibility: Visibility,
    /// Stored status: only ever `Open` or `Closed`.
    pub status: PollStatus,
    pub created_by: Id,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// A creator's request to push a poll's closing conditions further out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extension {
    pub end_time: Option<DateTime<Utc>>,
    pub expected_votes: Option<u32>,
}

impl Poll {
    /// Whether the poll accepts votes at `now`.
    ///
    /// Both ends of the window are inclusive.
    pub fn can_vote(&self, now: DateTime<Utc>) -> bool {
        self.status == PollStatus::Open
            && now >= self.start_time
            && self.end_time.map_or(true, |end| now <= end)
    }

    /// The status to report at `now`.
    pub fn effective_status(&self, now: DateTime<Utc>) -> PollStatus {
        match self.status {
            PollStatus::Open if now < self.start_time => PollStatus::Scheduled,
            status => status,
        }
    }

    pub fn is_creator(&self, user_id: Id) -> bool {
        self.created_by == user_id
    }

    /// Look up one of this poll's alternatives.
    pub fn alternative(&self, alternative_id: Id) -> Option<&Alternative> {
        self.alternatives.iter().find(|alt| alt.id == alternative_id)
    }

    /// Close the poll on behalf of `requester`, returning the closed poll.
    pub fn close(&self, requester: Id) -> Result<Self> {
        if !self.is_creator(requester) {
            return Err(Error::forbidden("Only the poll creator can close it"));
        }
        if self.status == PollStatus::Closed {
            return Err(Error::AlreadyClosed);
        }

        Ok(Self {
            status: PollStatus::Closed,
            ..self.clone()
        })
    }

    /// Apply `extension` on behalf of `requester`, returning the updated poll.
    ///
    /// Either every requested change is applied or none is.
    pub fn extend(&self, requester: Id, extension: Extension, now: DateTime<Utc>) -> Result<Self> {
        if !self.is_creator(requester) {
            return Err(Error::forbidden("Only the poll creator can extend it"));
        }
        if let Some(end_time) = extension.end_time {
            if end_time <= now {
                return Err(Error::InvalidTransition(
                    "End date must be in the future".to_string(),
                ));
            }
        }

        Ok(Self {
            end_time: extension.end_time.or(self.end_time),
            expected_votes: extension.expected_votes.or(self.expected_votes),
            ..self.clone()
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn can_vote_inside_window() {
        let poll = Poll::example(Id::new(), now());
        assert!(poll.can_vote(now()));
    }

    #[test]
    fn can_vote_at_exact_start_and_end() {
        let poll = Poll::example(Id::new(), now());
        assert!(poll.can_vote(poll.start_time));
        assert!(poll.can_vote(poll.end_time.unwrap()));
    }

    #[test]
    fn cannot_vote_outside_window() {
        let poll = Poll::example(Id::new(), now());
        assert!(!poll.can_vote(poll.start_time - Duration::seconds(1)));
        assert!(!poll.can_vote(poll.end_time.unwrap() + Duration::seconds(1)));
    }

    #[test]
    fn quota_only_poll_has_no_upper_time_bound() {
        let mut poll = Poll::example(Id::new(), now());
        poll.end_time = None;
        assert!(poll.can_vote(now() + Duration::days(365)));
    }

    #[test]
    fn effective_status_derives_scheduled() {
        let poll = Poll::example(Id::new(), now());
        assert_eq!(
            poll.effective_status(poll.start_time - Duration::minutes(1)),
            PollStatus::Scheduled
        );
        assert_eq!(poll.effective_status(poll.start_time), PollStatus::Open);

        let closed = poll.close(poll.created_by).unwrap();
        assert_eq!(
            closed.effective_status(poll.start_time - Duration::minutes(1)),
            PollStatus::Closed
        );
    }

    #[test]
    fn close_by_creator() {
        let creator = Id::new();
        let poll = Poll::example(creator, now());
        let closed = poll.close(creator).unwrap();
        assert_eq!(closed.status, PollStatus::Closed);
        assert!(!closed.can_vote(now()));
        // The original record is untouched.
        assert_eq!(poll.status, PollStatus::Open);
    }

    #[test]
    fn close_by_stranger_is_forbidden() {
        let poll = Poll::example(Id::new(), now());
        assert!(matches!(poll.close(Id::new()), Err(Error::Forbidden(_))));
    }

    #[test]
    fn close_twice_fails() {
        let creator = Id::new();
        let closed = Poll::example(creator, now()).close(creator).unwrap();
        assert!(matches!(closed.close(creator), Err(Error::AlreadyClosed)));
    }

    #[test]
    fn extend_moves_end_and_replaces_quota() {
        let creator = Id::new();
        let poll = Poll::example(creator, now());
        let new_end = now() + Duration::days(2);
        let extended = poll
            .extend(
                creator,
                Extension {
                    end_time: Some(new_end),
                    expected_votes: Some(1),
                },
                now(),
            )
            .unwrap();
        assert_eq!(extended.end_time, Some(new_end));
        // Quota replacement is not required to be monotonic.
        assert_eq!(extended.expected_votes, Some(1));
    }

    #[test]
    fn extend_keeps_unspecified_fields() {
        let creator = Id::new();
        let poll = Poll::example(creator, now());
        let extended = poll
            .extend(
                creator,
                Extension {
                    end_time: None,
                    expected_votes: Some(50),
                },
                now(),
            )
            .unwrap();
        assert_eq!(extended.end_time, poll.end_time);
        assert_eq!(extended.expected_votes, Some(50));
    }

    #[test]
    fn extend_into_the_past_changes_nothing() {
        let creator = Id::new();
        let poll = Poll::example(creator, now());
        let result = poll.extend(
            creator,
            Extension {
                end_time: Some(now()),
                expected_votes: Some(50),
            },
            now(),
        );
        assert!(matches!(result, Err(Error::InvalidTransition(_))));
    }

    #[test]
    fn extend_by_stranger_is_forbidden() {
        let poll = Poll::example(Id::new(), now());
        let result = poll.extend(Id::new(), Extension::default(), now());
        assert!(matches!(result, Err(Error::Forbidden(_))));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::poll::{PollStatus, Visibility},
    db::poll::{Alternative, Poll},
    mongodb::Id,
};

pub const MIN_TITLE_LENGTH: usize = 5;
pub const MIN_ALTERNATIVES: usize = 2;

/// A poll specification, as submitted by its creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSpec {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to the creation time.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expected_votes: Option<u32>,
    pub alternatives: Vec<AlternativeSpec>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// An alternative specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativeSpec {
    pub text: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl PollSpec {
    /// Check this spec describes a poll that can be created at `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        if self.title.trim().chars().count() < MIN_TITLE_LENGTH {
            return Err(Error::bad_request(format!(
                "Title must be at least {MIN_TITLE_LENGTH} characters"
            )));
        }
        if self.alternatives.len() < MIN_ALTERNATIVES {
            return Err(Error::bad_request(format!(
                "A poll requires at least {MIN_ALTERNATIVES} alternatives"
            )));
        }
        if self.alternatives.iter().any(|alt| alt.text.trim().is_empty()) {
            return Err(Error::bad_request("Alternative text must not be empty"));
        }
        if self.expected_votes == Some(0) {
            return Err(Error::bad_request("Expected votes must be at least 1"));
        }
        if self.end_time.is_none() && self.expected_votes.is_none() {
            return Err(Error::bad_request(
                "You must provide either an end date or an expected votes limit",
            ));
        }
        if self.start_time.map_or(false, |start| start < now) {
            return Err(Error::bad_request("Start date must not be in the past"));
        }
        if let Some(end_time) = self.end_time {
            if end_time <= now {
                return Err(Error::bad_request("End date must be in the future"));
            }
            if end_time <= self.start_time.unwrap_or(now) {
                return Err(Error::bad_request("End date must be after start date"));
            }
        }
        if self.categories.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::bad_request("Categories must not be empty"));
        }
        Ok(())
    }

    /// Validate this spec and turn it into a new open poll owned by `creator`.
    pub fn into_poll(self, creator: Id, now: DateTime<Utc>) -> Result<Poll> {
        self.validate(now)?;

        let mut categories = self.categories;
        categories.sort();
        categories.dedup();

        Ok(Poll {
            id: Id::new(),
            title: self.title,
            description: self.description,
            alternatives: self
                .alternatives
                .into_iter()
                .map(|alt| Alternative {
                    id: Id::new(),
                    text: alt.text,
                    image_url: alt.image_url,
                })
                .collect(),
            start_time: self.start_time.unwrap_or(now),
            end_time: self.end_time,
            expected_votes: self.expected_votes,
            visibility: self.visibility,
            status: PollStatus::Open,
            created_by: creator,
            categories,
            created_at: now,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    #[test]
    fn valid_spec_becomes_open_poll() {
        let now = Utc::now();
        let creator = Id::new();
        let poll = PollSpec::example().into_poll(creator, now).unwrap();
        assert_eq!(poll.status, PollStatus::Open);
        assert_eq!(poll.start_time, now);
        assert_eq!(poll.created_by, creator);
        assert_eq!(poll.alternatives.len(), 2);
        assert_ne!(poll.alternatives[0].id, poll.alternatives[1].id);
        assert!(poll.can_vote(now));
    }

    #[test]
    fn quota_alone_is_a_closing_condition() {
        assert!(PollSpec::quota_example().validate(Utc::now()).is_ok());
    }

    #[test]
    fn needs_a_closing_condition() {
        let spec = PollSpec {
            end_time: None,
            expected_votes: None,
            ..PollSpec::example()
        };
        assert!(matches!(spec.validate(Utc::now()), Err(Error::BadRequest(_))));
    }

    #[test]
    fn needs_two_alternatives() {
        let mut spec = PollSpec::example();
        spec.alternatives.truncate(1);
        assert!(spec.validate(Utc::now()).is_err());
    }

    #[test]
    fn end_must_follow_start() {
        let now = Utc::now();
        let spec = PollSpec {
            start_time: Some(now + Duration::days(2)),
            end_time: Some(now + Duration::days(1)),
            ..PollSpec::example()
        };
        assert!(spec.validate(now).is_err());
    }

    #[test]
    fn end_must_be_in_the_future() {
        let now = Utc::now();
        let spec = PollSpec {
            end_time: Some(now - Duration::days(1)),
            ..PollSpec::example()
        };
        assert!(spec.validate(now).is_err());
    }

    #[test]
    fn backdated_start_is_rejected() {
        let now = Utc::now();
        let spec = PollSpec {
            start_time: Some(now - Duration::days(30)),
            ..PollSpec::example()
        };
        match spec.validate(now) {
            Err(Error::BadRequest(msg)) => assert_eq!(msg, "Start date must not be in the past"),
            other => panic!("expected a bad request, got {other:?}"),
        }

        // Starting exactly now is fine.
        let spec = PollSpec {
            start_time: Some(now),
            ..PollSpec::example()
        };
        assert!(spec.validate(now).is_ok());
    }

    #[test]
    fn short_title_is_rejected() {
        let spec = PollSpec {
            title: "Hm?".to_string(),
            ..PollSpec::example()
        };
        assert!(spec.validate(Utc::now()).is_err());
    }

    #[test]
    fn zero_quota_is_rejected() {
        let spec = PollSpec {
            expected_votes: Some(0),
            ..PollSpec::example()
        };
        assert!(spec.validate(Utc::now()).is_err());
    }
}

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// One admitted vote. At most one exists per (voter, poll).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    pub poll_id: Id,
    pub alternative_id: Id,
    pub voter_id: Id,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(poll_id: Id, alternative_id: Id, voter_id: Id, cast_at: DateTime<Utc>) -> Self {
        Self {
            id: Id::new(),
            poll_id,
            alternative_id,
            voter_id,
            cast_at,
        }
    }
}

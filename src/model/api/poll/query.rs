use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{common::poll::PollStatus, store::PollFilter};

/// Listing filters, as given in the query string.
///
/// Datetimes are RFC 3339 strings, e.g. `2025-06-01T00:00:00Z`.
#[derive(Debug, Clone, Default, FromForm)]
pub struct PollQuery {
    pub category: Option<String>,
    pub status: Option<PollStatus>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
    pub min_votes: Option<u64>,
    pub max_votes: Option<u64>,
}

fn parse_datetime(field: &str, value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|value| {
            DateTime::parse_from_rfc3339(&value)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| Error::bad_request(format!("Invalid `{field}` datetime: {value}")))
        })
        .transpose()
}

impl TryFrom<PollQuery> for PollFilter {
    type Error = Error;

    fn try_from(query: PollQuery) -> Result<Self> {
        Ok(Self {
            category: query.category,
            status: query.status,
            created_from: parse_datetime("created_from", query.created_from)?,
            created_to: parse_datetime("created_to", query.created_to)?,
            min_votes: query.min_votes,
            max_votes: query.max_votes,
        })
    }
}

use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// States in the Poll lifecycle.
///
/// Only `Open` and `Closed` are ever stored. `Scheduled` is derived: an open
/// poll whose start time has not yet arrived reports itself as scheduled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, FromFormField)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    /// Waiting for its start time.
    #[field(value = "scheduled")]
    Scheduled,
    /// Accepting votes, subject to the time window and quota.
    #[field(value = "open")]
    Open,
    /// Closed by its creator. Terminal.
    #[field(value = "closed")]
    Closed,
}

impl From<PollStatus> for Bson {
    fn from(status: PollStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}

/// Who may see a poll's results.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Results visible to every authenticated user.
    #[default]
    Public,
    /// Results visible to the creator only.
    Private,
}

mod desc;
mod extend;
mod query;
mod spec;

pub use desc::{AlternativeDescription, CreatorDescription, PollDescription, PollSummary};
pub use extend::{ClosingConditions, ExtendRequest};
pub use query::PollQuery;
pub use spec::{AlternativeSpec, PollSpec};

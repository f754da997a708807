//! Vote admission and tallying, independent of how requests arrive.

pub mod admission;
pub mod tally;

pub use admission::{admit, cast_vote};
pub use tally::{tally, AlternativeTally, Tally};

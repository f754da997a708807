//! Types that are shared verbatim between the API and the database.

pub mod poll;

mod backend;
mod bson;
mod collection;
mod errors;

pub use backend::MongoBackend;
pub use bson::{optional_chrono_datetime, Id};
pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
pub use errors::is_duplicate_key_error;

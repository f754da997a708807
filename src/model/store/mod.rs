//! The persistence boundary.
//!
//! Everything outside this module talks to storage through the [`PollStore`],
//! [`VoteLedger`] and [`UserStore`] traits, bundled behind a [`Store`] handle
//! that lives in Rocket's managed state.

use std::ops::Deref;
use std::sync::Arc;

use mongodb::Database;
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

mod ledger;
mod memory;
mod polls;
mod users;

pub use ledger::VoteLedger;
pub use memory::MemoryBackend;
pub use polls::{PollFilter, PollStore};
pub use users::UserStore;

use super::mongodb::MongoBackend;

/// A complete persistence backend.
pub trait Backend: PollStore + VoteLedger + UserStore {}

impl<T> Backend for T where T: PollStore + VoteLedger + UserStore {}

/// A shared handle on the configured backend.
#[derive(Clone)]
pub struct Store(Arc<dyn Backend>);

impl Store {
    /// A store over a MongoDB database. Indexes must already exist.
    pub fn mongo(db: &Database) -> Self {
        Self(Arc::new(MongoBackend::new(db)))
    }

    /// A fresh, empty in-memory store.
    pub fn memory() -> Self {
        Self(Arc::new(MemoryBackend::default()))
    }

    /// Borrow the backend itself.
    pub fn backend(&self) -> &dyn Backend {
        self.0.as_ref()
    }
}

impl Deref for Store {
    type Target = dyn Backend;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Store {
    type Error = ();

    /// Get the store from the managed state.
    ///
    /// Panics iff the [`Store`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let store = req.guard::<&State<Store>>().await.unwrap();
        request::Outcome::Success(store.inner().clone())
    }
}

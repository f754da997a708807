use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use crate::model::db::{poll::Poll, user::User, vote::Vote};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl MongoCollection for Poll {
    const NAME: &'static str = "polls";
}

impl MongoCollection for Vote {
    const NAME: &'static str = "votes";
}

impl MongoCollection for User {
    const NAME: &'static str = "users";
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Vote collection: one vote per voter per poll, enforced by the database.
    let votes = Coll::<Vote>::from_db(db);
    let one_vote_per_poll = IndexModel::builder()
        .keys(doc! {"voter_id": 1, "poll_id": 1})
        .options(unique.clone())
        .build();
    votes.create_index(one_vote_per_poll, None).await?;
    let tally_index = IndexModel::builder()
        .keys(doc! {"poll_id": 1, "alternative_id": 1})
        .build();
    votes.create_index(tally_index, None).await?;

    // User collection.
    let email_index = IndexModel::builder()
        .keys(doc! {"email": 1})
        .options(unique)
        .build();
    Coll::<User>::from_db(db)
        .create_index(email_index, None)
        .await?;

    // Poll collection.
    let creator_index = IndexModel::builder()
        .keys(doc! {"created_by": 1, "created_at": -1})
        .build();
    Coll::<Poll>::from_db(db)
        .create_index(creator_index, None)
        .await?;

    Ok(())
}

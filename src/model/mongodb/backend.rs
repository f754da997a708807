use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mongodb::{
    bson::{self, doc, DateTime as BsonDateTime, Document},
    options::FindOptions,
    Database,
};
use rocket::futures::TryStreamExt;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{
    api::pagination::PaginationRequest,
    common::poll::PollStatus,
    db::{poll::Poll, user::User, vote::Vote},
    store::{PollFilter, PollStore, UserStore, VoteLedger},
};

use super::{is_duplicate_key_error, Coll, Id};

/// A backend over a MongoDB database.
#[derive(Clone)]
pub struct MongoBackend {
    polls: Coll<Poll>,
    votes: Coll<Vote>,
    users: Coll<User>,
}

impl MongoBackend {
    pub fn new(db: &Database) -> Self {
        Self {
            polls: Coll::from_db(db),
            votes: Coll::from_db(db),
            users: Coll::from_db(db),
        }
    }

    /// Count votes grouped by `key`, restricted to votes matching `filter`.
    async fn grouped_vote_counts(&self, filter: Document, key: &str) -> Result<HashMap<Id, u64>> {
        let pipeline = [
            doc! { "$match": filter },
            doc! { "$group": { "_id": format!("${key}"), "count": { "$sum": 1 } } },
        ];
        let groups = self
            .votes
            .aggregate(pipeline, None)
            .await?
            .try_collect::<Vec<_>>()
            .await?;

        let mut counts = HashMap::with_capacity(groups.len());
        for group in groups {
            let group: GroupCount = bson::from_document(group)?;
            counts.insert(group.id, group.count);
        }
        Ok(counts)
    }

    /// Restrict `filter` to polls satisfying the vote-count bounds.
    async fn restrict_by_votes(&self, filter: &PollFilter, query: &mut Document) -> Result<()> {
        let counts = self.grouped_vote_counts(doc! {}, "poll_id").await?;
        if filter.accepts_votes(0) {
            // Polls without votes are in, so list the ones that are out.
            let rejected = counts
                .into_iter()
                .filter(|(_, votes)| !filter.accepts_votes(*votes))
                .map(|(id, _)| *id)
                .collect::<Vec<_>>();
            query.insert("_id", doc! { "$nin": rejected });
        } else {
            let accepted = counts
                .into_iter()
                .filter(|(_, votes)| filter.accepts_votes(*votes))
                .map(|(id, _)| *id)
                .collect::<Vec<_>>();
            query.insert("_id", doc! { "$in": accepted });
        }
        Ok(())
    }
}

/// One output row of a `$group` stage that counts documents.
#[derive(Deserialize)]
struct GroupCount {
    #[serde(rename = "_id")]
    id: Id,
    count: u64,
}

/// Newest first, one page's worth.
fn page_options(sort_key: &str, pagination: &PaginationRequest) -> FindOptions {
    let mut sort = Document::new();
    sort.insert(sort_key, -1);
    sort.insert("_id", -1);
    FindOptions::builder()
        .sort(sort)
        .skip(pagination.skip())
        .limit(i64::from(pagination.limit()))
        .build()
}

/// The part of a [`PollFilter`] that can be answered from the poll documents alone.
fn poll_query(filter: &PollFilter, now: DateTime<Utc>) -> Document {
    let now = BsonDateTime::from_chrono(now);
    let mut query = Document::new();

    if let Some(category) = &filter.category {
        query.insert("categories", category.as_str());
    }
    match filter.status {
        Some(PollStatus::Scheduled) => {
            query.insert("status", PollStatus::Open);
            query.insert("start_time", doc! { "$gt": now });
        }
        Some(PollStatus::Open) => {
            query.insert("status", PollStatus::Open);
            query.insert("start_time", doc! { "$lte": now });
        }
        Some(PollStatus::Closed) => {
            query.insert("status", PollStatus::Closed);
        }
        None => {}
    }

    let mut created = Document::new();
    if let Some(from) = filter.created_from {
        created.insert("$gte", BsonDateTime::from_chrono(from));
    }
    if let Some(to) = filter.created_to {
        created.insert("$lte", BsonDateTime::from_chrono(to));
    }
    if !created.is_empty() {
        query.insert("created_at", created);
    }

    query
}

#[rocket::async_trait]
impl PollStore for MongoBackend {
    async fn insert_poll(&self, poll: &Poll) -> Result<()> {
        // Alternatives and categories are embedded, so this single insert is atomic.
        match self.polls.insert_one(poll, None).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key_error(&err) => {
                Err(Error::Conflict(format!("Poll with ID '{}'", poll.id)))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn poll_by_id(&self, poll_id: Id) -> Result<Option<Poll>> {
        Ok(self.polls.find_one(poll_id.as_doc(), None).await?)
    }

    async fn update_poll(&self, poll: &Poll) -> Result<()> {
        let result = self.polls.replace_one(poll.id.as_doc(), poll, None).await?;
        if result.matched_count == 0 {
            return Err(Error::not_found(format!("Poll with ID '{}'", poll.id)));
        }
        Ok(())
    }

    async fn polls_by_creator(
        &self,
        creator: Id,
        pagination: &PaginationRequest,
    ) -> Result<(Vec<Poll>, u64)> {
        let filter = doc! { "created_by": *creator };
        let polls = self
            .polls
            .find(filter.clone(), page_options("created_at", pagination))
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        let total = self.polls.count_documents(filter, None).await?;
        Ok((polls, total))
    }

    async fn find_polls(
        &self,
        filter: &PollFilter,
        pagination: &PaginationRequest,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Poll>, u64)> {
        let mut query = poll_query(filter, now);
        if filter.filters_votes() {
            self.restrict_by_votes(filter, &mut query).await?;
        }

        let polls = self
            .polls
            .find(query.clone(), page_options("created_at", pagination))
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        let total = self.polls.count_documents(query, None).await?;
        Ok((polls, total))
    }
}

#[rocket::async_trait]
impl VoteLedger for MongoBackend {
    async fn record(&self, vote: &Vote) -> Result<()> {
        match self.votes.insert_one(vote, None).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key_error(&err) => Err(Error::Conflict(format!(
                "Vote by '{}' in poll '{}'",
                vote.voter_id, vote.poll_id
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn count_for_poll(&self, poll_id: Id) -> Result<u64> {
        Ok(self
            .votes
            .count_documents(doc! { "poll_id": *poll_id }, None)
            .await?)
    }

    async fn counts_by_alternative(&self, poll_id: Id) -> Result<HashMap<Id, u64>> {
        self.grouped_vote_counts(doc! { "poll_id": *poll_id }, "alternative_id")
            .await
    }

    async fn find_vote(&self, voter_id: Id, poll_id: Id) -> Result<Option<Vote>> {
        Ok(self
            .votes
            .find_one(doc! { "voter_id": *voter_id, "poll_id": *poll_id }, None)
            .await?)
    }

    async fn votes_by_voter(
        &self,
        voter_id: Id,
        pagination: &PaginationRequest,
    ) -> Result<(Vec<Vote>, u64)> {
        let filter = doc! { "voter_id": *voter_id };
        let votes = self
            .votes
            .find(filter.clone(), page_options("cast_at", pagination))
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        let total = self.votes.count_documents(filter, None).await?;
        Ok((votes, total))
    }
}

#[rocket::async_trait]
impl UserStore for MongoBackend {
    async fn insert_user(&self, user: &User) -> Result<()> {
        match self.users.insert_one(user, None).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key_error(&err) => {
                Err(Error::Conflict(format!("User with e-mail '{}'", user.email)))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn user_by_id(&self, user_id: Id) -> Result<Option<User>> {
        Ok(self.users.find_one(user_id.as_doc(), None).await?)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.find_one(doc! { "email": email }, None).await?)
    }
}

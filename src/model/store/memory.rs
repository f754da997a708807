use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{
    api::pagination::PaginationRequest,
    db::{poll::Poll, user::User, vote::Vote},
    mongodb::Id,
};

use super::{PollFilter, PollStore, UserStore, VoteLedger};

/// A backend keeping everything in process memory.
///
/// Used when no database is configured, and by the tests. Each collection
/// sits behind its own lock; uniqueness checks and inserts happen under a
/// single acquisition, which makes them atomic.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    polls: Mutex<Vec<Poll>>,
    votes: Mutex<Vec<Vote>>,
    users: Mutex<Vec<User>>,
}

/// Lock a collection. A panic while holding the lock cannot leave a
/// half-written entry behind, so poisoning is ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cut one page out of an already-ordered list.
fn page<T>(items: Vec<T>, pagination: &PaginationRequest) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let skip = usize::try_from(pagination.skip()).unwrap_or(usize::MAX);
    let items = items
        .into_iter()
        .skip(skip)
        .take(pagination.limit() as usize)
        .collect();
    (items, total)
}

impl MemoryBackend {
    fn vote_count(&self, poll_id: Id) -> u64 {
        lock(&self.votes)
            .iter()
            .filter(|vote| vote.poll_id == poll_id)
            .count() as u64
    }
}

/// Newest first, ties broken by descending ID.
fn newest_first(a: &Poll, b: &Poll) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

#[rocket::async_trait]
impl PollStore for MemoryBackend {
    async fn insert_poll(&self, poll: &Poll) -> Result<()> {
        let mut polls = lock(&self.polls);
        if polls.iter().any(|p| p.id == poll.id) {
            return Err(Error::Conflict(format!("Poll with ID '{}'", poll.id)));
        }
        polls.push(poll.clone());
        Ok(())
    }

    async fn poll_by_id(&self, poll_id: Id) -> Result<Option<Poll>> {
        Ok(lock(&self.polls).iter().find(|p| p.id == poll_id).cloned())
    }

    async fn update_poll(&self, poll: &Poll) -> Result<()> {
        let mut polls = lock(&self.polls);
        let stored = polls
            .iter_mut()
            .find(|p| p.id == poll.id)
            .ok_or_else(|| Error::not_found(format!("Poll with ID '{}'", poll.id)))?;
        *stored = poll.clone();
        Ok(())
    }

    async fn polls_by_creator(
        &self,
        creator: Id,
        pagination: &PaginationRequest,
    ) -> Result<(Vec<Poll>, u64)> {
        let mut created = lock(&self.polls)
            .iter()
            .filter(|p| p.created_by == creator)
            .cloned()
            .collect::<Vec<_>>();
        created.sort_by(newest_first);
        Ok(page(created, pagination))
    }

    async fn find_polls(
        &self,
        filter: &PollFilter,
        pagination: &PaginationRequest,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Poll>, u64)> {
        let polls = lock(&self.polls).clone();
        let mut matching = polls
            .into_iter()
            .filter(|poll| {
                // Only count votes when the filter cares about them.
                let votes = if filter.filters_votes() {
                    self.vote_count(poll.id)
                } else {
                    0
                };
                filter.matches(poll, votes, now)
            })
            .collect::<Vec<_>>();
        matching.sort_by(newest_first);
        Ok(page(matching, pagination))
    }
}

#[rocket::async_trait]
impl VoteLedger for MemoryBackend {
    async fn record(&self, vote: &Vote) -> Result<()> {
        let mut votes = lock(&self.votes);
        if votes
            .iter()
            .any(|v| v.voter_id == vote.voter_id && v.poll_id == vote.poll_id)
        {
            return Err(Error::Conflict(format!(
                "Vote by '{}' in poll '{}'",
                vote.voter_id, vote.poll_id
            )));
        }
        votes.push(vote.clone());
        Ok(())
    }

    async fn count_for_poll(&self, poll_id: Id) -> Result<u64> {
        Ok(self.vote_count(poll_id))
    }

    async fn counts_by_alternative(&self, poll_id: Id) -> Result<HashMap<Id, u64>> {
        let mut counts = HashMap::new();
        for vote in lock(&self.votes).iter().filter(|v| v.poll_id == poll_id) {
            *counts.entry(vote.alternative_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn find_vote(&self, voter_id: Id, poll_id: Id) -> Result<Option<Vote>> {
        Ok(lock(&self.votes)
            .iter()
            .find(|v| v.voter_id == voter_id && v.poll_id == poll_id)
            .cloned())
    }

    async fn votes_by_voter(
        &self,
        voter_id: Id,
        pagination: &PaginationRequest,
    ) -> Result<(Vec<Vote>, u64)> {
        let mut cast = lock(&self.votes)
            .iter()
            .filter(|v| v.voter_id == voter_id)
            .cloned()
            .collect::<Vec<_>>();
        cast.sort_by(|a, b| b.cast_at.cmp(&a.cast_at).then_with(|| b.id.cmp(&a.id)));
        Ok(page(cast, pagination))
    }
}

#[rocket::async_trait]
impl UserStore for MemoryBackend {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut users = lock(&self.users);
        if users.iter().any(|u| u.email == user.email) {
            return Err(Error::Conflict(format!("User with e-mail '{}'", user.email)));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn user_by_id(&self, user_id: Id) -> Result<Option<User>> {
        Ok(lock(&self.users).iter().find(|u| u.id == user_id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(lock(&self.users).iter().find(|u| u.email == email).cloned())
    }
}

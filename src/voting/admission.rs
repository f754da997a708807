use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{
    db::{poll::Poll, vote::Vote},
    mongodb::Id,
    store::{PollStore, VoteLedger},
};

/// Decide whether `voter` may vote for `alternative_id` in `poll` at `now`,
/// and record the vote if so.
///
/// Checks run in a fixed order, and the first failure wins:
///
/// 1. the poll must accept votes at `now`;
/// 2. the voter must not already have voted in it;
/// 3. the alternative must belong to it;
/// 4. if it has a quota, the quota must not be reached yet.
///
/// The duplicate check is a fast path. The ledger's own uniqueness
/// constraint is what actually guarantees one vote per voter, and a
/// [`Error::Conflict`] it reports surfaces here as [`Error::DuplicateVote`].
///
/// The quota check is not atomic with the insert. With `n` admissions racing
/// for the last free slot, up to `n - 1` of them can be admitted beyond the
/// quota.
pub async fn admit<L>(
    ledger: &L,
    poll: &Poll,
    voter_id: Id,
    alternative_id: Id,
    now: DateTime<Utc>,
) -> Result<Vote>
where
    L: VoteLedger + ?Sized,
{
    if !poll.can_vote(now) {
        return Err(Error::PollNotAcceptingVotes);
    }
    if ledger.find_vote(voter_id, poll.id).await?.is_some() {
        return Err(Error::DuplicateVote);
    }
    if poll.alternative(alternative_id).is_none() {
        return Err(Error::InvalidAlternative);
    }
    if let Some(quota) = poll.expected_votes {
        if ledger.count_for_poll(poll.id).await? >= u64::from(quota) {
            return Err(Error::QuotaExceeded);
        }
    }

    let vote = Vote::new(poll.id, alternative_id, voter_id, now);
    match ledger.record(&vote).await {
        Ok(()) => {
            debug!("Admitted vote {} in poll {}", vote.id, poll.id);
            Ok(vote)
        }
        Err(Error::Conflict(what)) => {
            debug!("Lost duplicate vote race: {what}");
            Err(Error::DuplicateVote)
        }
        Err(e) => Err(e),
    }
}

/// Load the poll with ID `poll_id` and [`admit`] a vote in it.
pub async fn cast_vote<B>(
    store: &B,
    poll_id: Id,
    voter_id: Id,
    alternative_id: Id,
    now: DateTime<Utc>,
) -> Result<Vote>
where
    B: PollStore + VoteLedger + ?Sized,
{
    let poll = store
        .poll_by_id(poll_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Poll with ID '{poll_id}'")))?;
    admit(store, &poll, voter_id, alternative_id, now).await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Duration;

    use super::*;
    use crate::model::{
        api::pagination::PaginationRequest,
        store::MemoryBackend,
    };

    async fn stored_poll(store: &MemoryBackend, now: DateTime<Utc>) -> Poll {
        let poll = Poll::example(Id::new(), now);
        store.insert_poll(&poll).await.unwrap();
        poll
    }

    #[rocket::async_test]
    async fn quota_scenario_with_two_voters() {
        let store = MemoryBackend::default();
        let now = Utc::now();
        let poll = stored_poll(&store, now).await;
        let (a, b) = (poll.alternatives[0].id, poll.alternatives[1].id);
        let (u1, u2, u3) = (Id::new(), Id::new(), Id::new());

        admit(&store, &poll, u1, a, now).await.unwrap();
        assert!(matches!(
            admit(&store, &poll, u1, b, now).await,
            Err(Error::DuplicateVote)
        ));
        admit(&store, &poll, u2, b, now).await.unwrap();
        assert!(matches!(
            admit(&store, &poll, u3, a, now).await,
            Err(Error::QuotaExceeded)
        ));

        let counts = store.counts_by_alternative(poll.id).await.unwrap();
        assert_eq!(counts.get(&a), Some(&1));
        assert_eq!(counts.get(&b), Some(&1));
        assert_eq!(store.count_for_poll(poll.id).await.unwrap(), 2);
    }

    #[rocket::async_test]
    async fn second_identical_vote_is_refused() {
        let store = MemoryBackend::default();
        let now = Utc::now();
        let poll = stored_poll(&store, now).await;
        let voter = Id::new();
        let alternative = poll.alternatives[0].id;

        admit(&store, &poll, voter, alternative, now).await.unwrap();
        assert!(matches!(
            admit(&store, &poll, voter, alternative, now).await,
            Err(Error::DuplicateVote)
        ));
        assert_eq!(store.count_for_poll(poll.id).await.unwrap(), 1);
    }

    #[rocket::async_test]
    async fn closed_poll_refuses_before_anything_else() {
        let store = MemoryBackend::default();
        let now = Utc::now();
        let mut poll = stored_poll(&store, now).await;
        let voter = Id::new();
        admit(&store, &poll, voter, poll.alternatives[0].id, now)
            .await
            .unwrap();
        poll = poll.close(poll.created_by).unwrap();

        // Already voted and the alternative is bogus, but the window wins.
        assert!(matches!(
            admit(&store, &poll, voter, Id::new(), now).await,
            Err(Error::PollNotAcceptingVotes)
        ));
    }

    #[rocket::async_test]
    async fn duplicate_is_reported_before_invalid_alternative() {
        let store = MemoryBackend::default();
        let now = Utc::now();
        let poll = stored_poll(&store, now).await;
        let voter = Id::new();
        admit(&store, &poll, voter, poll.alternatives[0].id, now)
            .await
            .unwrap();

        assert!(matches!(
            admit(&store, &poll, voter, Id::new(), now).await,
            Err(Error::DuplicateVote)
        ));
    }

    #[rocket::async_test]
    async fn invalid_alternative_is_reported_before_quota() {
        let store = MemoryBackend::default();
        let now = Utc::now();
        let poll = stored_poll(&store, now).await;
        for _ in 0..2 {
            admit(&store, &poll, Id::new(), poll.alternatives[0].id, now)
                .await
                .unwrap();
        }

        assert!(matches!(
            admit(&store, &poll, Id::new(), Id::new(), now).await,
            Err(Error::InvalidAlternative)
        ));
        assert!(matches!(
            admit(&store, &poll, Id::new(), poll.alternatives[1].id, now).await,
            Err(Error::QuotaExceeded)
        ));
    }

    #[rocket::async_test]
    async fn votes_outside_the_window_are_refused() {
        let store = MemoryBackend::default();
        let now = Utc::now();
        let poll = stored_poll(&store, now).await;
        let alternative = poll.alternatives[0].id;

        for when in [
            poll.start_time - Duration::seconds(1),
            poll.end_time.unwrap() + Duration::seconds(1),
        ] {
            assert!(matches!(
                admit(&store, &poll, Id::new(), alternative, when).await,
                Err(Error::PollNotAcceptingVotes)
            ));
        }
        admit(&store, &poll, Id::new(), alternative, poll.start_time)
            .await
            .unwrap();
    }

    #[rocket::async_test]
    async fn cast_vote_on_unknown_poll() {
        let store = MemoryBackend::default();
        assert!(matches!(
            cast_vote(&store, Id::new(), Id::new(), Id::new(), Utc::now()).await,
            Err(Error::NotFound(_))
        ));
    }

    #[rocket::async_test]
    async fn cast_vote_loads_the_poll() {
        let store = MemoryBackend::default();
        let now = Utc::now();
        let poll = stored_poll(&store, now).await;
        let voter = Id::new();

        let vote = cast_vote(&store, poll.id, voter, poll.alternatives[1].id, now)
            .await
            .unwrap();
        assert_eq!(vote.voter_id, voter);
        assert_eq!(vote.alternative_id, poll.alternatives[1].id);
        assert_eq!(
            store.find_vote(voter, poll.id).await.unwrap(),
            Some(vote)
        );
    }

    /// A ledger whose duplicate check always misses, as when another
    /// admission for the same voter commits in between.
    struct RacingLedger;

    #[rocket::async_trait]
    impl VoteLedger for RacingLedger {
        async fn record(&self, vote: &Vote) -> Result<()> {
            Err(Error::Conflict(format!("Vote by '{}'", vote.voter_id)))
        }

        async fn count_for_poll(&self, _poll_id: Id) -> Result<u64> {
            Ok(0)
        }

        async fn counts_by_alternative(&self, _poll_id: Id) -> Result<HashMap<Id, u64>> {
            Ok(HashMap::new())
        }

        async fn find_vote(&self, _voter_id: Id, _poll_id: Id) -> Result<Option<Vote>> {
            Ok(None)
        }

        async fn votes_by_voter(
            &self,
            _voter_id: Id,
            _pagination: &PaginationRequest,
        ) -> Result<(Vec<Vote>, u64)> {
            Ok((Vec::new(), 0))
        }
    }

    #[rocket::async_test]
    async fn ledger_conflict_becomes_duplicate_vote() {
        let now = Utc::now();
        let poll = Poll::example(Id::new(), now);
        assert!(matches!(
            admit(&RacingLedger, &poll, Id::new(), poll.alternatives[0].id, now).await,
            Err(Error::DuplicateVote)
        ));
    }
}

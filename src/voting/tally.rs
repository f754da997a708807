use std::collections::HashMap;

use crate::error::Result;
use crate::model::{db::poll::Poll, mongodb::Id, store::VoteLedger};

/// Vote count for one alternative.
#[derive(Debug, Clone, PartialEq)]
pub struct AlternativeTally {
    pub alternative_id: Id,
    pub votes: u64,
    /// Share of all votes in percent, rounded to two decimal places.
    pub percentage: f64,
}

/// Vote counts for a whole poll, as of when it was computed.
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    pub total: u64,
    /// One entry per alternative, in the poll's order.
    pub alternatives: Vec<AlternativeTally>,
}

impl Tally {
    /// Build a tally from raw per-alternative counts.
    ///
    /// Counts for IDs that are not alternatives of `poll` are ignored.
    pub fn from_counts(poll: &Poll, counts: &HashMap<Id, u64>) -> Self {
        let votes = poll
            .alternatives
            .iter()
            .map(|alt| (alt.id, counts.get(&alt.id).copied().unwrap_or(0)))
            .collect::<Vec<_>>();
        let total = votes.iter().map(|(_, votes)| votes).sum();

        let alternatives = votes
            .into_iter()
            .map(|(alternative_id, votes)| AlternativeTally {
                alternative_id,
                votes,
                percentage: percentage(votes, total),
            })
            .collect();

        Self {
            total,
            alternatives,
        }
    }
}

fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let exact = votes as f64 / total as f64 * 100.0;
    (exact * 100.0).round() / 100.0
}

/// Count the votes of `poll` as currently recorded in `ledger`.
pub async fn tally<L>(ledger: &L, poll: &Poll) -> Result<Tally>
where
    L: VoteLedger + ?Sized,
{
    let counts = ledger.counts_by_alternative(poll.id).await?;
    Ok(Tally::from_counts(poll, &counts))
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;

    use crate::model::{db::poll::Alternative, db::vote::Vote, store::MemoryBackend};

    fn three_way_poll() -> Poll {
        let mut poll = Poll::example(Id::new(), Utc::now());
        poll.alternatives.push(Alternative {
            id: Id::new(),
            text: "Crepes".to_string(),
            image_url: None,
        });
        poll
    }

    #[test]
    fn empty_tally_is_all_zero() {
        let poll = three_way_poll();
        let tally = Tally::from_counts(&poll, &HashMap::new());
        assert_eq!(tally.total, 0);
        assert_eq!(tally.alternatives.len(), 3);
        assert!(tally
            .alternatives
            .iter()
            .all(|alt| alt.votes == 0 && alt.percentage == 0.0));
    }

    #[test]
    fn percentages_are_rounded_and_sum_to_about_100() {
        let poll = three_way_poll();
        let counts = poll
            .alternatives
            .iter()
            .map(|alt| (alt.id, 1))
            .collect::<HashMap<_, _>>();
        let tally = Tally::from_counts(&poll, &counts);

        assert_eq!(tally.total, 3);
        for alt in &tally.alternatives {
            assert_eq!(alt.percentage, 33.33);
        }
        let sum: f64 = tally.alternatives.iter().map(|alt| alt.percentage).sum();
        assert!((sum - 100.0).abs() < 0.1);
    }

    #[test]
    fn tally_follows_poll_order_and_ignores_strangers() {
        let poll = three_way_poll();
        let mut counts = HashMap::new();
        counts.insert(poll.alternatives[2].id, 3);
        counts.insert(poll.alternatives[0].id, 1);
        counts.insert(Id::new(), 10);
        let tally = Tally::from_counts(&poll, &counts);

        let ids = tally
            .alternatives
            .iter()
            .map(|alt| alt.alternative_id)
            .collect::<Vec<_>>();
        let expected = poll.alternatives.iter().map(|alt| alt.id).collect::<Vec<_>>();
        assert_eq!(ids, expected);
        assert_eq!(tally.total, 4);
        assert_eq!(tally.alternatives[0].percentage, 25.0);
        assert_eq!(tally.alternatives[1].percentage, 0.0);
        assert_eq!(tally.alternatives[2].percentage, 75.0);
    }

    #[rocket::async_test]
    async fn tally_matches_ledger() {
        let ledger = MemoryBackend::default();
        let poll = three_way_poll();
        let now = Utc::now();
        for alt in [0, 0, 1, 2, 2, 2] {
            ledger
                .record(&Vote::new(poll.id, poll.alternatives[alt].id, Id::new(), now))
                .await
                .unwrap();
        }

        let tally = tally(&ledger, &poll).await.unwrap();
        assert_eq!(tally.total, ledger.count_for_poll(poll.id).await.unwrap());
        let votes = tally
            .alternatives
            .iter()
            .map(|alt| alt.votes)
            .collect::<Vec<_>>();
        assert_eq!(votes, vec![2, 1, 3]);
        assert_eq!(tally.alternatives[2].percentage, 50.0);
    }
}

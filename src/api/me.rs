use chrono::Utc;
use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::{
            auth::AuthToken,
            pagination::{Paginated, PaginationRequest},
            poll::PollSummary,
            vote::VotedPoll,
        },
        store::{PollStore, Store, VoteLedger},
    },
};

pub fn routes() -> Vec<Route> {
    routes![created_polls, voted_polls]
}

#[get("/me/polls/created?<pagination..>")]
pub async fn created_polls(
    token: AuthToken,
    pagination: PaginationRequest,
    store: Store,
) -> Result<Json<Paginated<PollSummary>>> {
    let now = Utc::now();
    let (polls, total) = store.polls_by_creator(token.id, &pagination).await?;
    let summaries = polls
        .into_iter()
        .map(|poll| PollSummary::new(poll, now))
        .collect();
    Ok(Json(pagination.to_paginated(total, summaries)))
}

#[get("/me/polls/voted?<pagination..>")]
pub async fn voted_polls(
    token: AuthToken,
    pagination: PaginationRequest,
    store: Store,
) -> Result<Json<Paginated<VotedPoll>>> {
    let (votes, total) = store.votes_by_voter(token.id, &pagination).await?;

    let mut history = Vec::with_capacity(votes.len());
    for vote in votes {
        let poll = store.poll_by_id(vote.poll_id).await?;
        history.push(VotedPoll::new(vote, poll.as_ref()));
    }
    Ok(Json(pagination.to_paginated(total, history)))
}

use chrono::Utc;
use rocket::{http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            pagination::{Paginated, PaginationRequest},
            poll::{ClosingConditions, ExtendRequest, PollDescription, PollQuery, PollSpec, PollSummary},
        },
        db::poll::{Extension, Poll},
        mongodb::Id,
        store::{PollFilter, PollStore, Store, UserStore, VoteLedger},
    },
};

pub fn routes() -> Vec<Route> {
    routes![create_poll, list_polls, get_poll, close_poll, extend_poll]
}

/// Load a poll or fail with [`Error::NotFound`].
pub(crate) async fn load_poll(store: &Store, poll_id: Id) -> Result<Poll> {
    store
        .poll_by_id(poll_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Poll with ID '{poll_id}'")))
}

/// Display name of a poll's creator, if they still exist.
async fn creator_name(store: &Store, poll: &Poll) -> Result<Option<String>> {
    Ok(store.user_by_id(poll.created_by).await?.map(|user| user.name))
}

#[post("/polls", data = "<spec>", format = "json")]
pub async fn create_poll(
    token: AuthToken,
    spec: Json<PollSpec>,
    store: Store,
) -> Result<(Status, Json<PollDescription>)> {
    let now = Utc::now();
    let poll = spec.into_inner().into_poll(token.id, now)?;
    store.insert_poll(&poll).await?;
    info!("User {} created poll {}", token.id, poll.id);

    let name = creator_name(&store, &poll).await?;
    Ok((
        Status::Created,
        Json(PollDescription::new(poll, name, false, now)),
    ))
}

#[get("/polls?<page>&<limit>&<query..>")]
pub async fn list_polls(
    _token: AuthToken,
    page: Option<u32>,
    limit: Option<u32>,
    query: PollQuery,
    store: Store,
) -> Result<Json<Paginated<PollSummary>>> {
    let now = Utc::now();
    let pagination = PaginationRequest { page, limit };
    let filter = PollFilter::try_from(query)?;

    let (polls, total) = store.find_polls(&filter, &pagination, now).await?;
    let summaries = polls
        .into_iter()
        .map(|poll| PollSummary::new(poll, now))
        .collect();
    Ok(Json(pagination.to_paginated(total, summaries)))
}

#[get("/polls/<poll_id>")]
pub async fn get_poll(token: AuthToken, poll_id: Id, store: Store) -> Result<Json<PollDescription>> {
    let poll = load_poll(&store, poll_id).await?;
    let has_voted = store.find_vote(token.id, poll_id).await?.is_some();
    let name = creator_name(&store, &poll).await?;
    Ok(Json(PollDescription::new(poll, name, has_voted, Utc::now())))
}

#[post("/polls/<poll_id>/close")]
pub async fn close_poll(token: AuthToken, poll_id: Id, store: Store) -> Result<Json<ClosingConditions>> {
    let poll = load_poll(&store, poll_id).await?.close(token.id)?;
    store.update_poll(&poll).await?;
    info!("User {} closed poll {}", token.id, poll.id);

    Ok(Json(ClosingConditions::new(&poll, Utc::now())))
}

#[patch("/polls/<poll_id>/extend", data = "<request>", format = "json")]
pub async fn extend_poll(
    token: AuthToken,
    poll_id: Id,
    request: Json<ExtendRequest>,
    store: Store,
) -> Result<Json<ClosingConditions>> {
    let now = Utc::now();
    let extension = Extension::try_from(request.into_inner())?;
    let poll = load_poll(&store, poll_id)
        .await?
        .extend(token.id, extension, now)?;
    store.update_poll(&poll).await?;
    info!("User {} extended poll {}", token.id, poll.id);

    Ok(Json(ClosingConditions::new(&poll, now)))
}

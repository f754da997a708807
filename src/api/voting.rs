use chrono::Utc;
use rocket::{http::Status, serde::json::Json, Route};

use crate::{
    api::polls::load_poll,
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            results::PollResults,
            vote::{VoteReceipt, VoteRequest},
        },
        common::poll::Visibility,
        mongodb::Id,
        store::Store,
    },
    voting,
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, poll_results]
}

#[post("/polls/<poll_id>/votes", data = "<request>", format = "json")]
pub async fn cast_vote(
    token: AuthToken,
    poll_id: Id,
    request: Json<VoteRequest>,
    store: Store,
) -> Result<(Status, Json<VoteReceipt>)> {
    let vote = voting::cast_vote(
        store.backend(),
        poll_id,
        token.id,
        request.alternative_id.into(),
        Utc::now(),
    )
    .await?;
    Ok((Status::Created, Json(vote.into())))
}

#[get("/polls/<poll_id>/results")]
pub async fn poll_results(token: AuthToken, poll_id: Id, store: Store) -> Result<Json<PollResults>> {
    let poll = load_poll(&store, poll_id).await?;
    if poll.visibility == Visibility::Private && !poll.is_creator(token.id) {
        return Err(Error::forbidden(
            "Only the creator can see the results of a private poll",
        ));
    }

    let tally = voting::tally(store.backend(), &poll).await?;
    let status = poll.effective_status(Utc::now());
    Ok(Json(PollResults::new(&poll, tally, status)))
}

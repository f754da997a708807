use rocket::{http::Status, serde::json::Json, Catcher, Request};

use crate::{error::ErrorBody, logging::RequestId};

pub fn catchers() -> Vec<Catcher> {
    catchers![bad_request, unauthorized, not_found, unprocessable, default]
}

type Caught = (Status, Json<ErrorBody>);

fn caught(status: Status, req: &Request<'_>, error: &str) -> Caught {
    let id = RequestId::of(req);
    debug!("req{id} caught {status}");
    (status, Json(ErrorBody::new(error)))
}

#[catch(400)]
fn bad_request(req: &Request<'_>) -> Caught {
    caught(Status::BadRequest, req, "Validation error")
}

#[catch(401)]
fn unauthorized(req: &Request<'_>) -> Caught {
    caught(Status::Unauthorized, req, "Authentication required")
}

#[catch(404)]
fn not_found(req: &Request<'_>) -> Caught {
    caught(Status::NotFound, req, "Not found")
}

/// Bodies that parse as JSON but not as the expected shape.
#[catch(422)]
fn unprocessable(req: &Request<'_>) -> Caught {
    caught(Status::BadRequest, req, "Validation error")
}

#[catch(default)]
fn default(status: Status, req: &Request<'_>) -> Caught {
    let reason = status.reason().unwrap_or("Unexpected error");
    caught(status, req, reason)
}

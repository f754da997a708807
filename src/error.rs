use argon2::Error as Argon2Error;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use mongodb::{bson::de::Error as BsonDeError, error::Error as DbError};
use rocket::{
    http::{Status, StatusClass},
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde::Serialize;
use thiserror::Error;

use crate::logging::RequestId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Poll is already closed")]
    AlreadyClosed,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("This poll is not accepting votes")]
    PollNotAcceptingVotes,
    #[error("You have already voted in this poll")]
    DuplicateVote,
    #[error("Invalid option for this poll")]
    InvalidAlternative,
    #[error("This poll has reached its vote limit")]
    QuotaExceeded,
    /// A uniqueness constraint was violated at the storage layer.
    #[error("Conflicting write: {0}")]
    Conflict(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    BsonDe(#[from] BsonDeError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(why: impl Into<String>) -> Self {
        Self::Forbidden(why.into())
    }

    pub fn bad_request(why: impl Into<String>) -> Self {
        Self::BadRequest(why.into())
    }

    pub fn unauthorized(why: impl Into<String>) -> Self {
        Self::Unauthorized(why.into())
    }

    /// The HTTP status this error is reported as.
    pub fn status(&self) -> Status {
        match self {
            Self::NotFound(_) => Status::NotFound,
            Self::Forbidden(_) => Status::Forbidden,
            Self::AlreadyClosed
            | Self::InvalidTransition(_)
            | Self::PollNotAcceptingVotes
            | Self::InvalidAlternative
            | Self::QuotaExceeded
            | Self::BadRequest(_) => Status::BadRequest,
            Self::DuplicateVote => Status::Conflict,
            Self::Unauthorized(_) => Status::Unauthorized,
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            },
            Self::Conflict(_) | Self::Db(_) | Self::BsonDe(_) | Self::Argon2(_) => {
                Status::InternalServerError
            }
        }
    }
}

/// JSON body sent alongside every error status.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        let id = RequestId::of(req);
        let error = if status.class() == StatusClass::ServerError {
            // Storage and crypto internals stay in the logs.
            error!("req{id} failed: {self}");
            "Internal server error".to_string()
        } else {
            debug!("req{id} rejected: {self}");
            self.to_string()
        };
        (status, Json(ErrorBody::new(error))).respond_to(req)
    }
}

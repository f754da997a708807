use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{FromRequest, Outcome},
    time::Duration,
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::id::ApiId,
    db::user::User,
    mongodb::Id,
    store::{Store, UserStore},
};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

const BEARER_PREFIX: &str = "Bearer ";

/// Proof that a request was made by a specific, existing user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthToken {
    pub id: Id,
}

impl AuthToken {
    /// Create a new [`AuthToken`] for the given user.
    pub fn new(user: &User) -> Self {
        Self { id: user.id }
    }

    /// Serialize this token into a signed JWT.
    pub fn encode(self, config: &Config) -> Result<String> {
        let claims = Claims {
            sub: self.id.into(),
            expire_at: Utc::now() + config.auth_ttl(),
        };

        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?)
    }

    /// Deserialize and verify a token from a JWT.
    pub fn decode(jwt: &str, config: &Config) -> Result<Self> {
        let token = jsonwebtoken::decode(
            jwt,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| Self {
            id: claims.claims.sub.into(),
        })?;
        Ok(token)
    }

    /// Wrap an encoded JWT in the auth cookie.
    pub fn cookie(jwt: String, config: &Config) -> Cookie<'static> {
        Cookie::build(AUTH_TOKEN_COOKIE, jwt)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish()
    }
}

/// JWT claims: the user ID plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    sub: ApiId,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

/// Find the raw JWT, preferring the `Authorization` header over the cookie.
fn raw_token(req: &Request<'_>) -> Option<String> {
    if let Some(header) = req.headers().get_one("Authorization") {
        return header.strip_prefix(BEARER_PREFIX).map(str::to_string);
    }
    req.cookies()
        .get(AUTH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an [`AuthToken`] from the request and check its user still exists.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwraps are safe as `Config` and `Store` are always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();
        let store = req.guard::<&State<Store>>().await.unwrap();

        let jwt = match raw_token(req) {
            Some(jwt) => jwt,
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::unauthorized("Token not provided"),
                ))
            }
        };

        let token = match Self::decode(&jwt, config) {
            Ok(token) => token,
            Err(e) => {
                debug!("Rejected auth token: {e}");
                return Outcome::Failure((Status::Unauthorized, Error::unauthorized("Invalid token")));
            }
        };

        match store.user_by_id(token.id).await {
            Ok(Some(_)) => Outcome::Success(token),
            Ok(None) => Outcome::Failure((
                Status::Unauthorized,
                Error::unauthorized("Token user no longer exists"),
            )),
            Err(e) => Outcome::Failure((Status::InternalServerError, e)),
        }
    }
}

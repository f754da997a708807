use argon2::Config;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{api::id::ApiId, db::user::User, mongodb::Id};

pub const MIN_NAME_LENGTH: usize = 2;
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Raw sign-up details, received from a user. These are never stored directly,
/// since the password is in plaintext.
#[derive(Clone, Deserialize, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl TryFrom<Registration> for User {
    type Error = Error;

    /// Convert a [`Registration`] to a new [`User`] by hashing the password.
    /// This enforces that the name and password meet minimum length, and that
    /// the e-mail address looks like one.
    fn try_from(registration: Registration) -> Result<Self> {
        if registration.name.trim().chars().count() < MIN_NAME_LENGTH {
            return Err(Error::bad_request(format!(
                "Name must be at least {MIN_NAME_LENGTH} characters"
            )));
        }
        let email = registration.email.trim().to_lowercase();
        if !is_plausible_email(&email) {
            return Err(Error::bad_request("Invalid e-mail address"));
        }
        if registration.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::bad_request(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        // 16 bytes is recommended for password hashing:
        //  https://en.wikipedia.org/wiki/Argon2
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(registration.password.as_bytes(), &salt, &Config::default())?;

        Ok(Self {
            id: Id::new(),
            name: registration.name.trim().to_string(),
            email,
            password_hash,
            created_at: Utc::now(),
        })
    }
}

/// One `@` with something on both sides, and a dot in the domain.
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
        }
        None => false,
    }
}

/// Login details.
#[derive(Clone, Deserialize, Serialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

/// A user, as shown to themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDescription {
    pub id: ApiId,
    pub name: String,
    pub email: String,
}

impl From<User> for UserDescription {
    fn from(user: User) -> Self {
        Self {
            id: user.id.into(),
            name: user.name,
            email: user.email,
        }
    }
}

/// Sent back on successful registration or login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token; also set as the auth cookie.
    pub access_token: String,
    pub user: UserDescription,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_hashes_password() {
        let user = User::try_from(Registration::example()).unwrap();
        assert_ne!(user.password_hash, Registration::example().password);
        assert!(user.verify_password("analytical").unwrap());
        assert!(!user.verify_password("mechanical").unwrap());
    }

    #[test]
    fn email_is_normalised() {
        let registration = Registration {
            email: "  Ada@Example.COM ".into(),
            ..Registration::example()
        };
        let user = User::try_from(registration).unwrap();
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn weak_registrations_are_rejected() {
        for registration in [
            Registration {
                name: "A".into(),
                ..Registration::example()
            },
            Registration {
                email: "not-an-email".into(),
                ..Registration::example()
            },
            Registration {
                email: "ada@localhost".into(),
                ..Registration::example()
            },
            Registration {
                password: "short".into(),
                ..Registration::example()
            },
        ] {
            assert!(matches!(
                User::try_from(registration),
                Err(Error::BadRequest(_))
            ));
        }
    }
}

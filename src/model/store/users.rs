use crate::error::Result;
use crate::model::{db::user::User, mongodb::Id};

/// Storage for registered users.
#[rocket::async_trait]
pub trait UserStore: Send + Sync {
    /// Store a new user.
    ///
    /// Fails with [`Error::Conflict`](crate::error::Error::Conflict) if the
    /// e-mail address is already registered.
    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn user_by_id(&self, user_id: Id) -> Result<Option<User>>;

    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;
}

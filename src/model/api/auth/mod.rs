mod credentials;
mod token;

pub use credentials::{AuthResponse, Login, Registration, UserDescription};
pub use token::{AuthToken, AUTH_TOKEN_COOKIE};

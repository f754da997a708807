use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::auth::{AuthResponse, AuthToken, Login, Registration, AUTH_TOKEN_COOKIE},
        db::user::User,
        store::{Store, UserStore},
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![register, login, logout]
}

#[post("/auth/register", data = "<registration>", format = "json")]
pub async fn register(
    registration: Json<Registration>,
    cookies: &CookieJar<'_>,
    store: Store,
    config: &State<Config>,
) -> Result<(Status, Json<AuthResponse>)> {
    let user = User::try_from(registration.into_inner())?;

    match store.insert_user(&user).await {
        Ok(()) => {}
        Err(Error::Conflict(_)) => return Err(Error::bad_request("Email already registered")),
        Err(e) => return Err(e),
    }
    info!("Registered user {}", user.id);

    let response = sign_in(user, cookies, config)?;
    Ok((Status::Created, Json(response)))
}

#[post("/auth/login", data = "<login>", format = "json")]
pub async fn login(
    login: Json<Login>,
    cookies: &CookieJar<'_>,
    store: Store,
    config: &State<Config>,
) -> Result<Json<AuthResponse>> {
    let invalid = || Error::unauthorized("Invalid e-mail or password");

    let email = login.email.trim().to_lowercase();
    let user = store.user_by_email(&email).await?.ok_or_else(invalid)?;
    if !user.verify_password(&login.password)? {
        return Err(invalid());
    }

    Ok(Json(sign_in(user, cookies, config)?))
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}

/// Issue a token for `user`, both as a cookie and in the response body.
fn sign_in(user: User, cookies: &CookieJar<'_>, config: &Config) -> Result<AuthResponse> {
    let jwt = AuthToken::new(&user).encode(config)?;
    cookies.add(AuthToken::cookie(jwt.clone(), config));
    Ok(AuthResponse {
        access_token: jwt,
        user: user.into(),
    })
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Header},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use super::*;

    #[backend_test]
    async fn register_signs_in(client: Client, store: Store) {
        let response = client
            .post(uri!(register))
            .header(ContentType::JSON)
            .body(json!(Registration::example()).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Created, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());

        let body = response.into_json::<AuthResponse>().await.unwrap();
        assert_eq!(body.user.email, Registration::example().email);
        let stored = store
            .user_by_email(&Registration::example().email)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(String::from(body.user.id), stored.id.to_string());
    }

    #[backend_test(user)]
    async fn register_duplicate_email(client: Client) {
        let registration = Registration {
            email: "ADA@example.com".to_string(),
            ..Registration::example2()
        };
        let response = client
            .post(uri!(register))
            .header(ContentType::JSON)
            .body(json!(registration).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::BadRequest, response.status());
        let body = response.into_string().await.unwrap();
        assert!(body.contains("Email already registered"));
    }

    #[backend_test]
    async fn register_weak_password(client: Client) {
        let registration = Registration {
            password: "abc".to_string(),
            ..Registration::example()
        };
        let response = client
            .post(uri!(register))
            .header(ContentType::JSON)
            .body(json!(registration).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(None, client.cookies().get(AUTH_TOKEN_COOKIE));
    }

    #[backend_test(user)]
    async fn login_valid(client: Client) {
        client.delete(uri!(logout)).dispatch().await;
        assert_eq!(None, client.cookies().get(AUTH_TOKEN_COOKIE));

        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(json!(Login::example()).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Ok, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());
    }

    #[backend_test(user)]
    async fn login_invalid(client: Client) {
        client.delete(uri!(logout)).dispatch().await;

        // Wrong password.
        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(
                json!({
                    "email": Registration::example().email,
                    "password": "not-the-password",
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        // Unknown e-mail.
        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(
                json!({
                    "email": "nobody@example.com",
                    "password": Registration::example().password,
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
        assert_eq!(None, client.cookies().get(AUTH_TOKEN_COOKIE));
    }

    #[backend_test(user)]
    async fn bearer_token_without_cookie(client: Client) {
        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(json!(Login::example()).to_string())
            .dispatch()
            .await;
        let jwt = response
            .into_json::<AuthResponse>()
            .await
            .unwrap()
            .access_token;
        client.delete(uri!(logout)).dispatch().await;

        let response = client.get("/me/polls/created").dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());

        let response = client
            .get("/me/polls/created")
            .header(Header::new("Authorization", format!("Bearer {jwt}")))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
    }

    #[backend_test(user)]
    async fn example_user_is_signed_in(client: Client, store: Store) {
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());
        assert!(store
            .user_by_email(&Registration::example().email)
            .await
            .unwrap()
            .is_some());

        let response = client.get("/me/polls/created").dispatch().await;
        assert_eq!(Status::Ok, response.status());
    }

    #[backend_test(user)]
    async fn logout_user(client: Client) {
        let response = client.delete(uri!(logout)).dispatch().await;

        assert_eq!(Status::Ok, response.status());
        assert_eq!(None, client.cookies().get(AUTH_TOKEN_COOKIE));
    }

    #[backend_test]
    async fn logout_not_logged_in(client: Client) {
        let response = client.delete(uri!(logout)).dispatch().await;

        assert_eq!(Status::Ok, response.status());
    }
}

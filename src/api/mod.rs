use rocket::Route;

pub use catchers::catchers;

pub mod auth;
pub mod catchers;
pub mod me;
pub mod polls;
pub mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(polls::routes());
    routes.extend(voting::routes());
    routes.extend(me::routes());
    routes
}

use axum::{routing::get, Router};

pub mod auth;
pub mod shop;
pub mod system;
pub mod warehouse;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/users", get(warehouse::list_users))
        .nest("/warehouse", warehouse::router())
        .nest("/shop", shop::router())
}

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;

use stockroom_auth::{AccountError, Role, UserAccount};
use stockroom_core::DomainError;

use crate::app::{dto, errors};
use crate::context::AppContext;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Create a shop account and sign it in.
pub async fn register(
    Extension(ctx): Extension<Arc<AppContext>>,
    Json(body): Json<dto::CredentialsRequest>,
) -> axum::response::Response {
    if Role::for_username(body.username.trim(), ctx.warehouse_username()) == Role::Warehouse {
        return errors::domain_error_to_response(&DomainError::conflict(format!(
            "username '{}' is reserved",
            body.username.trim()
        )));
    }

    let dto::CredentialsRequest { username, password } = body;
    let registered =
        tokio::task::spawn_blocking(move || UserAccount::register(&username, &password, Role::Shop))
            .await;
    let account = match registered {
        Ok(Ok(account)) => account,
        Ok(Err(AccountError::Domain(e))) => return errors::domain_error_to_response(&e),
        Ok(Err(AccountError::Password(e))) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
        }
        Err(e) => return internal(e),
    };

    if let Err(e) = ctx.users().insert(account.clone()) {
        return errors::store_error_to_response(e);
    }
    tracing::info!(username = %account.username, "shop account registered");

    token_response(&ctx, &account, StatusCode::CREATED)
}

pub async fn login(
    Extension(ctx): Extension<Arc<AppContext>>,
    Json(body): Json<dto::CredentialsRequest>,
) -> axum::response::Response {
    let account = match ctx.users().find(body.username.trim()) {
        Ok(Some(account)) => account,
        Ok(None) => return invalid_credentials(),
        Err(e) => return errors::store_error_to_response(e),
    };

    let password = body.password;
    let checked = account.clone();
    let verified = match tokio::task::spawn_blocking(move || checked.verify_password(&password)).await {
        Ok(v) => v,
        Err(e) => return internal(e),
    };
    if !verified {
        tracing::warn!(username = %account.username, "login rejected");
        return invalid_credentials();
    }

    token_response(&ctx, &account, StatusCode::OK)
}

fn token_response(
    ctx: &AppContext,
    account: &UserAccount,
    status: StatusCode,
) -> axum::response::Response {
    match ctx
        .issuer()
        .issue(account.id, &account.username, account.role, Utc::now())
    {
        Ok(token) => (status, Json(dto::token_to_json(&token, account))).into_response(),
        Err(e) => internal(e),
    }
}

fn invalid_credentials() -> axum::response::Response {
    errors::json_error(
        StatusCode::UNAUTHORIZED,
        "invalid_credentials",
        "invalid username or password",
    )
}

fn internal(e: impl std::fmt::Display) -> axum::response::Response {
    tracing::error!(error = %e, "auth request failed");
    errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
}

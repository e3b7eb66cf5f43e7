use axum::{extract::Extension, response::IntoResponse, Json};

use crate::context::PrincipalContext;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "user_id": principal.user_id().to_string(),
        "username": principal.username(),
        "role": principal.role(),
        "shop_id": principal.shop_id(),
    }))
}

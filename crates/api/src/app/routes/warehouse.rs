use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use stockroom_auth::Role;

use crate::app::{dto, errors};
use crate::authz;
use crate::context::{AppContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/stock", get(get_stock))
        .route("/products", post(add_product))
        .route("/products/:name", delete(delete_product))
        .route("/shops", get(list_shops))
}

pub async fn list_users(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_role(&principal, Role::Warehouse) {
        return resp;
    }

    match ctx.users().list() {
        Ok(accounts) => {
            let users: Vec<_> = accounts
                .iter()
                .map(|a| dto::account_to_json(&a.summary()))
                .collect();
            (StatusCode::OK, Json(serde_json::json!({ "users": users }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_stock(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_role(&principal, Role::Warehouse) {
        return resp;
    }

    match ctx.stock().load_warehouse() {
        Ok(stock) => (StatusCode::OK, Json(serde_json::json!({ "stock": stock }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn add_product(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::AddProductRequest>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_role(&principal, Role::Warehouse) {
        return resp;
    }

    match ctx
        .stock()
        .transact(|ledger| ledger.add_product(&body.product_name, body.initial_quantity))
    {
        Ok(product) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "product": product,
                "quantity": body.initial_quantity,
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(name): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_role(&principal, Role::Warehouse) {
        return resp;
    }

    match ctx.stock().transact(|ledger| ledger.delete_product(&name)) {
        Ok((product, quantity)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "deleted": product,
                "quantity": quantity,
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Every shop's stock with its low-stock and overstock findings.
pub async fn list_shops(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_role(&principal, Role::Warehouse) {
        return resp;
    }

    let ledger = match ctx.stock().snapshot() {
        Ok(l) => l,
        Err(e) => return errors::store_error_to_response(e),
    };
    let shops: Vec<_> = ledger
        .shops()
        .keys()
        .map(|shop_id| dto::report_to_json(shop_id, &ledger.report(shop_id, ctx.policy())))
        .collect();

    (StatusCode::OK, Json(serde_json::json!({ "shops": shops }))).into_response()
}

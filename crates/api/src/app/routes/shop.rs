use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use stockroom_inventory::detect_overstock;

use crate::app::{dto, errors};
use crate::authz;
use crate::context::{AppContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/stock", get(get_stock))
        .route("/restock_plan", get(get_restock_plan))
        .route("/overstock", get(get_overstock))
        .route("/request_stock", post(request_stock))
        .route("/return_stock", post(return_stock))
        .route("/restock", post(apply_restock))
        .route("/return_overstock", post(return_overstock))
}

/// Stock dashboard for the calling shop.
pub async fn get_stock(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let shop_id = match authz::require_shop(&principal) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match ctx.stock().snapshot() {
        Ok(ledger) => {
            let report = ledger.report(&shop_id, ctx.policy());
            (StatusCode::OK, Json(dto::report_to_json(&shop_id, &report))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_restock_plan(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let shop_id = match authz::require_shop(&principal) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match ctx.stock().snapshot() {
        Ok(ledger) => {
            let plan = ledger.restock_plan(&shop_id, ctx.policy());
            (
                StatusCode::OK,
                Json(serde_json::json!({ "shop_id": shop_id, "restock_plan": plan })),
            )
                .into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_overstock(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let shop_id = match authz::require_shop(&principal) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match ctx.stock().load_shop(&shop_id) {
        Ok(stock) => {
            let overstock = detect_overstock(&stock, ctx.policy().ceiling);
            (
                StatusCode::OK,
                Json(serde_json::json!({ "shop_id": shop_id, "overstock": overstock })),
            )
                .into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn request_stock(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::TransferRequest>,
) -> axum::response::Response {
    let shop_id = match authz::require_shop(&principal) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match ctx
        .stock()
        .transact(|ledger| ledger.fulfill(&shop_id, &body.product, body.quantity))
    {
        Ok(receipt) => (StatusCode::OK, Json(dto::receipt_to_json(&receipt))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn return_stock(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::TransferRequest>,
) -> axum::response::Response {
    let shop_id = match authz::require_shop(&principal) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match ctx
        .stock()
        .transact(|ledger| ledger.return_stock(&shop_id, &body.product, body.quantity))
    {
        Ok(receipt) => (StatusCode::OK, Json(dto::receipt_to_json(&receipt))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Ship every positive line of the current restock plan.
pub async fn apply_restock(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let shop_id = match authz::require_shop(&principal) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let policy = ctx.policy();
    match ctx.stock().transact(|ledger| ledger.apply_restock(&shop_id, policy)) {
        Ok(shipped) => (
            StatusCode::OK,
            Json(serde_json::json!({ "shop_id": shop_id, "shipped": shipped })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn return_overstock(
    Extension(ctx): Extension<Arc<AppContext>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let shop_id = match authz::require_shop(&principal) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let policy = ctx.policy();
    match ctx.stock().transact(|ledger| ledger.return_overstock(&shop_id, policy)) {
        Ok(returned) => (
            StatusCode::OK,
            Json(serde_json::json!({ "shop_id": shop_id, "returned": returned })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

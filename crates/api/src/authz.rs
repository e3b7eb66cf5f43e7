//! API-side role guard.
//!
//! Handlers call these before touching storage.

use axum::http::StatusCode;
use axum::response::Response;

use stockroom_auth::{Role, authorize};
use stockroom_core::ShopId;

use crate::app::errors;
use crate::context::PrincipalContext;

/// Require the request principal to hold `role`.
pub fn require_role(principal: &PrincipalContext, role: Role) -> Result<(), Response> {
    authorize(principal.principal(), role)
        .map_err(|e| errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}

/// Require a shop principal and return the shop it operates.
pub fn require_shop(principal: &PrincipalContext) -> Result<ShopId, Response> {
    require_role(principal, Role::Shop)?;
    principal.shop_id().ok_or_else(|| {
        errors::json_error(StatusCode::FORBIDDEN, "forbidden", "principal has no shop")
    })
}

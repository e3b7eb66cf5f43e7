use serde::Deserialize;
use serde_json::json;

use stockroom_auth::{AccountSummary, UserAccount};
use stockroom_core::ShopId;
use stockroom_inventory::{StockReport, TransferReceipt};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AddProductRequest {
    pub product_name: String,
    #[serde(default)]
    pub initial_quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub product: String,
    pub quantity: i64,
}

// -------------------------
// Response mapping
// -------------------------

pub fn receipt_to_json(r: &TransferReceipt) -> serde_json::Value {
    json!({
        "shop_id": r.shop_id,
        "product": r.product,
        "warehouse_product": r.warehouse_product,
        "quantity": r.quantity,
        "warehouse_quantity": r.warehouse_quantity,
        "shop_quantity": r.shop_quantity,
    })
}

pub fn report_to_json(shop_id: &ShopId, report: &StockReport) -> serde_json::Value {
    json!({
        "shop_id": shop_id,
        "stock": report.stock,
        "low_stock": report.low_stock,
        "restock_plan": report.restock_plan,
        "overstock": report.overstock,
        "needs_restock": report.needs_restock(),
        "overstocked": report.is_overstocked(),
        "low_stock_threshold": report.policy.low_stock_threshold,
        "stock_ceiling": report.policy.ceiling,
    })
}

pub fn account_to_json(a: &AccountSummary) -> serde_json::Value {
    json!({
        "id": a.id.to_string(),
        "username": a.username,
        "role": a.role,
    })
}

pub fn token_to_json(token: &str, account: &UserAccount) -> serde_json::Value {
    json!({
        "token": token,
        "username": account.username,
        "role": account.role,
    })
}

//! Stock reconciliation: low-stock detection, restock planning, overstock detection.
//!
//! These are pure functions over borrowed snapshots. They never validate
//! quantities and never fail; callers own the mappings they pass in.

use std::collections::BTreeMap;

/// Product name → quantity.
pub type StockLevels = BTreeMap<String, i64>;

/// Entries whose quantity is strictly below `threshold`, values unchanged.
pub fn detect_low_stock(stock: &StockLevels, threshold: i64) -> StockLevels {
    stock
        .iter()
        .filter(|(_, qty)| **qty < threshold)
        .map(|(item, qty)| (item.clone(), *qty))
        .collect()
}

/// Planned shipment per low-stock item: `min(available, ceiling - qty)`.
///
/// Items missing from `warehouse` count as zero available. The result is not
/// clamped, so an entry already above `ceiling` yields a negative value; treat
/// anything `<= 0` as "no shipment". Headroom saturates at the `i64` bounds.
pub fn plan_restock(low_stock: &StockLevels, warehouse: &StockLevels, ceiling: i64) -> StockLevels {
    low_stock
        .iter()
        .map(|(item, qty)| {
            let available = warehouse.get(item).copied().unwrap_or(0);
            (item.clone(), available.min(ceiling.saturating_sub(*qty)))
        })
        .collect()
}

/// Excess above `ceiling` for every entry strictly above it.
pub fn detect_overstock(stock: &StockLevels, ceiling: i64) -> StockLevels {
    stock
        .iter()
        .filter(|(_, qty)| **qty > ceiling)
        .map(|(item, qty)| (item.clone(), qty.saturating_sub(ceiling)))
        .collect()
}

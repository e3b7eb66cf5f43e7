//! Inventory domain module.
//!
//! This crate contains business rules for stock reconciliation and transfers,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod index;
pub mod ledger;
pub mod policy;
pub mod reconcile;
pub mod report;

pub use index::ProductIndex;
pub use ledger::{StockLedger, TransferReceipt};
pub use policy::{LOW_STOCK_THRESHOLD, STOCK_CEILING, StockPolicy};
pub use reconcile::{StockLevels, detect_low_stock, detect_overstock, plan_restock};
pub use report::StockReport;

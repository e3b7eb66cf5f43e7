//! Stock thresholds shared by the detectors and the ledger.

use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult};

/// Quantity below which a shop's product is considered low on stock.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Maximum quantity a shop should hold of any one product.
pub const STOCK_CEILING: i64 = 20;

/// Threshold + ceiling pair applied to every shop.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPolicy {
    pub low_stock_threshold: i64,
    pub ceiling: i64,
}

impl StockPolicy {
    pub fn new(low_stock_threshold: i64, ceiling: i64) -> DomainResult<Self> {
        if low_stock_threshold <= 0 {
            return Err(DomainError::validation("low-stock threshold must be positive"));
        }
        if ceiling < low_stock_threshold {
            return Err(DomainError::validation(
                "stock ceiling must not be below the low-stock threshold",
            ));
        }
        Ok(Self {
            low_stock_threshold,
            ceiling,
        })
    }
}

impl Default for StockPolicy {
    fn default() -> Self {
        Self {
            low_stock_threshold: LOW_STOCK_THRESHOLD,
            ceiling: STOCK_CEILING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_uses_the_shared_constants() {
        let policy = StockPolicy::default();
        assert_eq!(policy.low_stock_threshold, 5);
        assert_eq!(policy.ceiling, 20);
    }

    #[test]
    fn ceiling_below_threshold_is_rejected() {
        assert!(matches!(StockPolicy::new(10, 5), Err(DomainError::Validation(_))));
        assert!(matches!(StockPolicy::new(0, 5), Err(DomainError::Validation(_))));
        assert!(StockPolicy::new(5, 5).is_ok());
    }
}

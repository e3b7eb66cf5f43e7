//! Per-shop stock report combining the three reconciliation views.

use serde::{Deserialize, Serialize};

use crate::policy::StockPolicy;
use crate::reconcile::{StockLevels, detect_low_stock, detect_overstock, plan_restock};

/// Snapshot of one shop's stock with low-stock, restock and overstock views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReport {
    pub stock: StockLevels,
    pub low_stock: StockLevels,
    /// Unclamped plan; entries `<= 0` mean "no shipment".
    pub restock_plan: StockLevels,
    pub overstock: StockLevels,
    pub policy: StockPolicy,
}

impl StockReport {
    /// `warehouse` must be keyed the same way as `stock` (see
    /// [`crate::StockLedger::warehouse_view`]).
    pub fn build(stock: StockLevels, warehouse: &StockLevels, policy: StockPolicy) -> Self {
        let low_stock = detect_low_stock(&stock, policy.low_stock_threshold);
        let restock_plan = plan_restock(&low_stock, warehouse, policy.ceiling);
        let overstock = detect_overstock(&stock, policy.ceiling);
        Self {
            stock,
            low_stock,
            restock_plan,
            overstock,
            policy,
        }
    }

    pub fn needs_restock(&self) -> bool {
        self.restock_plan.values().any(|qty| *qty > 0)
    }

    pub fn is_overstocked(&self) -> bool {
        !self.overstock.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(entries: &[(&str, i64)]) -> StockLevels {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn report_combines_all_three_views() {
        let stock = levels(&[("apple", 3), ("pear", 25), ("fig", 10)]);
        let warehouse = levels(&[("apple", 4), ("pear", 100), ("fig", 0)]);

        let report = StockReport::build(stock, &warehouse, StockPolicy::default());

        assert_eq!(report.low_stock, levels(&[("apple", 3)]));
        assert_eq!(report.restock_plan, levels(&[("apple", 4)]));
        assert_eq!(report.overstock, levels(&[("pear", 5)]));
        assert!(report.needs_restock());
        assert!(report.is_overstocked());
    }

    #[test]
    fn zero_availability_does_not_count_as_needing_restock() {
        let report = StockReport::build(levels(&[("apple", 1)]), &StockLevels::new(), StockPolicy::default());
        assert_eq!(report.restock_plan, levels(&[("apple", 0)]));
        assert!(!report.needs_restock());
    }
}

//! Stock ledger: warehouse + shop stock snapshot and the transfer operations on it.
//!
//! A ledger is loaded wholesale from storage, mutated in memory, and saved
//! wholesale by the caller. Operations either apply completely or return an
//! error without touching any quantity.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, ShopId};

use crate::index::ProductIndex;
use crate::policy::StockPolicy;
use crate::reconcile::{StockLevels, detect_overstock};
use crate::report::StockReport;

/// Outcome of a single warehouse ↔ shop transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub shop_id: ShopId,
    /// Key the shop's stock is recorded under.
    pub product: String,
    /// Key the warehouse stock is recorded under.
    pub warehouse_product: String,
    pub quantity: i64,
    pub warehouse_quantity: i64,
    pub shop_quantity: i64,
}

#[derive(Debug, Clone, Default)]
pub struct StockLedger {
    warehouse: StockLevels,
    shops: BTreeMap<ShopId, StockLevels>,
    warehouse_index: ProductIndex,
    shop_indexes: HashMap<ShopId, ProductIndex>,
}

impl StockLedger {
    /// Build a ledger from stored mappings.
    ///
    /// Keys that differ only by case are merged under the first key in
    /// sorted order, so every product has exactly one entry per mapping.
    pub fn new(warehouse: StockLevels, shops: BTreeMap<ShopId, StockLevels>) -> Self {
        let warehouse = merge_case_variants(warehouse);
        let shops: BTreeMap<ShopId, StockLevels> = shops
            .into_iter()
            .map(|(shop_id, stock)| (shop_id, merge_case_variants(stock)))
            .collect();
        let warehouse_index = ProductIndex::build(&warehouse);
        let shop_indexes = shops
            .iter()
            .map(|(shop_id, stock)| (shop_id.clone(), ProductIndex::build(stock)))
            .collect();
        Self {
            warehouse,
            shops,
            warehouse_index,
            shop_indexes,
        }
    }

    pub fn warehouse(&self) -> &StockLevels {
        &self.warehouse
    }

    pub fn shops(&self) -> &BTreeMap<ShopId, StockLevels> {
        &self.shops
    }

    pub fn shop(&self, shop_id: &ShopId) -> Option<&StockLevels> {
        self.shops.get(shop_id)
    }

    pub fn into_parts(self) -> (StockLevels, BTreeMap<ShopId, StockLevels>) {
        (self.warehouse, self.shops)
    }

    /// Stored warehouse key matching `name` case-insensitively.
    pub fn resolve_warehouse_product(&self, name: &str) -> Option<&str> {
        self.warehouse_index.resolve(name)
    }

    /// Register a new warehouse product.
    ///
    /// Returns the stored key. Names are trimmed; duplicates are detected
    /// case-insensitively.
    pub fn add_product(&mut self, name: &str, initial_quantity: i64) -> DomainResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if initial_quantity < 0 {
            return Err(DomainError::validation("initial quantity cannot be negative"));
        }
        if let Some(existing) = self.warehouse_index.resolve(name) {
            return Err(DomainError::conflict(format!(
                "product '{existing}' already exists (case-insensitive)"
            )));
        }

        self.warehouse.insert(name.to_string(), initial_quantity);
        self.warehouse_index.insert(name);
        tracing::info!(product = name, initial_quantity, "warehouse product added");
        Ok(name.to_string())
    }

    /// Remove a warehouse product; shop holdings of it are left untouched.
    ///
    /// Returns the removed key and the quantity it held.
    pub fn delete_product(&mut self, name: &str) -> DomainResult<(String, i64)> {
        let key = self
            .warehouse_index
            .resolve(name)
            .map(str::to_string)
            .ok_or_else(|| not_in_warehouse(name))?;

        let quantity = self.warehouse.remove(&key).unwrap_or(0);
        self.warehouse_index.remove(&key);
        tracing::info!(product = %key, quantity, "warehouse product deleted");
        Ok((key, quantity))
    }

    /// Ship `quantity` units of `product` from the warehouse to `shop_id`.
    pub fn fulfill(
        &mut self,
        shop_id: &ShopId,
        product: &str,
        quantity: i64,
    ) -> DomainResult<TransferReceipt> {
        ensure_positive(quantity)?;

        let warehouse_key = self
            .warehouse_index
            .resolve(product)
            .map(str::to_string)
            .ok_or_else(|| not_in_warehouse(product))?;

        let available = self.warehouse.get(&warehouse_key).copied().unwrap_or(0);
        if available < quantity {
            return Err(DomainError::insufficient_stock(warehouse_key, quantity, available));
        }

        let shop_key = self
            .shop_indexes
            .get(shop_id)
            .and_then(|index| index.resolve(&warehouse_key))
            .map(str::to_string)
            .unwrap_or_else(|| warehouse_key.clone());

        let held = self.shop_quantity(shop_id, &shop_key);
        let shop_quantity = held
            .checked_add(quantity)
            .ok_or_else(|| quantity_overflow(&shop_key))?;

        let warehouse_quantity = available - quantity;
        self.warehouse.insert(warehouse_key.clone(), warehouse_quantity);
        self.set_shop_quantity(shop_id, &shop_key, shop_quantity);

        tracing::info!(
            shop_id = %shop_id,
            product = %shop_key,
            quantity,
            warehouse_quantity,
            shop_quantity,
            "stock fulfilled"
        );

        Ok(TransferReceipt {
            shop_id: shop_id.clone(),
            product: shop_key,
            warehouse_product: warehouse_key,
            quantity,
            warehouse_quantity,
            shop_quantity,
        })
    }

    /// Send `quantity` units of `product` back from `shop_id` to the warehouse.
    ///
    /// If the warehouse no longer lists the product it is re-created under
    /// the shop's key.
    pub fn return_stock(
        &mut self,
        shop_id: &ShopId,
        product: &str,
        quantity: i64,
    ) -> DomainResult<TransferReceipt> {
        ensure_positive(quantity)?;

        let shop_key = self
            .shop_indexes
            .get(shop_id)
            .and_then(|index| index.resolve(product))
            .map(str::to_string);

        let held = shop_key
            .as_ref()
            .map(|key| self.shop_quantity(shop_id, key))
            .unwrap_or(0);

        let shop_key = match shop_key {
            Some(key) if held >= quantity => key,
            Some(key) => return Err(DomainError::insufficient_stock(key, quantity, held)),
            None => return Err(DomainError::insufficient_stock(product, quantity, 0)),
        };

        let warehouse_key = self
            .warehouse_index
            .resolve(&shop_key)
            .map(str::to_string)
            .unwrap_or_else(|| shop_key.clone());

        let warehouse_quantity = self
            .warehouse
            .get(&warehouse_key)
            .copied()
            .unwrap_or(0)
            .checked_add(quantity)
            .ok_or_else(|| quantity_overflow(&warehouse_key))?;

        let shop_quantity = held - quantity;
        self.set_shop_quantity(shop_id, &shop_key, shop_quantity);
        self.warehouse.insert(warehouse_key.clone(), warehouse_quantity);
        self.warehouse_index.insert(&warehouse_key);

        tracing::info!(
            shop_id = %shop_id,
            product = %shop_key,
            quantity,
            warehouse_quantity,
            shop_quantity,
            "stock returned"
        );

        Ok(TransferReceipt {
            shop_id: shop_id.clone(),
            product: shop_key,
            warehouse_product: warehouse_key,
            quantity,
            warehouse_quantity,
            shop_quantity,
        })
    }

    /// Warehouse availability re-keyed onto the shop's own product keys.
    pub fn warehouse_view(&self, shop_stock: &StockLevels) -> StockLevels {
        shop_stock
            .keys()
            .map(|item| {
                let available = self
                    .warehouse_index
                    .resolve(item)
                    .and_then(|key| self.warehouse.get(key))
                    .copied()
                    .unwrap_or(0);
                (item.clone(), available)
            })
            .collect()
    }

    /// Dashboard view of one shop (unknown shops report empty stock).
    pub fn report(&self, shop_id: &ShopId, policy: StockPolicy) -> StockReport {
        let stock = self.shops.get(shop_id).cloned().unwrap_or_default();
        let view = self.warehouse_view(&stock);
        StockReport::build(stock, &view, policy)
    }

    /// Planned shipments for the shop's low-stock items (unclamped).
    pub fn restock_plan(&self, shop_id: &ShopId, policy: StockPolicy) -> StockLevels {
        self.report(shop_id, policy).restock_plan
    }

    /// Ship every positive planned quantity. Returns what was shipped.
    pub fn apply_restock(&mut self, shop_id: &ShopId, policy: StockPolicy) -> DomainResult<StockLevels> {
        let plan = self.restock_plan(shop_id, policy);
        let mut shipped = StockLevels::new();
        for (item, quantity) in plan {
            if quantity <= 0 {
                continue;
            }
            let receipt = self.fulfill(shop_id, &item, quantity)?;
            shipped.insert(receipt.product, receipt.quantity);
        }
        Ok(shipped)
    }

    /// Return every unit above the ceiling to the warehouse. Returns what was sent back.
    pub fn return_overstock(
        &mut self,
        shop_id: &ShopId,
        policy: StockPolicy,
    ) -> DomainResult<StockLevels> {
        let excess = match self.shops.get(shop_id) {
            Some(stock) => detect_overstock(stock, policy.ceiling),
            None => StockLevels::new(),
        };
        let mut returned = StockLevels::new();
        for (item, quantity) in excess {
            let receipt = self.return_stock(shop_id, &item, quantity)?;
            returned.insert(receipt.product, receipt.quantity);
        }
        Ok(returned)
    }

    fn shop_quantity(&self, shop_id: &ShopId, key: &str) -> i64 {
        self.shops
            .get(shop_id)
            .and_then(|stock| stock.get(key))
            .copied()
            .unwrap_or(0)
    }

    fn set_shop_quantity(&mut self, shop_id: &ShopId, key: &str, quantity: i64) {
        self.shops
            .entry(shop_id.clone())
            .or_default()
            .insert(key.to_string(), quantity);
        self.shop_indexes.entry(shop_id.clone()).or_default().insert(key);
    }
}

fn merge_case_variants(stock: StockLevels) -> StockLevels {
    let stored = stock.len();
    let mut index = ProductIndex::default();
    let mut merged = StockLevels::new();
    for (key, quantity) in stock {
        let canonical = match index.resolve(&key) {
            Some(existing) => existing.to_string(),
            None => {
                index.insert(&key);
                key
            }
        };
        let entry = merged.entry(canonical).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }
    if merged.len() < stored {
        tracing::warn!(
            merged = stored - merged.len(),
            "merged product keys that differ only by case"
        );
    }
    merged
}

fn ensure_positive(quantity: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::validation("quantity must be positive"));
    }
    Ok(())
}

fn quantity_overflow(product: &str) -> DomainError {
    DomainError::validation(format!("quantity of '{product}' would overflow"))
}

fn not_in_warehouse(name: &str) -> DomainError {
    DomainError::not_found(format!("product '{name}' not found in warehouse"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn levels(entries: &[(&str, i64)]) -> StockLevels {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn shop() -> ShopId {
        ShopId::new("corner")
    }

    fn ledger_with(warehouse: &[(&str, i64)], shop_stock: &[(&str, i64)]) -> StockLedger {
        let mut shops = BTreeMap::new();
        if !shop_stock.is_empty() {
            shops.insert(shop(), levels(shop_stock));
        }
        StockLedger::new(levels(warehouse), shops)
    }

    fn total_units(ledger: &StockLedger) -> i64 {
        ledger.warehouse().values().sum::<i64>()
            + ledger.shops().values().flat_map(|s| s.values()).sum::<i64>()
    }

    #[test]
    fn fulfill_matches_product_case_insensitively() {
        let mut ledger = ledger_with(&[("apple", 10)], &[]);

        let receipt = ledger.fulfill(&shop(), "Apple", 5).unwrap();

        assert_eq!(receipt.warehouse_product, "apple");
        assert_eq!(receipt.product, "apple");
        assert_eq!(ledger.warehouse()["apple"], 5);
        assert_eq!(ledger.shop(&shop()).unwrap()["apple"], 5);
    }

    #[test]
    fn fulfill_adds_to_existing_shop_key_with_other_casing() {
        let mut ledger = ledger_with(&[("apple", 10)], &[("APPLE", 2)]);

        let receipt = ledger.fulfill(&shop(), "apple", 3).unwrap();

        assert_eq!(receipt.product, "APPLE");
        assert_eq!(receipt.shop_quantity, 5);
        assert_eq!(ledger.shop(&shop()).unwrap().len(), 1);
    }

    #[test]
    fn fulfill_unknown_product_is_not_found() {
        let mut ledger = ledger_with(&[("apple", 10)], &[]);
        let err = ledger.fulfill(&shop(), "kiwi", 1).unwrap_err();
        assert_eq!(err, DomainError::not_found("product 'kiwi' not found in warehouse"));
    }

    #[test]
    fn fulfill_beyond_warehouse_stock_changes_nothing() {
        let mut ledger = ledger_with(&[("apple", 3)], &[]);

        let err = ledger.fulfill(&shop(), "apple", 4).unwrap_err();

        assert_eq!(err, DomainError::insufficient_stock("apple", 4, 3));
        assert_eq!(ledger.warehouse()["apple"], 3);
        assert!(ledger.shop(&shop()).is_none());
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        let mut ledger = ledger_with(&[("apple", 3)], &[("apple", 3)]);
        assert!(matches!(ledger.fulfill(&shop(), "apple", 0), Err(DomainError::Validation(_))));
        assert!(matches!(ledger.return_stock(&shop(), "apple", -1), Err(DomainError::Validation(_))));
    }

    #[test]
    fn return_moves_stock_back_to_the_warehouse() {
        let mut ledger = ledger_with(&[("Apple", 1)], &[("apple", 6)]);

        let receipt = ledger.return_stock(&shop(), "APPLE", 4).unwrap();

        assert_eq!(receipt.product, "apple");
        assert_eq!(receipt.warehouse_product, "Apple");
        assert_eq!(ledger.shop(&shop()).unwrap()["apple"], 2);
        assert_eq!(ledger.warehouse()["Apple"], 5);
    }

    #[test]
    fn return_more_than_held_is_insufficient() {
        let mut ledger = ledger_with(&[("apple", 1)], &[("apple", 2)]);
        let err = ledger.return_stock(&shop(), "apple", 3).unwrap_err();
        assert_eq!(err, DomainError::insufficient_stock("apple", 3, 2));
    }

    #[test]
    fn return_of_product_the_shop_never_held_is_insufficient() {
        let mut ledger = ledger_with(&[("apple", 1)], &[]);
        let err = ledger.return_stock(&shop(), "pear", 1).unwrap_err();
        assert_eq!(err, DomainError::insufficient_stock("pear", 1, 0));
    }

    #[test]
    fn return_recreates_a_deleted_warehouse_product() {
        let mut ledger = ledger_with(&[], &[("fig", 4)]);

        ledger.return_stock(&shop(), "fig", 4).unwrap();

        assert_eq!(ledger.warehouse()["fig"], 4);
        assert_eq!(ledger.resolve_warehouse_product("FIG"), Some("fig"));
    }

    #[test]
    fn add_product_rejects_case_insensitive_duplicates() {
        let mut ledger = ledger_with(&[("apple", 1)], &[]);

        let err = ledger.add_product("APPLE", 3).unwrap_err();

        assert_eq!(err, DomainError::conflict("product 'apple' already exists (case-insensitive)"));
        assert_eq!(ledger.add_product("  Pear ", 0).unwrap(), "Pear");
        assert_eq!(ledger.warehouse()["Pear"], 0);
    }

    #[test]
    fn add_product_validates_input() {
        let mut ledger = StockLedger::default();
        assert!(matches!(ledger.add_product("   ", 1), Err(DomainError::Validation(_))));
        assert!(matches!(ledger.add_product("plum", -1), Err(DomainError::Validation(_))));
    }

    #[test]
    fn delete_product_uses_the_stored_key() {
        let mut ledger = ledger_with(&[("Apple", 7)], &[]);

        assert_eq!(ledger.delete_product("apple").unwrap(), ("Apple".to_string(), 7));
        assert!(ledger.warehouse().is_empty());
        assert!(matches!(ledger.delete_product("apple"), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn restock_plan_sees_warehouse_keys_of_other_casing() {
        let ledger = ledger_with(&[("Apple", 8), ("pear", 30)], &[("apple", 3), ("pear", 18), ("fig", 9)]);

        let plan = ledger.restock_plan(&shop(), StockPolicy::default());

        assert_eq!(plan, levels(&[("apple", 8)]));
    }

    #[test]
    fn apply_restock_ships_only_positive_plan_entries() {
        let mut ledger = ledger_with(&[("apple", 8), ("pear", 50)], &[("apple", 3), ("kiwi", 1)]);

        let shipped = ledger.apply_restock(&shop(), StockPolicy::default()).unwrap();

        assert_eq!(shipped, levels(&[("apple", 8)]));
        assert_eq!(ledger.warehouse()["apple"], 0);
        assert_eq!(ledger.shop(&shop()).unwrap()["apple"], 11);
        assert_eq!(ledger.shop(&shop()).unwrap()["kiwi"], 1);
    }

    #[test]
    fn return_overstock_brings_the_shop_down_to_the_ceiling() {
        let mut ledger = ledger_with(&[("apple", 0)], &[("apple", 25), ("pear", 5)]);

        let returned = ledger.return_overstock(&shop(), StockPolicy::default()).unwrap();

        assert_eq!(returned, levels(&[("apple", 5)]));
        assert_eq!(ledger.shop(&shop()).unwrap()["apple"], 20);
        assert_eq!(ledger.warehouse()["apple"], 5);
    }

    #[test]
    fn case_colliding_shop_keys_are_merged_on_load() {
        let ledger = ledger_with(&[("apple", 30)], &[("Apple", 1), ("apple", 1)]);

        assert_eq!(ledger.shop(&shop()), Some(&levels(&[("Apple", 2)])));
        assert_eq!(ledger.restock_plan(&shop(), StockPolicy::default()), levels(&[("Apple", 18)]));
    }

    #[test]
    fn apply_restock_ships_once_for_case_colliding_shop_keys() {
        let mut ledger = ledger_with(&[("apple", 30)], &[("Apple", 1), ("apple", 1)]);

        let shipped = ledger.apply_restock(&shop(), StockPolicy::default()).unwrap();

        assert_eq!(shipped, levels(&[("Apple", 18)]));
        assert_eq!(ledger.warehouse()["apple"], 12);
        assert_eq!(ledger.shop(&shop()), Some(&levels(&[("Apple", 20)])));

        let receipt = ledger.return_stock(&shop(), "apple", 20).unwrap();
        assert_eq!(receipt.shop_quantity, 0);
    }

    #[test]
    fn case_colliding_warehouse_keys_are_merged_on_load() {
        let ledger = ledger_with(&[("Pear", 3), ("pear", 4)], &[]);
        assert_eq!(ledger.warehouse(), &levels(&[("Pear", 7)]));
    }

    #[test]
    fn overflowing_transfers_are_rejected_without_changes() {
        let mut ledger = ledger_with(&[("apple", 5)], &[("apple", i64::MAX)]);

        let err = ledger.fulfill(&shop(), "apple", 1).unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(ledger.warehouse()["apple"], 5);
        assert_eq!(ledger.shop(&shop()).unwrap()["apple"], i64::MAX);

        let mut ledger = ledger_with(&[("apple", i64::MAX)], &[("apple", 3)]);
        let err = ledger.return_stock(&shop(), "apple", 1).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(ledger.shop(&shop()).unwrap()["apple"], 3);
    }

    #[test]
    fn report_for_unknown_shop_is_empty() {
        let ledger = ledger_with(&[("apple", 8)], &[]);
        let report = ledger.report(&ShopId::new("nobody"), StockPolicy::default());
        assert!(report.stock.is_empty());
        assert!(report.low_stock.is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Fulfill(usize, i64),
        Return(usize, i64),
    }

    const PRODUCTS: [&str; 3] = ["apple", "Pear", "fig"];

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..3, 1i64..15).prop_map(|(p, q)| Op::Fulfill(p, q)),
            (0usize..3, 1i64..15).prop_map(|(p, q)| Op::Return(p, q)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: transfers only move units, so the total never changes and
        /// no quantity ever goes negative.
        #[test]
        fn transfers_conserve_units(ops in prop::collection::vec(op_strategy(), 1..40)) {
            let mut ledger = ledger_with(&[("apple", 20), ("Pear", 20), ("fig", 20)], &[]);
            let before = total_units(&ledger);

            for op in ops {
                let _ = match op {
                    Op::Fulfill(p, q) => ledger.fulfill(&shop(), &PRODUCTS[p].to_uppercase(), q),
                    Op::Return(p, q) => ledger.return_stock(&shop(), PRODUCTS[p], q),
                };
            }

            prop_assert_eq!(total_units(&ledger), before);
            prop_assert!(ledger.warehouse().values().all(|q| *q >= 0));
            prop_assert!(ledger.shops().values().flat_map(|s| s.values()).all(|q| *q >= 0));
            prop_assert_eq!(ledger.warehouse().len(), 3);
        }
    }
}

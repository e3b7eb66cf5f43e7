//! Warehouse and shop stock persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use stockroom_core::{DomainResult, ShopId};
use stockroom_inventory::{StockLedger, StockLevels};

use crate::error::StoreError;
use crate::store::json_file::{read_json_or_default, write_json_atomic};

/// Shop identity → that shop's stock.
pub type ShopStock = BTreeMap<ShopId, StockLevels>;

pub const WAREHOUSE_STOCK_FILE: &str = "warehouse_stock.json";
pub const SHOP_STOCK_FILE: &str = "shop_stock.json";

/// Raw whole-document access to the two stock mappings.
///
/// Backends do no locking across calls; [`StockStore`] serializes access.
pub trait StockBackend: Send + Sync {
    fn load_warehouse(&self) -> Result<StockLevels, StoreError>;
    fn save_warehouse(&self, stock: &StockLevels) -> Result<(), StoreError>;
    fn load_shops(&self) -> Result<ShopStock, StoreError>;
    fn save_shops(&self, shops: &ShopStock) -> Result<(), StoreError>;
}

impl<S> StockBackend for Arc<S>
where
    S: StockBackend + ?Sized,
{
    fn load_warehouse(&self) -> Result<StockLevels, StoreError> {
        (**self).load_warehouse()
    }

    fn save_warehouse(&self, stock: &StockLevels) -> Result<(), StoreError> {
        (**self).save_warehouse(stock)
    }

    fn load_shops(&self) -> Result<ShopStock, StoreError> {
        (**self).load_shops()
    }

    fn save_shops(&self, shops: &ShopStock) -> Result<(), StoreError> {
        (**self).save_shops(shops)
    }
}

/// In-memory backend for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryStockBackend {
    warehouse: RwLock<StockLevels>,
    shops: RwLock<ShopStock>,
}

impl InMemoryStockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock(warehouse: StockLevels, shops: ShopStock) -> Self {
        Self {
            warehouse: RwLock::new(warehouse),
            shops: RwLock::new(shops),
        }
    }
}

impl StockBackend for InMemoryStockBackend {
    fn load_warehouse(&self) -> Result<StockLevels, StoreError> {
        let stock = self.warehouse.read().map_err(|_| StoreError::Poisoned)?;
        Ok(stock.clone())
    }

    fn save_warehouse(&self, stock: &StockLevels) -> Result<(), StoreError> {
        let mut current = self.warehouse.write().map_err(|_| StoreError::Poisoned)?;
        *current = stock.clone();
        Ok(())
    }

    fn load_shops(&self) -> Result<ShopStock, StoreError> {
        let shops = self.shops.read().map_err(|_| StoreError::Poisoned)?;
        Ok(shops.clone())
    }

    fn save_shops(&self, shops: &ShopStock) -> Result<(), StoreError> {
        let mut current = self.shops.write().map_err(|_| StoreError::Poisoned)?;
        *current = shops.clone();
        Ok(())
    }
}

/// JSON-file backend: `{product: qty}` and `{shop_id: {product: qty}}`.
#[derive(Debug, Clone)]
pub struct JsonFileStockBackend {
    warehouse_path: PathBuf,
    shops_path: PathBuf,
}

impl JsonFileStockBackend {
    pub fn new(warehouse_path: impl Into<PathBuf>, shops_path: impl Into<PathBuf>) -> Self {
        Self {
            warehouse_path: warehouse_path.into(),
            shops_path: shops_path.into(),
        }
    }

    /// Standard file names inside `data_dir`.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self::new(dir.join(WAREHOUSE_STOCK_FILE), dir.join(SHOP_STOCK_FILE))
    }
}

impl StockBackend for JsonFileStockBackend {
    fn load_warehouse(&self) -> Result<StockLevels, StoreError> {
        read_json_or_default(&self.warehouse_path)
    }

    fn save_warehouse(&self, stock: &StockLevels) -> Result<(), StoreError> {
        write_json_atomic(&self.warehouse_path, stock)
    }

    fn load_shops(&self) -> Result<ShopStock, StoreError> {
        read_json_or_default(&self.shops_path)
    }

    fn save_shops(&self, shops: &ShopStock) -> Result<(), StoreError> {
        write_json_atomic(&self.shops_path, shops)
    }
}

/// Stock persistence with a single-writer lock.
///
/// Every read and every transaction holds the lock, so a load → mutate →
/// save sequence can never interleave with another one.
pub struct StockStore {
    backend: Box<dyn StockBackend>,
    lock: Mutex<()>,
}

impl core::fmt::Debug for StockStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StockStore").finish_non_exhaustive()
    }
}

impl StockStore {
    pub fn new(backend: impl StockBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            lock: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(InMemoryStockBackend::new())
    }

    pub fn json_files(data_dir: impl AsRef<Path>) -> Self {
        Self::new(JsonFileStockBackend::in_dir(data_dir))
    }

    pub fn load_warehouse(&self) -> Result<StockLevels, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        self.backend.load_warehouse()
    }

    pub fn load_shops(&self) -> Result<ShopStock, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        self.backend.load_shops()
    }

    /// One shop's stock; unknown shops have empty stock.
    pub fn load_shop(&self, shop_id: &ShopId) -> Result<StockLevels, StoreError> {
        Ok(self.load_shops()?.remove(shop_id).unwrap_or_default())
    }

    /// Consistent read-only view of both mappings.
    pub fn snapshot(&self) -> Result<StockLedger, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(StockLedger::new(
            self.backend.load_warehouse()?,
            self.backend.load_shops()?,
        ))
    }

    /// Run `f` on a freshly loaded ledger while holding the write lock.
    ///
    /// Changed documents are saved only when `f` returns `Ok`; a domain
    /// rejection leaves storage untouched and comes back as
    /// [`StoreError::Domain`].
    ///
    /// The two documents are written one after the other (warehouse first),
    /// not atomically as a pair. If the shop write fails after the warehouse
    /// write succeeded, the error is returned and logged, and the stored
    /// warehouse already reflects the transfer.
    pub fn transact<T>(
        &self,
        f: impl FnOnce(&mut StockLedger) -> DomainResult<T>,
    ) -> Result<T, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;

        let warehouse = self.backend.load_warehouse()?;
        let shops = self.backend.load_shops()?;
        let mut ledger = StockLedger::new(warehouse.clone(), shops.clone());

        let output = f(&mut ledger)?;

        let (new_warehouse, new_shops) = ledger.into_parts();
        if new_warehouse != warehouse {
            self.backend.save_warehouse(&new_warehouse)?;
        }
        if new_shops != shops {
            if let Err(e) = self.backend.save_shops(&new_shops) {
                if new_warehouse != warehouse {
                    tracing::error!(error = %e, "shop stock not saved after warehouse stock was");
                }
                return Err(e);
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::thread;

    use stockroom_core::DomainError;

    use super::*;

    fn levels(entries: &[(&str, i64)]) -> StockLevels {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn shop() -> ShopId {
        ShopId::new("corner")
    }

    #[test]
    fn transact_persists_a_successful_fulfillment() {
        let store = StockStore::new(InMemoryStockBackend::with_stock(
            levels(&[("apple", 10)]),
            ShopStock::new(),
        ));

        let receipt = store.transact(|ledger| ledger.fulfill(&shop(), "Apple", 5)).unwrap();

        assert_eq!(receipt.shop_quantity, 5);
        assert_eq!(store.load_warehouse().unwrap(), levels(&[("apple", 5)]));
        assert_eq!(store.load_shop(&shop()).unwrap(), levels(&[("apple", 5)]));
    }

    #[test]
    fn transact_rolls_back_on_domain_error() {
        let store = StockStore::new(InMemoryStockBackend::with_stock(
            levels(&[("apple", 10)]),
            ShopStock::new(),
        ));

        let err = store
            .transact(|ledger| {
                ledger.fulfill(&shop(), "apple", 4)?;
                ledger.fulfill(&shop(), "apple", 7)
            })
            .unwrap_err();

        assert!(matches!(err.as_domain(), Some(DomainError::InsufficientStock { .. })));
        assert_eq!(store.load_warehouse().unwrap(), levels(&[("apple", 10)]));
        assert!(store.load_shops().unwrap().is_empty());
    }

    struct ShopWritesFail(InMemoryStockBackend);

    impl StockBackend for ShopWritesFail {
        fn load_warehouse(&self) -> Result<StockLevels, StoreError> {
            self.0.load_warehouse()
        }

        fn save_warehouse(&self, stock: &StockLevels) -> Result<(), StoreError> {
            self.0.save_warehouse(stock)
        }

        fn load_shops(&self) -> Result<ShopStock, StoreError> {
            self.0.load_shops()
        }

        fn save_shops(&self, _shops: &ShopStock) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    #[test]
    fn failed_shop_write_is_reported_after_the_warehouse_write() {
        let store = StockStore::new(ShopWritesFail(InMemoryStockBackend::with_stock(
            levels(&[("apple", 10)]),
            ShopStock::new(),
        )));

        let err = store.transact(|ledger| ledger.fulfill(&shop(), "apple", 4)).unwrap_err();

        assert!(matches!(err, StoreError::Poisoned));
        assert_eq!(store.load_warehouse().unwrap(), levels(&[("apple", 6)]));
        assert!(store.load_shops().unwrap().is_empty());
    }

    #[test]
    fn unknown_shop_loads_as_empty_stock() {
        let store = StockStore::in_memory();
        assert!(store.load_shop(&ShopId::new("ghost")).unwrap().is_empty());
    }

    #[test]
    fn concurrent_transactions_do_not_lose_updates() {
        let store = Arc::new(StockStore::new(InMemoryStockBackend::with_stock(
            levels(&[("apple", 400)]),
            ShopStock::new(),
        )));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let shop_id = ShopId::new(format!("shop-{i}"));
                    for _ in 0..50 {
                        store.transact(|ledger| ledger.fulfill(&shop_id, "apple", 1)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.load_warehouse().unwrap()["apple"], 0);
        let shops = store.load_shops().unwrap();
        assert_eq!(shops.values().map(|s| s["apple"]).sum::<i64>(), 400);
    }

    #[test]
    fn json_files_use_the_documented_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = StockStore::json_files(dir.path());

        store
            .transact(|ledger| {
                ledger.add_product("apple", 10)?;
                ledger.fulfill(&shop(), "apple", 3)
            })
            .unwrap();

        let warehouse: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(WAREHOUSE_STOCK_FILE)).unwrap())
                .unwrap();
        let shops: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(SHOP_STOCK_FILE)).unwrap())
                .unwrap();

        assert_eq!(warehouse, serde_json::json!({ "apple": 7 }));
        assert_eq!(shops, serde_json::json!({ "corner": { "apple": 3 } }));
    }

    #[test]
    fn json_files_are_reloaded_on_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let store = StockStore::json_files(dir.path());
        assert!(store.load_warehouse().unwrap().is_empty());

        fs::write(dir.path().join(WAREHOUSE_STOCK_FILE), r#"{"Pear": 4}"#).unwrap();

        assert_eq!(store.load_warehouse().unwrap(), levels(&[("Pear", 4)]));
    }

    #[test]
    fn read_only_transaction_does_not_create_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = StockStore::json_files(dir.path());

        let plan = store
            .transact(|ledger| Ok(ledger.restock_plan(&shop(), Default::default())))
            .unwrap();

        assert!(plan.is_empty());
        assert!(!dir.path().join(WAREHOUSE_STOCK_FILE).exists());
        assert!(!dir.path().join(SHOP_STOCK_FILE).exists());
    }
}

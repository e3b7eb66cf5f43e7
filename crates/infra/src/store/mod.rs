//! Stock and account storage abstractions.

mod json_file;
pub mod stock;
pub mod users;

pub use stock::{
    InMemoryStockBackend, JsonFileStockBackend, SHOP_STOCK_FILE, ShopStock, StockBackend,
    StockStore, WAREHOUSE_STOCK_FILE,
};
pub use users::{InMemoryUserStore, JsonFileUserStore, USERS_FILE, UserStore, ensure_warehouse_account};

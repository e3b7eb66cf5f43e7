use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;

use stockroom_auth::{Hs256JwtValidator, Hs256TokenIssuer, JwtValidator, Principal, Role};
use stockroom_core::{ShopId, UserId};
use stockroom_infra::store::{
    InMemoryUserStore, JsonFileUserStore, StockStore, UserStore, ensure_warehouse_account,
};
use stockroom_infra::AppConfig;
use stockroom_inventory::StockPolicy;

/// Everything a request handler needs: storage, token handling and policy.
///
/// Built once at startup and shared behind an `Arc`.
pub struct AppContext {
    stock: StockStore,
    users: Arc<dyn UserStore>,
    issuer: Hs256TokenIssuer,
    validator: Arc<dyn JwtValidator>,
    policy: StockPolicy,
    warehouse_username: String,
}

impl AppContext {
    pub fn new(
        stock: StockStore,
        users: Arc<dyn UserStore>,
        jwt_secret: &str,
        token_ttl: Duration,
        policy: StockPolicy,
        warehouse_username: impl Into<String>,
    ) -> Self {
        Self {
            stock,
            users,
            issuer: Hs256TokenIssuer::new(jwt_secret, token_ttl),
            validator: Arc::new(Hs256JwtValidator::new(jwt_secret)),
            policy,
            warehouse_username: warehouse_username.into(),
        }
    }

    /// JSON-file storage under `config.data_dir`, with the warehouse account seeded.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let policy = config.policy()?;
        let token_ttl = Duration::try_minutes(config.token_ttl_minutes)
            .context("token_ttl_minutes is out of range")?;
        let users: Arc<dyn UserStore> = Arc::new(JsonFileUserStore::in_dir(&config.data_dir));
        ensure_warehouse_account(
            users.as_ref(),
            &config.warehouse_username,
            &config.warehouse_password,
        )
        .context("failed to seed the warehouse account")?;

        tracing::info!(data_dir = %config.data_dir.display(), "using JSON file storage");

        Ok(Self::new(
            StockStore::json_files(&config.data_dir),
            users,
            &config.jwt_secret,
            token_ttl,
            policy,
            config.warehouse_username.clone(),
        ))
    }

    /// In-memory storage with a seeded warehouse account (tests/dev).
    pub fn in_memory(
        jwt_secret: &str,
        stock: StockStore,
        warehouse_username: &str,
        warehouse_password: &str,
    ) -> anyhow::Result<Self> {
        let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
        ensure_warehouse_account(users.as_ref(), warehouse_username, warehouse_password)?;
        Ok(Self::new(
            stock,
            users,
            jwt_secret,
            Duration::minutes(60),
            StockPolicy::default(),
            warehouse_username,
        ))
    }

    pub fn stock(&self) -> &StockStore {
        &self.stock
    }

    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    pub fn issuer(&self) -> &Hs256TokenIssuer {
        &self.issuer
    }

    pub fn validator(&self) -> Arc<dyn JwtValidator> {
        Arc::clone(&self.validator)
    }

    pub fn policy(&self) -> StockPolicy {
        self.policy
    }

    pub fn warehouse_username(&self) -> &str {
        &self.warehouse_username
    }
}

/// Principal context for a request (authenticated identity + role).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id
    }

    pub fn username(&self) -> &str {
        &self.principal.username
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    pub fn shop_id(&self) -> Option<ShopId> {
        self.principal.shop_id()
    }
}

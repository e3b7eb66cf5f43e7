//! Account persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use stockroom_auth::{AccountError, Role, UserAccount};
use stockroom_core::DomainError;

use crate::error::StoreError;
use crate::store::json_file::{read_json_or_default, write_json_atomic};

pub const USERS_FILE: &str = "users.json";

/// Account storage keyed by username (case-sensitive, unique).
pub trait UserStore: Send + Sync {
    fn find(&self, username: &str) -> Result<Option<UserAccount>, StoreError>;

    /// Insert a new account; an existing username is a [`DomainError::Conflict`].
    fn insert(&self, account: UserAccount) -> Result<(), StoreError>;

    /// All accounts ordered by username.
    fn list(&self) -> Result<Vec<UserAccount>, StoreError>;
}

impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    fn find(&self, username: &str) -> Result<Option<UserAccount>, StoreError> {
        (**self).find(username)
    }

    fn insert(&self, account: UserAccount) -> Result<(), StoreError> {
        (**self).insert(account)
    }

    fn list(&self) -> Result<Vec<UserAccount>, StoreError> {
        (**self).list()
    }
}

fn duplicate(username: &str) -> StoreError {
    DomainError::conflict(format!("username '{username}' already taken")).into()
}

/// In-memory account store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<BTreeMap<String, UserAccount>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn find(&self, username: &str) -> Result<Option<UserAccount>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(username).cloned())
    }

    fn insert(&self, account: UserAccount) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if map.contains_key(&account.username) {
            return Err(duplicate(&account.username));
        }
        map.insert(account.username.clone(), account);
        Ok(())
    }

    fn list(&self) -> Result<Vec<UserAccount>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.values().cloned().collect())
    }
}

/// JSON-file account store (`users.json`, a list of account records).
#[derive(Debug)]
pub struct JsonFileUserStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileUserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(USERS_FILE))
    }

    fn read_all(&self) -> Result<Vec<UserAccount>, StoreError> {
        read_json_or_default(&self.path)
    }
}

impl UserStore for JsonFileUserStore {
    fn find(&self, username: &str) -> Result<Option<UserAccount>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.read_all()?.into_iter().find(|a| a.username == username))
    }

    fn insert(&self, account: UserAccount) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut accounts = self.read_all()?;
        if accounts.iter().any(|a| a.username == account.username) {
            return Err(duplicate(&account.username));
        }
        accounts.push(account);
        accounts.sort_by(|a, b| a.username.cmp(&b.username));
        write_json_atomic(&self.path, &accounts)
    }

    fn list(&self) -> Result<Vec<UserAccount>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut accounts = self.read_all()?;
        accounts.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(accounts)
    }
}

/// Create the warehouse account unless it already exists.
///
/// Returns `true` when an account was created. A non-warehouse account
/// already holding `username` is a [`DomainError::Conflict`].
pub fn ensure_warehouse_account(
    users: &dyn UserStore,
    username: &str,
    password: &str,
) -> Result<bool, StoreError> {
    if let Some(existing) = users.find(username)? {
        if existing.role != Role::Warehouse {
            tracing::error!(username, role = %existing.role, "warehouse username held by another account");
            return Err(DomainError::conflict(format!(
                "username '{username}' belongs to a {} account",
                existing.role
            ))
            .into());
        }
        return Ok(false);
    }
    let account = UserAccount::register(username, password, Role::Warehouse).map_err(|e| match e {
        AccountError::Domain(d) => StoreError::Domain(d),
        AccountError::Password(p) => DomainError::validation(p.to_string()).into(),
    })?;
    users.insert(account)?;
    tracing::info!(username, "seeded warehouse account");
    Ok(true)
}

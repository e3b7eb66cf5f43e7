//! User accounts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_core::{DomainError, ShopId, UserId};

use crate::password::{PasswordError, hash_password, verify_password};
use crate::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Stored account record. Only the argon2 hash of the password is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Public view of an account (no credentials).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl UserAccount {
    pub fn register(username: &str, password: &str, role: Role) -> Result<Self, AccountError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(DomainError::validation("username cannot be empty").into());
        }
        if username.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("username cannot contain whitespace").into());
        }
        Ok(Self {
            id: UserId::new(),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            role,
        })
    }

    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }

    /// Shop operated by this account, if it is a shop account.
    pub fn shop_id(&self) -> Option<ShopId> {
        match self.role {
            Role::Shop => Some(ShopId::new(self.username.clone())),
            Role::Warehouse => None,
        }
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_account_verifies_its_password() {
        let account = UserAccount::register(" corner ", "pw", Role::Shop).unwrap();
        assert_eq!(account.username, "corner");
        assert!(account.verify_password("pw"));
        assert!(!account.verify_password("PW"));
        assert_eq!(account.shop_id(), Some(ShopId::new("corner")));
    }

    #[test]
    fn warehouse_account_has_no_shop() {
        let account = UserAccount::register("warehouse", "pw", Role::Warehouse).unwrap();
        assert_eq!(account.shop_id(), None);
    }

    #[test]
    fn invalid_usernames_and_passwords_are_rejected() {
        assert!(matches!(
            UserAccount::register("", "pw", Role::Shop),
            Err(AccountError::Domain(DomainError::Validation(_)))
        ));
        assert!(matches!(
            UserAccount::register("two words", "pw", Role::Shop),
            Err(AccountError::Domain(DomainError::Validation(_)))
        ));
        assert_eq!(
            UserAccount::register("corner", "", Role::Shop),
            Err(AccountError::Password(PasswordError::Empty))
        );
    }
}

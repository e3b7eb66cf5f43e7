use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockroom_core::DomainError;

/// Role of an account.
///
/// There is exactly one warehouse account; every other account operates a shop.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Warehouse,
    Shop,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Warehouse => "warehouse",
            Role::Shop => "shop",
        }
    }

    /// Role for `username`, given the configured warehouse account name.
    pub fn for_username(username: &str, warehouse_username: &str) -> Self {
        if username == warehouse_username {
            Role::Warehouse
        } else {
            Role::Shop
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warehouse" => Ok(Role::Warehouse),
            "shop" => Ok(Role::Shop),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}

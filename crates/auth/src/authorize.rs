use thiserror::Error;

use stockroom_core::{ShopId, UserId};

use crate::claims::JwtClaims;
use crate::Role;

/// Authenticated principal for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

impl Principal {
    /// Shop the principal operates, if it is a shop account.
    pub fn shop_id(&self) -> Option<ShopId> {
        match self.role {
            Role::Shop => Some(ShopId::new(self.username.clone())),
            Role::Warehouse => None,
        }
    }
}

impl From<&JwtClaims> for Principal {
    fn from(claims: &JwtClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username.clone(),
            role: claims.role,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: requires role '{0}'")]
    Forbidden(Role),
}

/// Require `principal` to hold `required`.
///
/// - No IO
/// - No panics
pub fn authorize(principal: &Principal, required: Role) -> Result<(), AuthzError> {
    if principal.role == required {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required))
    }
}

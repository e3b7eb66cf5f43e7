//! `stockroom-auth` — authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod account;
pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod roles;

pub use account::{AccountError, AccountSummary, UserAccount};
pub use authorize::{AuthzError, Principal, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, Hs256TokenIssuer, JwtValidator, TokenIssueError};
pub use password::{PasswordError, hash_password, verify_password};
pub use roles::Role;

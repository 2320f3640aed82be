//! Auth roles and entries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of caller roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthRole {
    /// Full access
    Admin,
    /// Scoped to one shop
    Shop,
    /// Till operations
    Cashier,
    /// Customer, scoped to their own uid
    Anonymous,
}

impl AuthRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AuthRole::Admin => "ADMIN",
            AuthRole::Shop => "SHOP",
            AuthRole::Cashier => "CASHIER",
            AuthRole::Anonymous => "ANONYMOUS",
        }
    }
}

impl fmt::Display for AuthRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for role strings outside the closed set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for AuthRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(AuthRole::Admin),
            "SHOP" => Ok(AuthRole::Shop),
            "CASHIER" => Ok(AuthRole::Cashier),
            "ANONYMOUS" => Ok(AuthRole::Anonymous),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Stored role assignment for one user id
///
/// `shop_id` is present only for the SHOP role; the grant operation
/// rejects a SHOP grant without it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEntry {
    pub uid: String,
    pub auth_type: AuthRole,
    pub shop_id: Option<String>,
}

impl AuthEntry {
    /// Implicit entry for a uid with no stored grant
    pub fn anonymous(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            auth_type: AuthRole::Anonymous,
            shop_id: None,
        }
    }
}

//! Permission gate
//!
//! Role storage and checking. Identity verification itself is an
//! external collaborator behind [`verifier::IdentityVerifier`]; this
//! module owns the uid -> role mapping and the authorization rule.

pub mod verifier;

pub use verifier::{IdentityVerifier, StaticTokenVerifier};

use crate::store::HallStore;
use shared::models::{AuthEntry, AuthRole};
use shared::{AppError, AppResult, ErrorCode};
use tracing::info;

#[derive(Clone)]
pub struct PermissionGate {
    store: HallStore,
}

impl PermissionGate {
    pub fn new(store: HallStore) -> Self {
        Self { store }
    }

    /// Resolve the stored entry for a uid.
    ///
    /// A uid with no stored grant is an anonymous customer scoped to
    /// itself, not an error.
    pub fn entry(&self, uid: &str) -> AppResult<AuthEntry> {
        Ok(self
            .store
            .get_auth_entry(uid)?
            .unwrap_or_else(|| AuthEntry::anonymous(uid)))
    }

    /// Pure membership test: the caller's role must be in the required set
    pub fn authorize(entry: &AuthEntry, required: &[AuthRole]) -> bool {
        required.contains(&entry.auth_type)
    }

    /// [`Self::authorize`] as a guard returning `PermissionDenied`
    pub fn require(entry: &AuthEntry, required: &[AuthRole]) -> AppResult<()> {
        if Self::authorize(entry, required) {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "Role {} is not allowed here",
                entry.auth_type
            )))
        }
    }

    /// Grant a role to a uid, creating or replacing its entry.
    ///
    /// SHOP without a shop id is a validation error, never a silent
    /// default; other roles carry no shop id.
    pub fn grant(&self, target_uid: &str, role: &str, shop_id: Option<String>) -> AppResult<AuthEntry> {
        let role: AuthRole = role
            .parse()
            .map_err(|err: shared::models::auth::UnknownRole| {
                AppError::with_message(ErrorCode::InvalidRole, err.to_string())
            })?;

        let shop_id = match role {
            AuthRole::Shop => Some(shop_id.ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ShopIdRequired,
                    format!("SHOP grant for {target_uid} is missing its shop id"),
                )
            })?),
            _ => None,
        };

        let entry = AuthEntry {
            uid: target_uid.to_string(),
            auth_type: role,
            shop_id,
        };
        self.store.put_auth_entry(&entry)?;

        info!(uid = %target_uid, role = %role, "Role granted");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> (PermissionGate, HallStore) {
        let store = HallStore::open_in_memory().unwrap();
        (PermissionGate::new(store.clone()), store)
    }

    #[test]
    fn test_unknown_uid_is_anonymous() {
        let (gate, _store) = gate();
        let entry = gate.entry("stranger").unwrap();
        assert_eq!(entry.auth_type, AuthRole::Anonymous);
        assert_eq!(entry.uid, "stranger");
    }

    #[test]
    fn test_authorize_membership() {
        let admin = AuthEntry {
            uid: "u-1".to_string(),
            auth_type: AuthRole::Admin,
            shop_id: None,
        };
        let cashier = AuthEntry {
            uid: "u-2".to_string(),
            auth_type: AuthRole::Cashier,
            shop_id: None,
        };

        assert!(PermissionGate::authorize(&admin, &[AuthRole::Admin]));
        assert!(PermissionGate::authorize(
            &cashier,
            &[AuthRole::Cashier, AuthRole::Admin]
        ));
        assert!(!PermissionGate::authorize(&cashier, &[AuthRole::Admin]));
        assert!(PermissionGate::require(&cashier, &[AuthRole::Admin]).is_err());
    }

    #[test]
    fn test_grant_shop_requires_shop_id() {
        let (gate, store) = gate();

        let err = gate.grant("u-1", "SHOP", None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ShopIdRequired);

        // Nothing was written
        assert!(store.get_auth_entry("u-1").unwrap().is_none());

        let entry = gate
            .grant("u-1", "SHOP", Some("shop-a".to_string()))
            .unwrap();
        assert_eq!(entry.shop_id.as_deref(), Some("shop-a"));
    }

    #[test]
    fn test_grant_rejects_unknown_role() {
        let (gate, _store) = gate();
        let err = gate.grant("u-1", "MANAGER", None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRole);
    }

    #[test]
    fn test_grant_non_shop_drops_shop_id() {
        let (gate, _store) = gate();
        let entry = gate
            .grant("u-1", "CASHIER", Some("shop-a".to_string()))
            .unwrap();
        assert_eq!(entry.auth_type, AuthRole::Cashier);
        assert!(entry.shop_id.is_none());
    }

    #[test]
    fn test_grant_updates_in_place() {
        let (gate, _store) = gate();
        gate.grant("u-1", "CASHIER", None).unwrap();
        gate.grant("u-1", "ADMIN", None).unwrap();

        let entry = gate.entry("u-1").unwrap();
        assert_eq!(entry.auth_type, AuthRole::Admin);
    }
}

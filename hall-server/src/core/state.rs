//! Shared application state
//!
//! One `AppState` is built at startup and cloned into every handler.
//! Services share the same store handle; cloning is cheap (Arc inside).

use crate::auth::{IdentityVerifier, PermissionGate};
use crate::barcode::BarcodeResolver;
use crate::notify::Notifier;
use crate::sessions::SessionManager;
use crate::store::{HallStore, StorageResult};
use crate::tickets::TicketService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: HallStore,
    pub sessions: Arc<SessionManager>,
    pub tickets: TicketService,
    pub barcode: BarcodeResolver,
    pub gate: PermissionGate,
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub fn new(
        store: HallStore,
        verifier: Arc<dyn IdentityVerifier>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new(store.clone(), notifier.clone())),
            tickets: TicketService::new(store.clone(), notifier),
            barcode: BarcodeResolver::new(store.clone()),
            gate: PermissionGate::new(store.clone()),
            verifier,
            store,
        }
    }

    /// In-memory state for tests and demos
    pub fn in_memory(
        verifier: Arc<dyn IdentityVerifier>,
        notifier: Arc<dyn Notifier>,
    ) -> StorageResult<Self> {
        Ok(Self::new(HallStore::open_in_memory()?, verifier, notifier))
    }
}

//! Notification dispatch boundary
//!
//! The core invokes this after a ticket's status changes. Delivery
//! (push, e-mail) lives behind the [`Notifier`] trait; dispatch is
//! fire-and-forget; a failed delivery is logged and never blocks the
//! state change that triggered it.

use async_trait::async_trait;
use shared::AppResult;
use std::sync::Arc;
use tracing::{info, warn};

/// One outbound notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub recipient_uid: String,
    pub title: String,
    pub body: String,
    pub click_url: Option<String>,
}

/// External delivery collaborator (push / e-mail)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> AppResult<()>;
}

/// Default notifier: writes the notification to the log
///
/// Stands in for the push/e-mail collaborator in development and tests.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> AppResult<()> {
        info!(
            recipient = %notification.recipient_uid,
            title = %notification.title,
            body = %notification.body,
            "Notification dispatched"
        );
        Ok(())
    }
}

/// Dispatch a notification without blocking the caller.
///
/// Must run inside a tokio runtime (all call sites are async service
/// methods). Failures are logged with the recipient for follow-up.
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: Notification) {
    tokio::spawn(async move {
        if let Err(err) = notifier.notify(&notification).await {
            warn!(
                recipient = %notification.recipient_uid,
                error = %err,
                "Notification delivery failed"
            );
        }
    });
}

//! Ticket domain: sequencing, issuance, and lifecycle
//!
//! The sequencer and issuer run inside the settlement transaction; the
//! service here covers everything after issuance: status updates driven
//! by shop staff, ticket listings for tills and customers, and shop
//! sequence provisioning.

pub mod issuer;
pub mod sequencer;

pub use issuer::TicketIssuer;
pub use sequencer::TicketSequencer;

use crate::inventory::InventoryLedger;
use crate::notify::{self, Notification, Notifier};
use crate::store::HallStore;
use shared::models::{Ticket, TicketNumConfig, TicketNumInfo, TicketStatus};
use shared::util::now_millis;
use shared::{AppError, AppResult, ErrorCode};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct TicketService {
    store: HallStore,
    ledger: InventoryLedger,
    notifier: Arc<dyn Notifier>,
}

impl TicketService {
    pub fn new(store: HallStore, notifier: Arc<dyn Notifier>) -> Self {
        let ledger = InventoryLedger::new(store.clone());
        Self {
            store,
            ledger,
            notifier,
        }
    }

    /// Provision (or re-provision) a shop's ticket sequence.
    ///
    /// `start_num` is the number the NEXT ticket follows: starting at 0
    /// makes the first issued ticket "1" (or "A-1" with leading "A-").
    pub fn provision_shop(
        &self,
        shop_id: &str,
        start_num: u64,
        leading: Option<String>,
    ) -> AppResult<()> {
        let last_ticket_num = match &leading {
            Some(prefix) => format!("{prefix}{start_num}"),
            None => start_num.to_string(),
        };
        let info = TicketNumInfo {
            last_ticket_num,
            ticket_num_config: leading.map(|l| TicketNumConfig {
                ticket_num_leading: l,
            }),
        };
        self.store.put_sequence(shop_id, &info)?;
        info!(shop_id = %shop_id, start = start_num, "Ticket sequence provisioned");
        Ok(())
    }

    pub fn get(&self, ticket_id: &str) -> AppResult<Ticket> {
        self.store.get_ticket(ticket_id)?.ok_or_else(|| {
            AppError::with_message(
                ErrorCode::TicketNotFound,
                format!("Ticket {ticket_id} not found"),
            )
        })
    }

    /// Advance a ticket along Issued -> Preparing -> Ready -> Delivered.
    ///
    /// Illegal moves are conflicts, not silently reordered. Delivery
    /// clears the ticket's goods from the waiting counts. The customer is
    /// notified after the write commits; delivery failures never undo the
    /// status change.
    pub async fn update_status(&self, ticket_id: &str, next: TicketStatus) -> AppResult<Ticket> {
        let txn = self.store.begin_write()?;

        let mut ticket = self.store.get_ticket_txn(&txn, ticket_id)?.ok_or_else(|| {
            AppError::with_message(
                ErrorCode::TicketNotFound,
                format!("Ticket {ticket_id} not found"),
            )
        })?;

        if !ticket.status.can_transition_to(next) {
            return Err(AppError::with_message(
                ErrorCode::InvalidStatusTransition,
                format!("Cannot move ticket from {:?} to {:?}", ticket.status, next),
            )
            .with_detail("ticket_id", ticket_id));
        }

        ticket.status = next;
        ticket.last_status_updated = now_millis();
        self.store.put_ticket_txn(&txn, &ticket)?;

        if next == TicketStatus::Delivered {
            self.ledger.sub_waiting(&txn, &ticket.order_data)?;
        }

        txn.commit().map_err(crate::store::StorageError::from)?;

        info!(
            ticket_id = %ticket.unique_id,
            ticket_num = %ticket.ticket_num,
            status = ?ticket.status,
            "Ticket status updated"
        );

        notify::dispatch(
            self.notifier.clone(),
            Notification {
                recipient_uid: ticket.customer_id.clone(),
                title: format!("Ticket {}", ticket.ticket_num),
                body: status_message(next, &ticket.ticket_num),
                click_url: None,
            },
        );

        Ok(ticket)
    }

    /// Tickets for a shop's board; delivered tickets are filtered out
    /// unless asked for
    pub fn list_shop_tickets(
        &self,
        shop_id: &str,
        include_delivered: bool,
    ) -> AppResult<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self
            .store
            .list_tickets()?
            .into_iter()
            .filter(|t| t.shop_id == shop_id)
            .filter(|t| include_delivered || t.status != TicketStatus::Delivered)
            .collect();
        tickets.sort_by_key(|t| t.issue_time);
        Ok(tickets)
    }

    /// All tickets belonging to one customer
    pub fn list_customer_tickets(&self, customer_id: &str) -> AppResult<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self
            .store
            .list_tickets()?
            .into_iter()
            .filter(|t| t.customer_id == customer_id)
            .collect();
        tickets.sort_by_key(|t| t.issue_time);
        Ok(tickets)
    }
}

fn status_message(status: TicketStatus, ticket_num: &str) -> String {
    match status {
        TicketStatus::Issued => format!("Ticket {ticket_num} has been issued"),
        TicketStatus::Preparing => format!("Ticket {ticket_num} is being prepared"),
        TicketStatus::Ready => format!("Ticket {ticket_num} is ready for pickup"),
        TicketStatus::Delivered => format!("Ticket {ticket_num} has been delivered"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LogNotifier;
    use shared::models::{InventoryRecord, OrderLine};

    fn service() -> (TicketService, HallStore) {
        let store = HallStore::open_in_memory().unwrap();
        (
            TicketService::new(store.clone(), Arc::new(LogNotifier)),
            store,
        )
    }

    fn issued_ticket(store: &HallStore, unique_id: &str, shop_id: &str) -> Ticket {
        let now = now_millis();
        let ticket = Ticket {
            unique_id: unique_id.to_string(),
            shop_id: shop_id.to_string(),
            customer_id: "c-1".to_string(),
            ticket_num: "1".to_string(),
            order_data: vec![OrderLine::new("g1", 2)],
            status: TicketStatus::Issued,
            issue_time: now,
            payment_session_id: "s-1".to_string(),
            last_status_updated: now,
        };
        store.put_ticket(&ticket).unwrap();
        ticket
    }

    #[test]
    fn test_provision_shop_plain() {
        let (service, store) = service();
        service.provision_shop("shop-a", 0, None).unwrap();

        let info = store.get_sequence("shop-a").unwrap().unwrap();
        assert_eq!(info.last_ticket_num, "0");
        assert!(info.ticket_num_config.is_none());
    }

    #[test]
    fn test_provision_shop_with_leading() {
        let (service, store) = service();
        service
            .provision_shop("shop-a", 100, Some("A-".to_string()))
            .unwrap();

        let info = store.get_sequence("shop-a").unwrap().unwrap();
        assert_eq!(info.last_ticket_num, "A-100");
        assert_eq!(
            info.ticket_num_config.unwrap().ticket_num_leading,
            "A-"
        );
    }

    #[tokio::test]
    async fn test_update_status_happy_path() {
        let (service, store) = service();
        issued_ticket(&store, "t-1", "shop-a");

        let ticket = service
            .update_status("t-1", TicketStatus::Preparing)
            .await
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Preparing);

        let ticket = service.update_status("t-1", TicketStatus::Ready).await.unwrap();
        assert_eq!(ticket.status, TicketStatus::Ready);
    }

    #[tokio::test]
    async fn test_update_status_rejects_skip() {
        let (service, store) = service();
        issued_ticket(&store, "t-1", "shop-a");

        let err = service
            .update_status("t-1", TicketStatus::Delivered)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);

        // Unchanged
        assert_eq!(service.get("t-1").unwrap().status, TicketStatus::Issued);
    }

    #[tokio::test]
    async fn test_update_status_missing_ticket() {
        let (service, _store) = service();
        let err = service
            .update_status("ghost", TicketStatus::Preparing)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TicketNotFound);
    }

    #[tokio::test]
    async fn test_delivery_clears_waiting_count() {
        let (service, store) = service();
        issued_ticket(&store, "t-1", "shop-a");

        let mut record = InventoryRecord::counted("g1", 5);
        record.waiting_count = 2;
        store.put_inventory(&record).unwrap();

        service.update_status("t-1", TicketStatus::Preparing).await.unwrap();
        service.update_status("t-1", TicketStatus::Ready).await.unwrap();
        assert_eq!(store.get_inventory("g1").unwrap().unwrap().waiting_count, 2);

        service.update_status("t-1", TicketStatus::Delivered).await.unwrap();
        assert_eq!(store.get_inventory("g1").unwrap().unwrap().waiting_count, 0);
    }

    #[test]
    fn test_list_shop_tickets_filters_delivered() {
        let (service, store) = service();
        issued_ticket(&store, "t-1", "shop-a");
        let mut delivered = issued_ticket(&store, "t-2", "shop-a");
        delivered.status = TicketStatus::Delivered;
        store.put_ticket(&delivered).unwrap();
        issued_ticket(&store, "t-3", "shop-b");

        let active = service.list_shop_tickets("shop-a", false).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].unique_id, "t-1");

        let all = service.list_shop_tickets("shop-a", true).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_list_customer_tickets() {
        let (service, store) = service();
        issued_ticket(&store, "t-1", "shop-a");
        let mut other = issued_ticket(&store, "t-2", "shop-b");
        other.customer_id = "c-2".to_string();
        store.put_ticket(&other).unwrap();

        let mine = service.list_customer_tickets("c-1").unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].unique_id, "t-1");
    }
}

//! SessionManager - payment session lifecycle
//!
//! # Settlement Flow
//!
//! ```text
//! settle(session_id, staff, paid)
//!     ├─ 1. Begin write transaction
//!     ├─ 2. Load session (NotFound if absent)
//!     ├─ 3. Reject if already PAID
//!     ├─ 4. Re-check inventory sufficiency in-txn
//!     ├─ 5. Reject on paid amount != frozen total
//!     ├─ 6. Reserve inventory (atomic check-and-decrement)
//!     ├─ 7. Mint one ticket per shop via the issuer
//!     ├─ 8. Record waiting counts
//!     ├─ 9. Write session PAID with paid detail + ticket ids
//!     ├─ 10. Commit (any earlier failure drops the txn, nothing sticks)
//!     └─ 11. Dispatch issue notifications (fire-and-forget)
//! ```
//!
//! Reservation, minting, and the state flip share one transaction, so a
//! partial mint can never leave reserved stock or a half-paid session
//! behind.

use crate::inventory::InventoryLedger;
use crate::notify::{self, Notification, Notifier};
use crate::pricing::OrderPricer;
use crate::store::{HallStore, StorageError};
use crate::tickets::TicketIssuer;
use shared::models::{OrderLine, PaidDetail, PaidInput, PaymentSession, SessionState};
use shared::util::{now_millis, random_id};
use shared::{AppError, AppResult};
use std::sync::Arc;
use tracing::{info, warn};

/// Bounded retries for the random session id collision loop
const MAX_ID_ATTEMPTS: usize = 8;

pub struct SessionManager {
    store: HallStore,
    ledger: InventoryLedger,
    pricer: OrderPricer,
    issuer: TicketIssuer,
    notifier: Arc<dyn Notifier>,
}

impl SessionManager {
    pub fn new(store: HallStore, notifier: Arc<dyn Notifier>) -> Self {
        let ledger = InventoryLedger::new(store.clone());
        let pricer = OrderPricer::new(store.clone());
        let issuer = TicketIssuer::new(store.clone());
        Self {
            store,
            ledger,
            pricer,
            issuer,
            notifier,
        }
    }

    /// Create an UNPAID session for a submitted order.
    ///
    /// The total is computed once here and frozen; later price changes do
    /// not affect what settlement accepts.
    pub async fn create(&self, customer_id: &str, order: Vec<OrderLine>) -> AppResult<String> {
        validate_order(&order)?;

        // 1. All lines must be available right now
        let check = self.ledger.check_order(&order);
        if !check.all_sufficient {
            return Err(AppError::items_gone(check.insufficient_ids()));
        }

        // 2. Freeze the total
        let total_amount = self.pricer.price(&order)?;

        // 3. Fresh collision-checked id
        let session_id = self.allocate_session_id()?;

        // 4. Persist
        let session = PaymentSession {
            session_id: session_id.clone(),
            customer_id: customer_id.to_string(),
            order_content: order,
            total_amount,
            state: SessionState::Unpaid,
            paid_detail: None,
            ticket_ids: vec![],
            created_at: now_millis(),
        };
        self.store.put_session(&session)?;

        info!(
            session_id = %session_id,
            customer_id = %customer_id,
            total = total_amount,
            "Payment session created"
        );
        Ok(session_id)
    }

    /// Settle a session: collect money, reserve stock, mint tickets.
    ///
    /// Not idempotent: the second call on a settled session is
    /// rejected with `SessionAlreadyPaid`, never silently accepted.
    pub async fn settle(
        &self,
        session_id: &str,
        staff_uid: &str,
        paid: PaidInput,
    ) -> AppResult<Vec<String>> {
        let txn = self.store.begin_write()?;

        // Load and gate state inside the transaction: a concurrent settle
        // that committed first is seen here
        let mut session = self
            .store
            .get_session_txn(&txn, session_id)?
            .ok_or_else(|| {
                AppError::with_message(
                    shared::ErrorCode::SessionNotFound,
                    format!("Payment session {session_id} not found"),
                )
            })?;

        if session.is_paid() {
            return Err(AppError::already_paid(session_id));
        }

        // Stock may have moved since creation
        let check = self.ledger.check_order_txn(&txn, &session.order_content);
        if !check.all_sufficient {
            let gone = check.insufficient_ids();
            warn!(
                session_id = %session_id,
                goods_ids = ?gone,
                "Settlement rejected, items gone since creation"
            );
            return Err(AppError::items_gone(gone));
        }

        // Exact equality against the frozen total, no tolerance
        if paid.paid_amount != session.total_amount {
            return Err(AppError::wrong_amount(session.total_amount, paid.paid_amount));
        }

        self.ledger.reserve(&txn, &session.order_content)?;

        let tickets = self.issuer.issue(&txn, &session.customer_id, &session)?;
        let ticket_ids: Vec<String> = tickets.iter().map(|t| t.unique_id.clone()).collect();

        self.ledger.add_waiting(&txn, &session.order_content)?;

        session.state = SessionState::Paid;
        session.paid_detail = Some(PaidDetail {
            payment_id: uuid::Uuid::new_v4().to_string(),
            payment_staff_id: staff_uid.to_string(),
            customer_id: session.customer_id.clone(),
            paid_time: now_millis(),
            paid_amount: paid.paid_amount,
            paid_means: paid.paid_means,
            remark: paid.remark,
        });
        session.ticket_ids = ticket_ids.clone();
        self.store.put_session_txn(&txn, &session)?;

        txn.commit().map_err(StorageError::from)?;

        info!(
            session_id = %session_id,
            staff = %staff_uid,
            tickets = ticket_ids.len(),
            "Session settled"
        );

        for ticket in &tickets {
            notify::dispatch(
                self.notifier.clone(),
                Notification {
                    recipient_uid: ticket.customer_id.clone(),
                    title: format!("Ticket {}", ticket.ticket_num),
                    body: format!("Ticket {} has been issued", ticket.ticket_num),
                    click_url: None,
                },
            );
        }

        Ok(ticket_ids)
    }

    /// Read a session back
    pub async fn get(&self, session_id: &str) -> AppResult<PaymentSession> {
        self.store.get_session(session_id)?.ok_or_else(|| {
            AppError::with_message(
                shared::ErrorCode::SessionNotFound,
                format!("Payment session {session_id} not found"),
            )
        })
    }

    /// Random candidate, check-then-use, bounded retries.
    ///
    /// Collisions are astronomically unlikely at this id size; the loop
    /// is a guard, not a mutual-exclusion mechanism.
    fn allocate_session_id(&self) -> AppResult<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = random_id();
            if !self.store.session_exists(&candidate)? {
                return Ok(candidate);
            }
            warn!(candidate = %candidate, "Session id collision, retrying");
        }
        Err(AppError::internal("Failed to allocate a session id"))
    }
}

fn validate_order(order: &[OrderLine]) -> AppResult<()> {
    if order.is_empty() {
        return Err(AppError::new(shared::ErrorCode::SessionEmptyOrder));
    }
    for line in order {
        if line.count <= 0 {
            return Err(AppError::validation("line count must be positive")
                .with_detail("goods_id", line.goods_id.clone())
                .with_detail("count", line.count));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LogNotifier;
    use shared::ErrorCode;
    use shared::models::{Good, InventoryRecord, Stock, TicketNumInfo, TicketStatus};

    fn good(goods_id: &str, shop_id: &str, price: i64) -> Good {
        Good {
            goods_id: goods_id.to_string(),
            shop_id: shop_id.to_string(),
            name: goods_id.to_string(),
            price,
            description: None,
            image_url: None,
        }
    }

    fn plain_seq(start: u64) -> TicketNumInfo {
        TicketNumInfo {
            last_ticket_num: start.to_string(),
            ticket_num_config: None,
        }
    }

    /// One shop, one counted good: g1 @ 300, stock 5, sequence at 0
    fn manager_with_shop_a() -> (SessionManager, HallStore) {
        let store = HallStore::open_in_memory().unwrap();
        store.put_goods(&good("g1", "shop-a", 300)).unwrap();
        store.put_inventory(&InventoryRecord::counted("g1", 5)).unwrap();
        store.put_sequence("shop-a", &plain_seq(0)).unwrap();
        (
            SessionManager::new(store.clone(), Arc::new(LogNotifier)),
            store,
        )
    }

    fn paid(amount: i64) -> PaidInput {
        PaidInput {
            paid_amount: amount,
            paid_means: "CASH".to_string(),
            remark: None,
        }
    }

    #[tokio::test]
    async fn test_create_freezes_total() {
        let (manager, store) = manager_with_shop_a();

        let session_id = manager
            .create("c-1", vec![OrderLine::new("g1", 2)])
            .await
            .unwrap();

        let session = store.get_session(&session_id).unwrap().unwrap();
        assert_eq!(session.total_amount, 600);
        assert_eq!(session.state, SessionState::Unpaid);
        assert!(session.paid_detail.is_none());

        // Creation does not touch stock
        let record = store.get_inventory("g1").unwrap().unwrap();
        assert_eq!(record.stock, Stock::RemainCount(5));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_order() {
        let (manager, _store) = manager_with_shop_a();
        let err = manager.create("c-1", vec![]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionEmptyOrder);
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_count() {
        let (manager, _store) = manager_with_shop_a();
        let err = manager
            .create("c-1", vec![OrderLine::new("g1", 0)])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_create_rejects_insufficient_stock() {
        let (manager, _store) = manager_with_shop_a();
        let err = manager
            .create("c-1", vec![OrderLine::new("g1", 6)])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ItemsGone);
        let ids = err.details.unwrap().get("goods_ids").unwrap().clone();
        assert_eq!(ids, serde_json::json!(["g1"]));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_good() {
        let (manager, _store) = manager_with_shop_a();
        // No inventory record for ghost: items gone, not pricing failure,
        // because the inventory check runs first
        let err = manager
            .create("c-1", vec![OrderLine::new("ghost", 1)])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ItemsGone);
    }

    #[tokio::test]
    async fn test_settle_happy_path() {
        let (manager, store) = manager_with_shop_a();
        let session_id = manager
            .create("c-1", vec![OrderLine::new("g1", 2)])
            .await
            .unwrap();

        let ticket_ids = manager.settle(&session_id, "staff-1", paid(600)).await.unwrap();
        assert_eq!(ticket_ids.len(), 1);

        // Session flipped with detail recorded
        let session = store.get_session(&session_id).unwrap().unwrap();
        assert!(session.is_paid());
        let detail = session.paid_detail.unwrap();
        assert_eq!(detail.paid_amount, 600);
        assert_eq!(detail.payment_staff_id, "staff-1");
        assert_eq!(detail.customer_id, "c-1");
        assert_eq!(session.ticket_ids, ticket_ids);

        // Stock decremented, waiting recorded
        let record = store.get_inventory("g1").unwrap().unwrap();
        assert_eq!(record.stock, Stock::RemainCount(3));
        assert_eq!(record.waiting_count, 2);

        // Exactly one ticket for shop-a
        let ticket = store.get_ticket(&ticket_ids[0]).unwrap().unwrap();
        assert_eq!(ticket.shop_id, "shop-a");
        assert_eq!(ticket.ticket_num, "1");
        assert_eq!(ticket.status, TicketStatus::Issued);
        assert_eq!(ticket.payment_session_id, session_id);
    }

    #[tokio::test]
    async fn test_settle_not_found() {
        let (manager, _store) = manager_with_shop_a();
        let err = manager.settle("ghost", "staff-1", paid(600)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionNotFound);
    }

    #[tokio::test]
    async fn test_settle_is_not_idempotent() {
        let (manager, _store) = manager_with_shop_a();
        let session_id = manager
            .create("c-1", vec![OrderLine::new("g1", 2)])
            .await
            .unwrap();

        manager.settle(&session_id, "staff-1", paid(600)).await.unwrap();

        let err = manager
            .settle(&session_id, "staff-1", paid(600))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionAlreadyPaid);
    }

    #[tokio::test]
    async fn test_settle_rejects_wrong_amount() {
        let (manager, store) = manager_with_shop_a();
        let session_id = manager
            .create("c-1", vec![OrderLine::new("g1", 2)])
            .await
            .unwrap();

        for wrong in [0, 599, 601] {
            let err = manager
                .settle(&session_id, "staff-1", paid(wrong))
                .await
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::WrongAmount);
        }

        // Nothing happened
        let session = store.get_session(&session_id).unwrap().unwrap();
        assert!(!session.is_paid());
        let record = store.get_inventory("g1").unwrap().unwrap();
        assert_eq!(record.stock, Stock::RemainCount(5));
    }

    #[tokio::test]
    async fn test_settle_rejects_amount_even_after_price_change() {
        let (manager, store) = manager_with_shop_a();
        let session_id = manager
            .create("c-1", vec![OrderLine::new("g1", 2)])
            .await
            .unwrap();

        // Price raised after creation; the frozen total still governs
        store.put_goods(&good("g1", "shop-a", 500)).unwrap();

        let err = manager
            .settle(&session_id, "staff-1", paid(1000))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::WrongAmount);

        manager.settle(&session_id, "staff-1", paid(600)).await.unwrap();
    }

    #[tokio::test]
    async fn test_settle_rejects_items_gone_since_creation() {
        let (manager, store) = manager_with_shop_a();
        let session_id = manager
            .create("c-1", vec![OrderLine::new("g1", 2)])
            .await
            .unwrap();

        // Stock dropped to 1 behind the session's back
        store.put_inventory(&InventoryRecord::counted("g1", 1)).unwrap();

        let err = manager
            .settle(&session_id, "staff-1", paid(600))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ItemsGone);
        let ids = err.details.unwrap().get("goods_ids").unwrap().clone();
        assert_eq!(ids, serde_json::json!(["g1"]));

        // Session still UNPAID, stock untouched
        let session = store.get_session(&session_id).unwrap().unwrap();
        assert!(!session.is_paid());
        let record = store.get_inventory("g1").unwrap().unwrap();
        assert_eq!(record.stock, Stock::RemainCount(1));
    }

    #[tokio::test]
    async fn test_settle_failure_rolls_back_everything() {
        // shop-b is not provisioned: minting fails after reservation,
        // the transaction is dropped, and no partial state leaks
        let store = HallStore::open_in_memory().unwrap();
        store.put_goods(&good("g1", "shop-a", 300)).unwrap();
        store.put_goods(&good("g2", "shop-b", 200)).unwrap();
        store.put_inventory(&InventoryRecord::counted("g1", 5)).unwrap();
        store.put_inventory(&InventoryRecord::counted("g2", 5)).unwrap();
        store.put_sequence("shop-a", &plain_seq(0)).unwrap();
        let manager = SessionManager::new(store.clone(), Arc::new(LogNotifier));

        let session_id = manager
            .create("c-1", vec![OrderLine::new("g1", 1), OrderLine::new("g2", 1)])
            .await
            .unwrap();

        let err = manager
            .settle(&session_id, "staff-1", paid(500))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SequenceNotProvisioned);

        // Reservation rolled back, session unpaid, no tickets
        assert_eq!(
            store.get_inventory("g1").unwrap().unwrap().stock,
            Stock::RemainCount(5)
        );
        assert!(!store.get_session(&session_id).unwrap().unwrap().is_paid());
        assert!(store.list_tickets().unwrap().is_empty());
        assert_eq!(
            store.get_sequence("shop-a").unwrap().unwrap().last_ticket_num,
            "0"
        );
    }

    #[tokio::test]
    async fn test_settle_two_shops_mints_two_tickets() {
        let store = HallStore::open_in_memory().unwrap();
        store.put_goods(&good("g1", "shop-a", 300)).unwrap();
        store.put_goods(&good("g2", "shop-b", 200)).unwrap();
        store.put_inventory(&InventoryRecord::counted("g1", 5)).unwrap();
        store.put_inventory(&InventoryRecord::flagged("g2", true)).unwrap();
        store.put_sequence("shop-a", &plain_seq(0)).unwrap();
        store.put_sequence("shop-b", &plain_seq(0)).unwrap();
        let manager = SessionManager::new(store.clone(), Arc::new(LogNotifier));

        let session_id = manager
            .create("c-1", vec![OrderLine::new("g1", 1), OrderLine::new("g2", 2)])
            .await
            .unwrap();

        let ticket_ids = manager.settle(&session_id, "staff-1", paid(700)).await.unwrap();
        assert_eq!(ticket_ids.len(), 2);

        let first = store.get_ticket(&ticket_ids[0]).unwrap().unwrap();
        let second = store.get_ticket(&ticket_ids[1]).unwrap().unwrap();
        assert_eq!(first.shop_id, "shop-a");
        assert_eq!(second.shop_id, "shop-b");
        assert_eq!(first.order_data, vec![OrderLine::new("g1", 1)]);
        assert_eq!(second.order_data, vec![OrderLine::new("g2", 2)]);

        // Flag-mode stock is not depleted
        assert_eq!(
            store.get_inventory("g2").unwrap().unwrap().stock,
            Stock::Remain(true)
        );
    }

    #[tokio::test]
    async fn test_get_session() {
        let (manager, _store) = manager_with_shop_a();
        let session_id = manager
            .create("c-1", vec![OrderLine::new("g1", 1)])
            .await
            .unwrap();

        let session = manager.get(&session_id).await.unwrap();
        assert_eq!(session.customer_id, "c-1");

        let err = manager.get("ghost").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionNotFound);
    }
}

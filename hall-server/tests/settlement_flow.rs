//! End-to-end settlement scenarios
//!
//! Drives the service layer the way the API handlers do: submit an
//! order, settle it at the till, work the tickets through the shop
//! board, and resolve a printed barcode back to a ticket.

use hall_server::barcode::BarcodeResolver;
use hall_server::notify::LogNotifier;
use hall_server::sessions::SessionManager;
use hall_server::store::HallStore;
use hall_server::tickets::TicketService;
use shared::ErrorCode;
use shared::models::{Good, InventoryRecord, OrderLine, PaidInput, Stock, TicketStatus};
use std::sync::Arc;

struct Hall {
    store: HallStore,
    sessions: SessionManager,
    tickets: TicketService,
    barcode: BarcodeResolver,
}

fn hall() -> Hall {
    let store = HallStore::open_in_memory().unwrap();
    Hall {
        sessions: SessionManager::new(store.clone(), Arc::new(LogNotifier)),
        tickets: TicketService::new(store.clone(), Arc::new(LogNotifier)),
        barcode: BarcodeResolver::new(store.clone()),
        store,
    }
}

fn seed_good(hall: &Hall, goods_id: &str, shop_id: &str, price: i64, stock: Stock) {
    hall.store
        .put_goods(&Good {
            goods_id: goods_id.to_string(),
            shop_id: shop_id.to_string(),
            name: goods_id.to_string(),
            price,
            description: None,
            image_url: None,
        })
        .unwrap();
    hall.store
        .put_inventory(&InventoryRecord {
            goods_id: goods_id.to_string(),
            stock,
            waiting_count: 0,
        })
        .unwrap();
}

fn cash(amount: i64) -> PaidInput {
    PaidInput {
        paid_amount: amount,
        paid_means: "CASH".to_string(),
        remark: None,
    }
}

#[tokio::test]
async fn settle_collects_money_and_mints_one_ticket() {
    let hall = hall();
    seed_good(&hall, "g1", "shop-a", 300, Stock::RemainCount(5));
    hall.tickets.provision_shop("shop-a", 0, None).unwrap();

    let session_id = hall
        .sessions
        .create("customer-1", vec![OrderLine::new("g1", 2)])
        .await
        .unwrap();

    let session = hall.sessions.get(&session_id).await.unwrap();
    assert_eq!(session.total_amount, 600);
    assert!(!session.is_paid());

    let ticket_ids = hall
        .sessions
        .settle(&session_id, "till-1", cash(600))
        .await
        .unwrap();
    assert_eq!(ticket_ids.len(), 1);

    let session = hall.sessions.get(&session_id).await.unwrap();
    assert!(session.is_paid());

    // Stock decremented exactly once
    let record = hall.store.get_inventory("g1").unwrap().unwrap();
    assert_eq!(record.stock, Stock::RemainCount(3));

    let ticket = hall.tickets.get(&ticket_ids[0]).unwrap();
    assert_eq!(ticket.shop_id, "shop-a");
    assert_eq!(ticket.customer_id, "customer-1");
    assert_eq!(ticket.ticket_num, "1");
}

#[tokio::test]
async fn settle_rejects_when_stock_ran_out_since_creation() {
    let hall = hall();
    seed_good(&hall, "g1", "shop-a", 300, Stock::RemainCount(5));
    hall.tickets.provision_shop("shop-a", 0, None).unwrap();

    let session_id = hall
        .sessions
        .create("customer-1", vec![OrderLine::new("g1", 2)])
        .await
        .unwrap();

    // Stock collapses to 1 before the customer reaches the till
    hall.store
        .put_inventory(&InventoryRecord::counted("g1", 1))
        .unwrap();

    let err = hall
        .sessions
        .settle(&session_id, "till-1", cash(600))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ItemsGone);
    assert_eq!(
        err.details.unwrap().get("goods_ids").unwrap().clone(),
        serde_json::json!(["g1"])
    );

    // Session remains UNPAID, stock untouched, nothing minted
    assert!(!hall.sessions.get(&session_id).await.unwrap().is_paid());
    assert_eq!(
        hall.store.get_inventory("g1").unwrap().unwrap().stock,
        Stock::RemainCount(1)
    );
    assert!(hall.store.list_tickets().unwrap().is_empty());
}

#[tokio::test]
async fn order_spanning_two_shops_mints_two_scoped_tickets() {
    let hall = hall();
    seed_good(&hall, "g1", "shop-a", 300, Stock::RemainCount(5));
    seed_good(&hall, "g2", "shop-b", 250, Stock::Remain(true));
    hall.tickets.provision_shop("shop-a", 0, None).unwrap();
    hall.tickets
        .provision_shop("shop-b", 0, Some("B-".to_string()))
        .unwrap();

    let session_id = hall
        .sessions
        .create(
            "customer-1",
            vec![OrderLine::new("g1", 1), OrderLine::new("g2", 2)],
        )
        .await
        .unwrap();

    let ticket_ids = hall
        .sessions
        .settle(&session_id, "till-1", cash(300 + 500))
        .await
        .unwrap();
    assert_eq!(ticket_ids.len(), 2);

    let a = hall.tickets.get(&ticket_ids[0]).unwrap();
    let b = hall.tickets.get(&ticket_ids[1]).unwrap();
    assert_eq!(a.shop_id, "shop-a");
    assert_eq!(b.shop_id, "shop-b");
    assert_eq!(a.order_data, vec![OrderLine::new("g1", 1)]);
    assert_eq!(b.order_data, vec![OrderLine::new("g2", 2)]);
    assert_eq!(a.ticket_num, "1");
    assert_eq!(b.ticket_num, "B-1");
}

#[tokio::test]
async fn full_journey_from_order_to_delivery() {
    let hall = hall();
    seed_good(&hall, "g1", "shop-a", 400, Stock::RemainCount(10));
    hall.tickets
        .provision_shop("shop-a", 0, Some("A-".to_string()))
        .unwrap();
    hall.barcode
        .register("shop-a", vec!["49".to_string()])
        .unwrap();

    // Customer orders, till settles
    let session_id = hall
        .sessions
        .create("customer-1", vec![OrderLine::new("g1", 1)])
        .await
        .unwrap();
    let ticket_ids = hall
        .sessions
        .settle(&session_id, "till-1", cash(400))
        .await
        .unwrap();
    let ticket_id = ticket_ids[0].clone();

    // Shop board shows the ticket; waiting count reflects it
    let board = hall.tickets.list_shop_tickets("shop-a", false).unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].ticket_num, "A-1");
    assert_eq!(
        hall.store.get_inventory("g1").unwrap().unwrap().waiting_count,
        1
    );

    // Till scans the printed barcode against the shop's open tickets
    let candidates: Vec<String> = board.iter().map(|t| t.unique_id.clone()).collect();
    let resolved = hall.barcode.resolve_ticket("4901111", &candidates).unwrap();
    assert_eq!(resolved, ticket_id);

    // Shop works the ticket to delivery
    hall.tickets
        .update_status(&ticket_id, TicketStatus::Preparing)
        .await
        .unwrap();
    hall.tickets
        .update_status(&ticket_id, TicketStatus::Ready)
        .await
        .unwrap();
    hall.tickets
        .update_status(&ticket_id, TicketStatus::Delivered)
        .await
        .unwrap();

    // Delivered tickets leave the board and the waiting count
    assert!(hall.tickets.list_shop_tickets("shop-a", false).unwrap().is_empty());
    assert_eq!(
        hall.store.get_inventory("g1").unwrap().unwrap().waiting_count,
        0
    );

    // The binding keeps answering even with the board empty
    assert_eq!(hall.barcode.resolve_ticket("4901111", &[]).unwrap(), ticket_id);
}

#[tokio::test]
async fn settle_twice_pays_once() {
    let hall = hall();
    seed_good(&hall, "g1", "shop-a", 300, Stock::RemainCount(5));
    hall.tickets.provision_shop("shop-a", 0, None).unwrap();

    let session_id = hall
        .sessions
        .create("customer-1", vec![OrderLine::new("g1", 1)])
        .await
        .unwrap();

    hall.sessions
        .settle(&session_id, "till-1", cash(300))
        .await
        .unwrap();
    let err = hall
        .sessions
        .settle(&session_id, "till-2", cash(300))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::SessionAlreadyPaid);

    // The double call decremented stock only once
    assert_eq!(
        hall.store.get_inventory("g1").unwrap().unwrap().stock,
        Stock::RemainCount(4)
    );
}

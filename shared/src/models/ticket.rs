//! Ticket, ticket sequence, and barcode models

use super::session::OrderLine;
use serde::{Deserialize, Serialize};

/// Ticket preparation status
///
/// Forward-only: Issued -> Preparing -> Ready -> Delivered. No skips,
/// no backwards moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketStatus {
    Issued,
    Preparing,
    Ready,
    Delivered,
}

impl TicketStatus {
    /// Whether `next` is a legal transition from this status
    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        matches!(
            (self, next),
            (TicketStatus::Issued, TicketStatus::Preparing)
                | (TicketStatus::Preparing, TicketStatus::Ready)
                | (TicketStatus::Ready, TicketStatus::Delivered)
        )
    }
}

/// A numbered ticket, redeemable at the shop that prepares the goods
///
/// One payment session yields one ticket per distinct shop in the order;
/// `order_data` holds only the lines belonging to this ticket's shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub unique_id: String,
    pub shop_id: String,
    pub customer_id: String,
    /// Human-readable sequential number, e.g. "A-12"
    pub ticket_num: String,
    pub order_data: Vec<OrderLine>,
    pub status: TicketStatus,
    pub issue_time: i64,
    pub payment_session_id: String,
    pub last_status_updated: i64,
}

/// Optional formatting for a shop's ticket numbers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketNumConfig {
    /// Fixed prefix carried by every ticket number, e.g. "A-"
    pub ticket_num_leading: String,
}

/// Per-shop ticket sequence singleton
///
/// Owned exclusively by the ticket sequencer; mutated only inside the
/// same transaction that writes the next ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketNumInfo {
    pub last_ticket_num: String,
    pub ticket_num_config: Option<TicketNumConfig>,
}

/// Per-shop barcode prefix registration (static configuration)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarcodeInfo {
    pub shop_id: String,
    /// Non-empty list of prefixes; a barcode matches the shop iff it
    /// starts with one of them
    pub barcode_starts_with: Vec<String>,
}

/// Persisted barcode -> ticket resolution, authoritative once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketBarcodeBind {
    pub barcode: String,
    pub uid: String,
    pub ticket_id: String,
}

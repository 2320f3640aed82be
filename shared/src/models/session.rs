//! Payment session models
//!
//! A session tracks one customer order from creation to settlement.
//! Its total is frozen at creation and never recomputed.

use serde::{Deserialize, Serialize};

/// One line of an order: a good and how many units of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub goods_id: String,
    pub count: i64,
}

impl OrderLine {
    pub fn new(goods_id: impl Into<String>, count: i64) -> Self {
        Self {
            goods_id: goods_id.into(),
            count,
        }
    }
}

/// Session lifecycle state. UNPAID -> PAID, terminal, no other transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionState {
    Unpaid,
    Paid,
}

/// Operator-entered settlement attestation, recorded on the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaidDetail {
    pub payment_id: String,
    pub payment_staff_id: String,
    pub customer_id: String,
    pub paid_time: i64,
    /// Paid amount in minor currency units; must equal the session total exactly
    pub paid_amount: i64,
    pub paid_means: String,
    pub remark: Option<String>,
}

/// Settlement input as submitted by till staff
///
/// The remaining `PaidDetail` fields (payment id, staff id, customer id,
/// time) are filled in by the session manager, not the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaidInput {
    pub paid_amount: i64,
    pub paid_means: String,
    pub remark: Option<String>,
}

/// Payment session: one customer order from creation to settlement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    pub session_id: String,
    pub customer_id: String,
    pub order_content: Vec<OrderLine>,
    /// Total in minor currency units, frozen at creation
    pub total_amount: i64,
    pub state: SessionState,
    /// Present iff `state == Paid`
    pub paid_detail: Option<PaidDetail>,
    /// Tickets minted at settlement, one per shop in the order
    pub ticket_ids: Vec<String>,
    pub created_at: i64,
}

impl PaymentSession {
    pub fn is_paid(&self) -> bool {
        self.state == SessionState::Paid
    }
}

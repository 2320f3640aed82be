//! Data model entities
//!
//! Plain serde structs shared between the service crates. Each entity is
//! owned by exactly one service component; nothing here carries behavior
//! beyond small validation and state-machine helpers.

pub mod auth;
pub mod goods;
pub mod session;
pub mod ticket;

pub use auth::{AuthEntry, AuthRole};
pub use goods::{Good, InventoryRecord, Stock};
pub use session::{OrderLine, PaidDetail, PaidInput, PaymentSession, SessionState};
pub use ticket::{
    BarcodeInfo, Ticket, TicketBarcodeBind, TicketNumConfig, TicketNumInfo, TicketStatus,
};

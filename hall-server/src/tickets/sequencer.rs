//! Per-shop ticket number sequencer
//!
//! Allocates human-readable sequential ticket numbers. The read of the
//! shop's sequence record, the ticket write, and the sequence update all
//! happen inside one caller-owned write transaction; an update to the
//! sequence without its ticket (or the reverse) would duplicate or skip a
//! number on the next call, so the three commit together or not at all.
//!
//! Sequences are provisioned per shop; two shops never contend for the
//! same record.

use crate::store::HallStore;
use redb::WriteTransaction;
use shared::models::{OrderLine, Ticket, TicketNumInfo, TicketStatus};
use shared::util::now_millis;
use shared::{AppError, AppResult, ErrorCode};

#[derive(Clone)]
pub struct TicketSequencer {
    store: HallStore,
}

impl TicketSequencer {
    pub fn new(store: HallStore) -> Self {
        Self { store }
    }

    /// Mint one ticket for a shop inside the caller's transaction.
    ///
    /// `lines` must contain only the order lines belonging to `shop_id`
    /// (the issuer partitions the order before calling).
    pub fn mint(
        &self,
        txn: &WriteTransaction,
        shop_id: &str,
        customer_id: &str,
        session_id: &str,
        lines: Vec<OrderLine>,
    ) -> AppResult<Ticket> {
        // 1. Sequence record is mandatory; an unprovisioned shop is fatal
        let info = self
            .store
            .get_sequence_txn(txn, shop_id)?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::SequenceNotProvisioned,
                    format!("Shop {shop_id} has no ticket sequence"),
                )
                .with_detail("shop_id", shop_id)
            })?;

        // 2. Compute the next number from the stored one
        let ticket_num = next_ticket_num(&info)?;

        // 3. Write ticket and updated sequence together; the enclosing
        //    transaction makes the pair atomic
        let now = now_millis();
        let ticket = Ticket {
            unique_id: uuid::Uuid::new_v4().to_string(),
            shop_id: shop_id.to_string(),
            customer_id: customer_id.to_string(),
            ticket_num: ticket_num.clone(),
            order_data: lines,
            status: TicketStatus::Issued,
            issue_time: now,
            payment_session_id: session_id.to_string(),
            last_status_updated: now,
        };
        self.store.put_ticket_txn(txn, &ticket)?;
        self.store.put_sequence_txn(
            txn,
            shop_id,
            &TicketNumInfo {
                last_ticket_num: ticket_num,
                ticket_num_config: info.ticket_num_config,
            },
        )?;

        Ok(ticket)
    }
}

/// Compute the successor of `last_ticket_num`.
///
/// With a configured leading prefix the prefix is stripped exactly, the
/// remainder parsed as an integer, incremented, and the prefix
/// re-prepended; without one the whole string is parsed. A prefix or
/// parse mismatch means the stored sequence is corrupted or misconfigured
/// and must surface loudly rather than silently reset.
fn next_ticket_num(info: &TicketNumInfo) -> AppResult<String> {
    let (leading, body) = match &info.ticket_num_config {
        Some(config) => {
            let stripped = info
                .last_ticket_num
                .strip_prefix(&config.ticket_num_leading)
                .ok_or_else(|| {
                    AppError::ticket_num_generation(format!(
                        "Stored ticket number {:?} does not carry leading {:?}",
                        info.last_ticket_num, config.ticket_num_leading
                    ))
                })?;
            (config.ticket_num_leading.as_str(), stripped)
        }
        None => ("", info.last_ticket_num.as_str()),
    };

    let current: u64 = body.parse().map_err(|_| {
        AppError::ticket_num_generation(format!(
            "Stored ticket number {:?} is not numeric after leading",
            info.last_ticket_num
        ))
    })?;

    Ok(format!("{leading}{}", current + 1))
}

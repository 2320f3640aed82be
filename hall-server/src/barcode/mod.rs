//! Barcode resolution
//!
//! Maps a scanned barcode to a shop by prefix matching against each
//! shop's registered prefix set, then narrows to one ticket among the
//! till's candidates. A successful ticket resolution is persisted as a
//! binding; the binding is authoritative from then on and later lookups
//! skip prefix matching entirely.

use crate::store::HallStore;
use shared::models::{BarcodeInfo, Ticket, TicketBarcodeBind};
use shared::{AppError, AppResult};
use tracing::{debug, info};

#[derive(Clone)]
pub struct BarcodeResolver {
    store: HallStore,
}

impl BarcodeResolver {
    pub fn new(store: HallStore) -> Self {
        Self { store }
    }

    /// Register (or replace) a shop's barcode prefixes
    pub fn register(&self, shop_id: &str, prefixes: Vec<String>) -> AppResult<()> {
        if prefixes.is_empty() || prefixes.iter().any(|p| p.is_empty()) {
            return Err(AppError::validation("barcode prefixes must be non-empty")
                .with_detail("shop_id", shop_id));
        }
        self.store.put_barcode_info(&BarcodeInfo {
            shop_id: shop_id.to_string(),
            barcode_starts_with: prefixes,
        })?;
        Ok(())
    }

    /// Resolve a barcode to the single shop whose prefix set matches it.
    ///
    /// More than one matching shop is a configuration defect and is
    /// reported, not guessed.
    pub fn resolve_shop(&self, barcode: &str) -> AppResult<BarcodeInfo> {
        let mut matches: Vec<BarcodeInfo> = self
            .store
            .list_barcode_infos()?
            .into_iter()
            .filter(|info| {
                info.barcode_starts_with
                    .iter()
                    .any(|prefix| barcode.starts_with(prefix.as_str()))
            })
            .collect();

        match matches.len() {
            0 => Err(AppError::no_match(format!(
                "Barcode {barcode:?} matches no registered shop prefix"
            ))),
            1 => Ok(matches.remove(0)),
            _ => {
                let shop_ids: Vec<String> =
                    matches.into_iter().map(|info| info.shop_id).collect();
                Err(AppError::ambiguous(format!(
                    "Barcode {barcode:?} matches prefixes of {} shops",
                    shop_ids.len()
                ))
                .with_detail("shop_ids", shop_ids))
            }
        }
    }

    /// Resolve a barcode to one ticket among the given candidates.
    ///
    /// A stored binding wins outright. Otherwise the shop is resolved
    /// first and the candidates are narrowed to that shop; a unique match
    /// is bound before it is returned, so the decision is made once.
    pub fn resolve_ticket(&self, barcode: &str, candidate_ticket_ids: &[String]) -> AppResult<String> {
        if let Some(bind) = self.store.get_binding(barcode)? {
            debug!(barcode = %barcode, ticket_id = %bind.ticket_id, "Barcode served from binding");
            return Ok(bind.ticket_id);
        }

        let shop = self.resolve_shop(barcode)?;

        let mut matched: Vec<Ticket> = Vec::new();
        for ticket_id in candidate_ticket_ids {
            if let Some(ticket) = self.store.get_ticket(ticket_id)?
                && ticket.shop_id == shop.shop_id
            {
                matched.push(ticket);
            }
        }

        match matched.len() {
            0 => Err(AppError::no_match(format!(
                "No candidate ticket belongs to shop {}",
                shop.shop_id
            ))
            .with_detail("shop_id", shop.shop_id)),
            1 => {
                let ticket = matched.remove(0);
                let bind = TicketBarcodeBind {
                    barcode: barcode.to_string(),
                    uid: ticket.customer_id.clone(),
                    ticket_id: ticket.unique_id.clone(),
                };
                self.store.put_binding(&bind)?;
                info!(
                    barcode = %barcode,
                    ticket_id = %bind.ticket_id,
                    "Barcode bound to ticket"
                );
                Ok(bind.ticket_id)
            }
            _ => {
                let ticket_ids: Vec<String> =
                    matched.into_iter().map(|t| t.unique_id).collect();
                Err(AppError::ambiguous(format!(
                    "{} candidate tickets belong to shop {}",
                    ticket_ids.len(),
                    shop.shop_id
                ))
                .with_detail("ticket_ids", ticket_ids))
            }
        }
    }
}

//! Ticket issuer
//!
//! Partitions a paid session's order by owning shop and mints one ticket
//! per shop through the sequencer. Runs entirely inside the settlement
//! transaction, so a failure for any shop aborts the whole issuance.

use crate::store::HallStore;
use crate::tickets::sequencer::TicketSequencer;
use redb::WriteTransaction;
use shared::models::{OrderLine, PaymentSession, Ticket};
use shared::{AppError, AppResult};

#[derive(Clone)]
pub struct TicketIssuer {
    store: HallStore,
    sequencer: TicketSequencer,
}

impl TicketIssuer {
    pub fn new(store: HallStore) -> Self {
        let sequencer = TicketSequencer::new(store.clone());
        Self { store, sequencer }
    }

    /// Mint one ticket per distinct shop in the session's order.
    ///
    /// Shop groups keep the insertion order of their first occurrence.
    /// Any unresolvable line aborts before minting starts; a mint failure
    /// for a later shop propagates and the caller drops the transaction.
    pub fn issue(
        &self,
        txn: &WriteTransaction,
        customer_id: &str,
        session: &PaymentSession,
    ) -> AppResult<Vec<Ticket>> {
        let groups = self.group_by_shop(txn, &session.order_content)?;

        let mut tickets = Vec::with_capacity(groups.len());
        for (shop_id, lines) in groups {
            let ticket =
                self.sequencer
                    .mint(txn, &shop_id, customer_id, &session.session_id, lines)?;
            tickets.push(ticket);
        }
        Ok(tickets)
    }

    /// Resolve every line's owning shop and group lines per shop,
    /// preserving first-occurrence order
    fn group_by_shop(
        &self,
        txn: &WriteTransaction,
        order: &[OrderLine],
    ) -> AppResult<Vec<(String, Vec<OrderLine>)>> {
        let mut groups: Vec<(String, Vec<OrderLine>)> = Vec::new();

        for line in order {
            let good = self
                .store
                .get_goods_txn(txn, &line.goods_id)?
                .ok_or_else(|| {
                    AppError::issue_failed(format!(
                        "Failed to get item data for goods {}",
                        line.goods_id
                    ))
                    .with_detail("goods_id", line.goods_id.clone())
                })?;

            match groups.iter_mut().find(|(shop, _)| *shop == good.shop_id) {
                Some((_, lines)) => lines.push(line.clone()),
                None => groups.push((good.shop_id, vec![line.clone()])),
            }
        }
        Ok(groups)
    }
}

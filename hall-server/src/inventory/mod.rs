//! Inventory ledger
//!
//! Tracks per-good remaining stock (flag or counted) and waiting counts.
//! Checking tolerates per-line failures for diagnostics; reserving is
//! strict and runs inside the settlement transaction, re-verifying
//! sufficiency immediately before every decrement.

use crate::store::HallStore;
use redb::WriteTransaction;
use shared::models::{InventoryRecord, OrderLine, Stock};
use shared::{AppError, AppResult, ErrorCode};
use tracing::warn;

/// Per-line result of an order sufficiency check
#[derive(Debug, Clone)]
pub struct LineCheck {
    pub goods_id: String,
    pub sufficient: bool,
}

/// Aggregate result of checking a whole order
#[derive(Debug, Clone)]
pub struct OrderCheck {
    pub per_item: Vec<LineCheck>,
    pub all_sufficient: bool,
}

impl OrderCheck {
    /// Goods ids of the lines that failed the check
    pub fn insufficient_ids(&self) -> Vec<String> {
        self.per_item
            .iter()
            .filter(|line| !line.sufficient)
            .map(|line| line.goods_id.clone())
            .collect()
    }
}

#[derive(Clone)]
pub struct InventoryLedger {
    store: HallStore,
}

impl InventoryLedger {
    pub fn new(store: HallStore) -> Self {
        Self { store }
    }

    /// Check whether `requested_count` units of one good are available.
    ///
    /// Flag-mode goods are sufficient iff the flag is set; counted goods
    /// iff the count covers the request. A missing inventory record is an
    /// error (the caller decides whether that aborts or degrades).
    pub fn check_sufficiency(&self, goods_id: &str, requested_count: i64) -> AppResult<bool> {
        if requested_count <= 0 {
            return Err(AppError::validation("requested count must be positive")
                .with_detail("goods_id", goods_id));
        }
        let record = self
            .store
            .get_inventory(goods_id)?
            .ok_or_else(|| inventory_missing(goods_id))?;
        Ok(is_sufficient(&record, requested_count))
    }

    /// Check every line of an order independently.
    ///
    /// A failed read degrades that line to insufficient instead of
    /// aborting the others; the full per-line list is returned for
    /// diagnostics.
    pub fn check_order(&self, order: &[OrderLine]) -> OrderCheck {
        let per_item: Vec<LineCheck> = order
            .iter()
            .map(|line| {
                let sufficient = match self.check_sufficiency(&line.goods_id, line.count) {
                    Ok(s) => s,
                    Err(err) => {
                        warn!(
                            goods_id = %line.goods_id,
                            error = %err,
                            "Inventory check degraded line to insufficient"
                        );
                        false
                    }
                };
                LineCheck {
                    goods_id: line.goods_id.clone(),
                    sufficient,
                }
            })
            .collect();

        let all_sufficient = per_item.iter().all(|line| line.sufficient);
        OrderCheck {
            per_item,
            all_sufficient,
        }
    }

    /// Check every line against the in-transaction inventory state.
    ///
    /// Settlement runs this inside its write transaction so the check and
    /// the subsequent reservation see the same state.
    pub fn check_order_txn(&self, txn: &WriteTransaction, order: &[OrderLine]) -> OrderCheck {
        let per_item: Vec<LineCheck> = order
            .iter()
            .map(|line| {
                let sufficient = if line.count <= 0 {
                    false
                } else {
                    match self.store.get_inventory_txn(txn, &line.goods_id) {
                        Ok(Some(record)) => is_sufficient(&record, line.count),
                        Ok(None) => {
                            warn!(goods_id = %line.goods_id, "No inventory record at settlement");
                            false
                        }
                        Err(err) => {
                            warn!(
                                goods_id = %line.goods_id,
                                error = %err,
                                "Inventory re-check degraded line to insufficient"
                            );
                            false
                        }
                    }
                };
                LineCheck {
                    goods_id: line.goods_id.clone(),
                    sufficient,
                }
            })
            .collect();

        let all_sufficient = per_item.iter().all(|line| line.sufficient);
        OrderCheck {
            per_item,
            all_sufficient,
        }
    }

    /// Reserve the ordered units inside the caller's transaction.
    ///
    /// Counted goods are decremented; the decrement re-verifies
    /// sufficiency against the in-transaction state, so concurrent
    /// settlements cannot both pass a stale check and oversell. Flag-mode
    /// goods are not depleted beyond the sufficiency check.
    pub fn reserve(&self, txn: &WriteTransaction, order: &[OrderLine]) -> AppResult<()> {
        for line in order {
            let mut record = self
                .store
                .get_inventory_txn(txn, &line.goods_id)?
                .ok_or_else(|| AppError::items_gone(vec![line.goods_id.clone()]))?;

            match record.stock {
                Stock::Remain(true) => {}
                Stock::Remain(false) => {
                    return Err(AppError::items_gone(vec![line.goods_id.clone()]));
                }
                Stock::RemainCount(count) => {
                    if count < line.count {
                        return Err(AppError::items_gone(vec![line.goods_id.clone()]));
                    }
                    record.stock = Stock::RemainCount(count - line.count);
                    self.store.put_inventory_txn(txn, &record)?;
                }
            }
        }
        Ok(())
    }

    /// Compensating re-increment for a previously reserved order.
    ///
    /// The single-transaction settle path never needs this; it exists for
    /// saga-style callers that reserve and settle in separate commits.
    pub fn release(&self, txn: &WriteTransaction, order: &[OrderLine]) -> AppResult<()> {
        for line in order {
            let Some(mut record) = self.store.get_inventory_txn(txn, &line.goods_id)? else {
                warn!(goods_id = %line.goods_id, "Release skipped missing inventory record");
                continue;
            };
            if let Stock::RemainCount(count) = record.stock {
                record.stock = Stock::RemainCount(count + line.count);
                self.store.put_inventory_txn(txn, &record)?;
            }
        }
        Ok(())
    }

    /// Add the ordered units to each good's waiting count (ticket issued)
    pub fn add_waiting(&self, txn: &WriteTransaction, order: &[OrderLine]) -> AppResult<()> {
        self.bump_waiting(txn, order, 1)
    }

    /// Remove the ordered units from each good's waiting count (delivered)
    pub fn sub_waiting(&self, txn: &WriteTransaction, order: &[OrderLine]) -> AppResult<()> {
        self.bump_waiting(txn, order, -1)
    }

    fn bump_waiting(
        &self,
        txn: &WriteTransaction,
        order: &[OrderLine],
        sign: i64,
    ) -> AppResult<()> {
        for line in order {
            let Some(mut record) = self.store.get_inventory_txn(txn, &line.goods_id)? else {
                continue;
            };
            record.waiting_count = (record.waiting_count + sign * line.count).max(0);
            self.store.put_inventory_txn(txn, &record)?;
        }
        Ok(())
    }
}

fn is_sufficient(record: &InventoryRecord, requested_count: i64) -> bool {
    match record.stock {
        Stock::Remain(remain) => remain,
        Stock::RemainCount(count) => count >= requested_count,
    }
}

fn inventory_missing(goods_id: &str) -> AppError {
    AppError::with_message(
        ErrorCode::GoodsNotFound,
        format!("No inventory record for goods {goods_id}"),
    )
    .with_detail("goods_id", goods_id)
}

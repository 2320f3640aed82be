//! Order pricing
//!
//! Computes an order's total from current goods prices. Fails closed:
//! if any referenced good cannot be read, the whole operation fails with
//! no partial total. This deliberately differs from inventory checking,
//! which tolerates per-line failures for diagnostics.

use crate::store::HallStore;
use shared::models::OrderLine;
use shared::{AppError, AppResult};

#[derive(Clone)]
pub struct OrderPricer {
    store: HallStore,
}

impl OrderPricer {
    pub fn new(store: HallStore) -> Self {
        Self { store }
    }

    /// Total price of the order in minor currency units
    pub fn price(&self, order: &[OrderLine]) -> AppResult<i64> {
        let mut total: i64 = 0;
        let mut unreadable: Vec<String> = Vec::new();

        for line in order {
            match self.store.get_goods(&line.goods_id) {
                Ok(Some(good)) => {
                    let line_total = good
                        .price
                        .checked_mul(line.count)
                        .and_then(|t| total.checked_add(t));
                    match line_total {
                        Some(t) => total = t,
                        None => {
                            return Err(AppError::internal("Order total overflow")
                                .with_detail("goods_id", line.goods_id.clone()));
                        }
                    }
                }
                Ok(None) => unreadable.push(line.goods_id.clone()),
                Err(err) => {
                    tracing::warn!(
                        goods_id = %line.goods_id,
                        error = %err,
                        "Failed to read goods while pricing"
                    );
                    unreadable.push(line.goods_id.clone());
                }
            }
        }

        if !unreadable.is_empty() {
            return Err(AppError::pricing_failed(unreadable));
        }
        Ok(total)
    }
}

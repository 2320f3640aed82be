//! Goods and inventory models

use serde::{Deserialize, Serialize};

/// A sellable good, owned by exactly one shop
///
/// Immutable once referenced by a paid order: the price is captured into
/// the session total at order time and never re-read afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Good {
    pub goods_id: String,
    pub shop_id: String,
    pub name: String,
    /// Price in minor currency units
    pub price: i64,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Stock shape of a good. Exactly one shape is valid per good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stock {
    /// Available / unavailable flag; reservation never depletes it
    Remain(bool),
    /// Unit count; reservation decrements it, never below zero
    RemainCount(i64),
}

/// Per-good inventory record, keyed by goods id
///
/// Mutated only by the inventory ledger's reserve/release operations and
/// the waiting-count maintenance driven by the ticket flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub goods_id: String,
    pub stock: Stock,
    /// Count of units on issued, not-yet-delivered tickets
    pub waiting_count: i64,
}

impl InventoryRecord {
    pub fn flagged(goods_id: impl Into<String>, remain: bool) -> Self {
        Self {
            goods_id: goods_id.into(),
            stock: Stock::Remain(remain),
            waiting_count: 0,
        }
    }

    pub fn counted(goods_id: impl Into<String>, remain_count: i64) -> Self {
        Self {
            goods_id: goods_id.into(),
            stock: Stock::RemainCount(remain_count),
            waiting_count: 0,
        }
    }
}

use crate::error::PlannerError;
use crate::models::{InventoryEntry, InventorySnapshot, Quantity, UnitFamily};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// 低库存阈值：每个单位族一个阈值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LowStockThresholds {
    by_family: HashMap<UnitFamily, Quantity>,
}

impl LowStockThresholds {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以阈值自身的单位族为键；同族后者覆盖前者
    pub fn from_quantities<I>(thresholds: I) -> Self
    where
        I: IntoIterator<Item = Quantity>,
    {
        let by_family = thresholds.into_iter().map(|q| (q.family(), q)).collect();
        Self { by_family }
    }

    pub fn get(&self, family: UnitFamily) -> Option<&Quantity> {
        self.by_family.get(&family)
    }

    pub fn is_empty(&self) -> bool {
        self.by_family.is_empty()
    }

    /// 条目数量是否 <= 所在族的阈值；该族未配置阈值时返回 None
    pub fn breached_by(&self, entry: &InventoryEntry) -> Result<Option<Quantity>, PlannerError> {
        let Some(threshold) = self.get(entry.quantity.family()) else {
            return Ok(None);
        };
        match entry.quantity.compare(threshold)? {
            Ordering::Greater => Ok(None),
            _ => Ok(Some(threshold.clone())),
        }
    }
}

/// 低库存条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockItem {
    pub ingredient: String,
    pub current: Quantity,
    pub threshold: Quantity,
}

/// `today` 起 `days` 天内 (含两端) 到期的库存
pub fn expiring_soon(snapshot: &InventorySnapshot, today: NaiveDate, days: u32) -> Vec<InventoryEntry> {
    let mut soon: Vec<InventoryEntry> = snapshot
        .entries()
        .filter(|e| e.expires_within(today, days))
        .cloned()
        .collect();
    soon.sort_by_key(|e| e.expires_on);
    soon
}

/// 已过期的库存 (保质期早于 `today`)
pub fn expired(snapshot: &InventorySnapshot, today: NaiveDate) -> Vec<InventoryEntry> {
    snapshot
        .entries()
        .filter(|e| e.is_expired(today))
        .cloned()
        .collect()
}

pub fn low_stock(
    snapshot: &InventorySnapshot,
    thresholds: &LowStockThresholds,
) -> Result<Vec<LowStockItem>, PlannerError> {
    let mut low = Vec::new();
    for entry in snapshot.entries() {
        if let Some(threshold) = thresholds.breached_by(entry)? {
            low.push(LowStockItem {
                ingredient: entry.ingredient.clone(),
                current: entry.quantity.clone(),
                threshold,
            });
        }
    }
    Ok(low)
}

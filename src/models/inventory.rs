use crate::error::PlannerError;
use crate::models::{ingredient_key, Quantity, Unit};
use chrono::{Duration, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 冰箱库存条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub ingredient: String,
    pub quantity: Quantity,
    /// 保质期；None 表示长期存放
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<NaiveDate>,
}

impl InventoryEntry {
    pub fn new(ingredient: impl Into<String>, quantity: Quantity) -> Self {
        Self {
            ingredient: ingredient.into(),
            quantity,
            expires_on: None,
        }
    }

    pub fn with_expiry(mut self, expires_on: NaiveDate) -> Self {
        self.expires_on = Some(expires_on);
        self
    }

    pub fn key(&self) -> String {
        ingredient_key(&self.ingredient)
    }

    /// 在 `today` 当天是否已过期 (保质期当天仍可用)
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expires_on.map_or(false, |d| d < today)
    }

    /// 是否将在 `days` 天内过期 (含今天，不含已过期)
    pub fn expires_within(&self, today: NaiveDate, days: u32) -> bool {
        match self.expires_on {
            Some(d) => today <= d && d <= today + Duration::days(i64::from(days)),
            None => false,
        }
    }

    /// 入库：增量换算到条目单位后相加
    pub fn add(&self, delta: &Quantity) -> Result<InventoryEntry, PlannerError> {
        let quantity = self
            .quantity
            .try_add(delta)
            .map_err(|e| e.for_ingredient(&self.ingredient))?;
        Ok(InventoryEntry {
            quantity,
            ..self.clone()
        })
    }

    /// 扣减：不足时返回 `InsufficientQuantity`
    pub fn consume(&self, delta: &Quantity) -> Result<InventoryEntry, PlannerError> {
        let quantity = self
            .quantity
            .try_sub(delta)
            .map_err(|e| e.for_ingredient(&self.ingredient))?;
        Ok(InventoryEntry {
            quantity,
            ..self.clone()
        })
    }
}

/// 库存快照：一次规划调用期间只读
///
/// 以食材名 (忽略大小写) 为键，保持插入顺序。同名条目合并到首个条目的单位，
/// 保质期取最早的一个。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventorySnapshot {
    entries: IndexMap<String, InventoryEntry>,
}

impl InventorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I>(entries: I) -> Result<Self, PlannerError>
    where
        I: IntoIterator<Item = InventoryEntry>,
    {
        let mut snapshot = Self::new();
        for entry in entries {
            snapshot.insert(entry)?;
        }
        Ok(snapshot)
    }

    pub fn insert(&mut self, entry: InventoryEntry) -> Result<(), PlannerError> {
        let key = entry.key();
        match self.entries.get_mut(&key) {
            Some(existing) => {
                let merged = existing.add(&entry.quantity)?;
                let expires_on = match (existing.expires_on, entry.expires_on) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
                *existing = InventoryEntry {
                    expires_on,
                    ..merged
                };
            }
            None => {
                self.entries.insert(key, entry);
            }
        }
        Ok(())
    }

    pub fn get(&self, ingredient: &str) -> Option<&InventoryEntry> {
        self.entries.get(&ingredient_key(ingredient))
    }

    /// 某食材在 `unit` 下的可用量；缺失视为 0，跨族返回 `UnitMismatch`
    pub fn available(&self, ingredient: &str, unit: Unit) -> Result<Quantity, PlannerError> {
        match self.get(ingredient) {
            Some(entry) => entry.quantity.convert(unit).map_err(|_| PlannerError::UnitMismatch {
                ingredient: ingredient.to_string(),
                expected: unit,
                found: entry.quantity.unit(),
            }),
            None => Ok(Quantity::zero(unit)),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &InventoryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn lookup_is_case_insensitive_exact() {
        let snapshot = InventorySnapshot::from_entries(vec![InventoryEntry::new(
            "Butter",
            Quantity::whole(250, Unit::Gram),
        )])
        .unwrap();
        assert!(snapshot.get("butter").is_some());
        assert!(snapshot.get("BUTTER").is_some());
        assert!(snapshot.get("butte").is_none());
        assert!(snapshot.get("peanut butter").is_none());
    }

    #[test]
    fn missing_ingredient_is_zero_in_requested_unit() {
        let snapshot = InventorySnapshot::new();
        let q = snapshot.available("盐", Unit::Gram).unwrap();
        assert_eq!(q, Quantity::zero(Unit::Gram));
    }

    #[test]
    fn available_converts_or_reports_mismatch() {
        let snapshot = InventorySnapshot::from_entries(vec![
            InventoryEntry::new("面粉", "1 kg".parse().unwrap()),
            InventoryEntry::new("鸡蛋", Quantity::whole(6, Unit::Piece)),
        ])
        .unwrap();
        assert_eq!(
            snapshot.available("面粉", Unit::Gram).unwrap(),
            Quantity::whole(1000, Unit::Gram)
        );
        assert_eq!(
            snapshot.available("鸡蛋", Unit::Gram).unwrap_err(),
            PlannerError::UnitMismatch {
                ingredient: "鸡蛋".to_string(),
                expected: Unit::Gram,
                found: Unit::Piece,
            }
        );
    }

    #[test]
    fn duplicate_entries_merge_with_earliest_expiry() {
        let snapshot = InventorySnapshot::from_entries(vec![
            InventoryEntry::new("牛奶", "500 ml".parse().unwrap()).with_expiry(date(2026, 5, 10)),
            InventoryEntry::new("牛奶", "1 l".parse().unwrap()).with_expiry(date(2026, 5, 3)),
        ])
        .unwrap();
        assert_eq!(snapshot.len(), 1);
        let milk = snapshot.get("牛奶").unwrap();
        assert_eq!(milk.quantity, Quantity::whole(1500, Unit::Milliliter));
        assert_eq!(milk.expires_on, Some(date(2026, 5, 3)));

        let err = InventorySnapshot::from_entries(vec![
            InventoryEntry::new("牛奶", "500 ml".parse().unwrap()),
            InventoryEntry::new("牛奶", Quantity::whole(2, Unit::Piece)),
        ])
        .unwrap_err();
        assert!(matches!(err, PlannerError::UnitMismatch { .. }));
    }

    #[test]
    fn expiry_checks() {
        let today = date(2026, 3, 1);
        let entry = InventoryEntry::new("豆腐", Quantity::whole(1, Unit::Piece))
            .with_expiry(date(2026, 3, 3));
        assert!(!entry.is_expired(today));
        assert!(entry.is_expired(date(2026, 3, 4)));
        assert!(entry.expires_within(today, 3));
        assert!(!entry.expires_within(today, 1));
        assert!(!InventoryEntry::new("盐", Quantity::whole(1, Unit::Kilogram))
            .expires_within(today, 30));
    }

    #[test]
    fn consume_is_strict() {
        let eggs = InventoryEntry::new("鸡蛋", Quantity::whole(4, Unit::Piece));
        let left = eggs.consume(&Quantity::whole(3, Unit::Piece)).unwrap();
        assert_eq!(left.quantity, Quantity::whole(1, Unit::Piece));
        assert!(matches!(
            left.consume(&Quantity::whole(2, Unit::Piece)),
            Err(PlannerError::InsufficientQuantity { .. })
        ));
        assert!(matches!(
            left.consume(&Quantity::whole(2, Unit::Gram)),
            Err(PlannerError::UnitMismatch { .. })
        ));
    }
}

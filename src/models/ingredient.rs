use crate::error::{CookmateError, PlannerError};
use crate::models::{ingredient_key, Quantity, Unit};
use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 食材目录条目
///
/// 只描述食材本身，不持有库存数量。`default_unit` 是该食材的主计量单位：
/// 录入菜谱时省略单位即使用它，菜谱和库存中的单位必须与它同族。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub default_unit: Unit,
    /// 条形码、供应商等
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, String>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, default_unit: Unit) -> Self {
        Self {
            name: name.into(),
            default_unit,
            metadata: IndexMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn key(&self) -> String {
        ingredient_key(&self.name)
    }

    pub fn validate(&self) -> Result<(), CookmateError> {
        if self.name.trim().is_empty() {
            return Err(CookmateError::InvalidIngredient {
                name: self.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// 单位必须与默认单位同族
    pub fn check_unit(&self, unit: Unit) -> Result<(), PlannerError> {
        if unit.is_compatible_with(self.default_unit) {
            Ok(())
        } else {
            Err(PlannerError::UnitMismatch {
                ingredient: self.name.clone(),
                expected: self.default_unit,
                found: unit,
            })
        }
    }

    /// 构造数量；未给单位时使用默认单位
    pub fn quantity(&self, amount: BigDecimal, unit: Option<Unit>) -> Result<Quantity, PlannerError> {
        let unit = unit.unwrap_or(self.default_unit);
        self.check_unit(unit)?;
        Quantity::new(amount, unit)
    }
}

/// 录入菜谱食材时的一行：名称、用量、可选单位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientInput {
    pub name: String,
    pub amount: BigDecimal,
    pub unit: Option<Unit>,
}

impl IngredientInput {
    pub fn new(name: impl Into<String>, amount: BigDecimal, unit: Option<Unit>) -> Self {
        Self {
            name: name.into(),
            amount,
            unit,
        }
    }
}

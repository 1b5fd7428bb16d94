use crate::error::{CookmateError, PlannerError};
use crate::models::{ingredient_key, Quantity};
use bigdecimal::{BigDecimal, Zero};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// 菜谱标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(pub String);

impl RecipeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecipeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// 份数：正数，允许小数 (例如 1.5 份)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Servings(BigDecimal);

impl Servings {
    pub fn new(value: BigDecimal) -> Result<Self, PlannerError> {
        if value <= BigDecimal::zero() {
            return Err(PlannerError::InvalidServings(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn whole(count: u32) -> Result<Self, PlannerError> {
        Self::new(BigDecimal::from(count))
    }

    pub fn one() -> Self {
        Self(BigDecimal::from(1))
    }

    pub fn value(&self) -> &BigDecimal {
        &self.0
    }
}

impl Default for Servings {
    fn default() -> Self {
        Self::one()
    }
}

impl fmt::Display for Servings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Servings {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = BigDecimal::from_str(s.trim())
            .map_err(|_| PlannerError::InvalidServings(s.trim().to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<String> for Servings {
    type Error = PlannerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Servings> for String {
    fn from(servings: Servings) -> Self {
        servings.to_string()
    }
}

/// 单份食材需求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientRequirement {
    pub ingredient: String,
    pub quantity: Quantity,
}

impl IngredientRequirement {
    pub fn new(ingredient: impl Into<String>, quantity: Quantity) -> Self {
        Self {
            ingredient: ingredient.into(),
            quantity,
        }
    }

    /// 按份数线性放大用量，单位不变
    pub fn scale(&self, servings: &Servings) -> IngredientRequirement {
        IngredientRequirement {
            ingredient: self.ingredient.clone(),
            quantity: self.quantity.scale(servings.value()),
        }
    }

    pub fn key(&self) -> String {
        ingredient_key(&self.ingredient)
    }
}

/// 菜谱
///
/// 只记录单份的理论用量；实际扣减库存由烹饪流程完成。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub ingredients: Vec<IngredientRequirement>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 附加信息，如难度、时长、标签
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, String>,
}

impl Recipe {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        ingredients: Vec<IngredientRequirement>,
    ) -> Self {
        Self {
            id: RecipeId(id.into()),
            name: name.into(),
            category: None,
            ingredients,
            steps: Vec::new(),
            notes: None,
            metadata: IndexMap::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_steps(mut self, steps: Vec<String>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// 更新备注；空白内容保留原备注
    pub fn update_notes(&mut self, notes: &str) {
        if !notes.trim().is_empty() {
            self.notes = Some(notes.to_string());
        }
    }

    /// 设置单个 metadata 字段 (已存在则覆盖，保持原位置)
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// 校验：名称非空、至少一种食材、食材名不重复 (忽略大小写)
    pub fn validate(&self) -> Result<(), CookmateError> {
        let invalid = |reason: &str| CookmateError::InvalidRecipe {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.ingredients.is_empty() {
            return Err(invalid("at least one ingredient is required"));
        }

        let mut seen = HashSet::new();
        for req in &self.ingredients {
            if req.ingredient.trim().is_empty() {
                return Err(invalid("ingredient name must not be empty"));
            }
            if !seen.insert(req.key()) {
                return Err(invalid(&format!("ingredient '{}' listed twice", req.ingredient)));
            }
        }
        Ok(())
    }

    pub fn requirement(&self, ingredient: &str) -> Option<&IngredientRequirement> {
        let key = ingredient_key(ingredient);
        self.ingredients.iter().find(|r| r.key() == key)
    }

    /// 指定份数下的需求列表
    pub fn scaled(&self, servings: &Servings) -> Vec<IngredientRequirement> {
        self.ingredients.iter().map(|r| r.scale(servings)).collect()
    }
}

use crate::error::Result;
use crate::models::{Ingredient, InventoryEntry, InventorySnapshot, Recipe};
use crate::store::{
    IngredientCatalog, MemoryIngredientCatalog, MemoryInventoryStore, MemoryRecipeStore,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 初始数据：食材目录 + 菜谱 + 库存
///
/// ```json
/// {
///   "ingredients": [{"name": "鸡蛋", "default_unit": "个"}],
///   "recipes": [{"id": "tomato-eggs", "name": "番茄炒蛋",
///                "ingredients": [{"ingredient": "鸡蛋", "quantity": "2 个"}]}],
///   "inventory": [{"ingredient": "鸡蛋", "quantity": "6 个", "expires_on": "2026-11-01"}]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pantry {
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub inventory: Vec<InventoryEntry>,
}

impl Pantry {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// 载入内存仓库；任一菜谱无效或重复即失败
    ///
    /// 目录中登记过的食材，其菜谱用量和库存单位都要与默认单位同族。
    pub fn into_stores(self) -> Result<PantryStores> {
        let ingredients = MemoryIngredientCatalog::new();
        for ingredient in self.ingredients {
            ingredients.add(ingredient)?;
        }

        let recipes = MemoryRecipeStore::new();
        for recipe in self.recipes {
            for req in &recipe.ingredients {
                ingredients.check_unit(&req.ingredient, req.quantity.unit())?;
            }
            recipes.add(recipe)?;
        }

        for entry in &self.inventory {
            ingredients.check_unit(&entry.ingredient, entry.quantity.unit())?;
        }
        // 同名库存先在快照里合并，再写入仓库
        let merged = InventorySnapshot::from_entries(self.inventory)?;
        let inventory = MemoryInventoryStore::with_entries(merged.entries().cloned());
        tracing::info!(
            "载入初始数据: {} 种食材, {} 个菜谱, {} 条库存",
            ingredients.len(),
            recipes.len(),
            inventory.len()
        );
        Ok(PantryStores {
            recipes,
            inventory,
            ingredients,
        })
    }
}

/// `Pantry::into_stores` 的结果
#[derive(Debug)]
pub struct PantryStores {
    pub recipes: MemoryRecipeStore,
    pub inventory: MemoryInventoryStore,
    pub ingredients: MemoryIngredientCatalog,
}

pub mod exchange;
pub mod memory;
pub mod seed;

pub use memory::{MemoryIngredientCatalog, MemoryInventoryStore, MemoryRecipeStore};
pub use seed::{Pantry, PantryStores};

use crate::error::PlannerError;
use crate::models::{
    Ingredient, IngredientRequirement, InventoryEntry, InventorySnapshot, Recipe, RecipeId,
    Servings, Unit,
};

/// 菜谱来源
pub trait RecipeProvider: Send + Sync {
    fn recipe(&self, id: &RecipeId) -> Option<Recipe>;

    fn recipes(&self) -> Vec<Recipe>;

    /// 指定份数下的需求视图
    fn scaled_requirements(
        &self,
        id: &RecipeId,
        servings: &Servings,
    ) -> Option<Vec<IngredientRequirement>> {
        self.recipe(id).map(|r| r.scaled(servings))
    }
}

/// 食材目录
pub trait IngredientCatalog: Send + Sync {
    fn ingredient(&self, name: &str) -> Option<Ingredient>;

    /// 目录中登记过的食材必须使用与默认单位同族的单位；未登记的不检查
    fn check_unit(&self, name: &str, unit: Unit) -> Result<(), PlannerError> {
        match self.ingredient(name) {
            Some(ingredient) => ingredient.check_unit(unit),
            None => Ok(()),
        }
    }
}

/// 库存来源：返回调用时刻的只读快照
pub trait InventoryProvider: Send + Sync {
    fn snapshot(&self) -> Result<InventorySnapshot, PlannerError>;
}

/// 可写库存 (烹饪扣减 / 入库)
pub trait InventoryStore: InventoryProvider {
    fn get(&self, ingredient: &str) -> Option<InventoryEntry>;

    fn upsert(&self, entry: InventoryEntry);

    fn remove(&self, ingredient: &str) -> Option<InventoryEntry>;

    /// 整体扣减：全部足够才写入，否则一条都不改；返回扣减后的条目
    fn consume(&self, items: &[IngredientRequirement]) -> Result<Vec<InventoryEntry>, PlannerError>;
}

impl InventoryProvider for InventorySnapshot {
    fn snapshot(&self) -> Result<InventorySnapshot, PlannerError> {
        Ok(self.clone())
    }
}

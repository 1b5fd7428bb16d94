pub mod ingredient;
pub mod inventory;
pub mod plan;
pub mod quantity;
pub mod recipe;

pub use ingredient::{Ingredient, IngredientInput};
pub use inventory::{InventoryEntry, InventorySnapshot};
pub use plan::{
    CookabilityResult, MissingIngredient, RequirementLedger, ShoppingList, ShoppingListEntry,
    StoreSplit,
};
pub use quantity::{Quantity, Unit, UnitFamily};
pub use recipe::{IngredientRequirement, Recipe, RecipeId, Servings};

/// 食材名匹配键：忽略大小写的精确匹配 (不做模糊 / 同义词匹配)
pub fn ingredient_key(name: &str) -> String {
    name.to_lowercase()
}

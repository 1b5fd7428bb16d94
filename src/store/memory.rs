use crate::error::{CookmateError, PlannerError};
use crate::models::{
    ingredient_key, Ingredient, IngredientInput, IngredientRequirement, InventoryEntry,
    InventorySnapshot, Quantity, Recipe, RecipeId,
};
use crate::store::{IngredientCatalog, InventoryProvider, InventoryStore, RecipeProvider};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use indexmap::IndexMap;
use std::sync::{Mutex, MutexGuard};

/// 内存菜谱仓库
#[derive(Debug, Default)]
pub struct MemoryRecipeStore {
    recipes: DashMap<RecipeId, Recipe>,
}

impl MemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增菜谱；id 或名称重复时报错
    pub fn add(&self, recipe: Recipe) -> Result<(), CookmateError> {
        recipe.validate()?;
        if self.recipes.contains_key(&recipe.id) || self.find_by_name(&recipe.name).is_some() {
            return Err(CookmateError::RecipeAlreadyExists(recipe.name));
        }
        tracing::debug!("新增菜谱 {} ({})", recipe.name, recipe.id);
        self.recipes.insert(recipe.id.clone(), recipe);
        Ok(())
    }

    pub fn update(&self, recipe: Recipe) -> Result<(), CookmateError> {
        recipe.validate()?;
        match self.recipes.get_mut(&recipe.id) {
            Some(mut existing) => {
                *existing = recipe;
                Ok(())
            }
            None => Err(CookmateError::RecipeNotFound(recipe.id)),
        }
    }

    pub fn remove(&self, id: &RecipeId) -> Option<Recipe> {
        self.recipes.remove(id).map(|(_, recipe)| recipe)
    }

    /// 按菜名查找 (忽略大小写)
    pub fn find_by_name(&self, name: &str) -> Option<Recipe> {
        let key = ingredient_key(name.trim());
        self.recipes
            .iter()
            .find(|r| ingredient_key(r.name.trim()) == key)
            .map(|r| r.value().clone())
    }

    /// 按菜名找到菜谱，修改后重新校验再写回
    fn modify_by_name<F>(&self, name: &str, apply: F) -> Result<Recipe, CookmateError>
    where
        F: FnOnce(&mut Recipe) -> Result<(), CookmateError>,
    {
        let mut recipe = self
            .find_by_name(name)
            .ok_or_else(|| CookmateError::RecipeNameNotFound(name.to_string()))?;
        apply(&mut recipe)?;
        recipe.validate()?;
        self.recipes.insert(recipe.id.clone(), recipe.clone());
        Ok(recipe)
    }

    pub fn update_notes(&self, name: &str, notes: &str) -> Result<Recipe, CookmateError> {
        self.modify_by_name(name, |recipe| {
            recipe.update_notes(notes);
            Ok(())
        })
    }

    pub fn update_metadata_field(
        &self,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<Recipe, CookmateError> {
        tracing::debug!("更新菜谱 {} 的 {} = {}", name, key, value);
        self.modify_by_name(name, |recipe| {
            recipe.set_metadata(key, value);
            Ok(())
        })
    }

    /// 整体替换食材列表；每种食材都必须已在目录中登记，省略单位时取默认单位
    pub fn update_ingredients(
        &self,
        name: &str,
        inputs: &[IngredientInput],
        catalog: &dyn IngredientCatalog,
    ) -> Result<Recipe, CookmateError> {
        let ingredients = inputs
            .iter()
            .map(|input| {
                let ingredient = catalog
                    .ingredient(&input.name)
                    .ok_or_else(|| CookmateError::UnknownIngredient(input.name.clone()))?;
                let quantity = ingredient.quantity(input.amount.clone(), input.unit)?;
                Ok(IngredientRequirement::new(ingredient.name, quantity))
            })
            .collect::<Result<Vec<_>, CookmateError>>()?;
        self.modify_by_name(name, |recipe| {
            recipe.ingredients = ingredients;
            Ok(())
        })
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl RecipeProvider for MemoryRecipeStore {
    fn recipe(&self, id: &RecipeId) -> Option<Recipe> {
        self.recipes.get(id).map(|r| r.value().clone())
    }

    /// 按 id 排序，保证输出稳定
    fn recipes(&self) -> Vec<Recipe> {
        let mut all: Vec<Recipe> = self.recipes.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}

/// 内存食材目录 (按食材名忽略大小写唯一)
#[derive(Debug, Default)]
pub struct MemoryIngredientCatalog {
    ingredients: DashMap<String, Ingredient>,
}

impl MemoryIngredientCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, ingredient: Ingredient) -> Result<(), CookmateError> {
        ingredient.validate()?;
        match self.ingredients.entry(ingredient.key()) {
            Entry::Occupied(_) => Err(CookmateError::IngredientAlreadyExists(ingredient.name)),
            Entry::Vacant(slot) => {
                slot.insert(ingredient);
                Ok(())
            }
        }
    }

    pub fn list(&self) -> Vec<Ingredient> {
        let mut all: Vec<Ingredient> = self.ingredients.iter().map(|i| i.value().clone()).collect();
        all.sort_by_key(|i| i.key());
        all
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }
}

impl IngredientCatalog for MemoryIngredientCatalog {
    fn ingredient(&self, name: &str) -> Option<Ingredient> {
        self.ingredients
            .get(&ingredient_key(name))
            .map(|i| i.value().clone())
    }
}

/// 内存库存仓库
///
/// 条目以食材名 (忽略大小写) 为键，每种食材一条。写操作共用一把写锁，
/// 因此一次扣减要么全部生效，要么完全不生效。
#[derive(Debug, Default)]
pub struct MemoryInventoryStore {
    entries: DashMap<String, InventoryEntry>,
    write_lock: Mutex<()>,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = InventoryEntry>,
    {
        let store = Self::new();
        for entry in entries {
            store.upsert(entry);
        }
        store
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn list(&self) -> Vec<InventoryEntry> {
        let mut all: Vec<InventoryEntry> = self.entries.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|e| e.key());
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl InventoryProvider for MemoryInventoryStore {
    fn snapshot(&self) -> Result<InventorySnapshot, PlannerError> {
        let _guard = self.guard();
        InventorySnapshot::from_entries(self.list())
    }
}

impl InventoryStore for MemoryInventoryStore {
    fn get(&self, ingredient: &str) -> Option<InventoryEntry> {
        self.entries
            .get(&ingredient_key(ingredient))
            .map(|e| e.value().clone())
    }

    /// 新增或覆盖 (按食材名唯一)
    fn upsert(&self, entry: InventoryEntry) {
        let _guard = self.guard();
        self.entries.insert(entry.key(), entry);
    }

    fn remove(&self, ingredient: &str) -> Option<InventoryEntry> {
        let _guard = self.guard();
        self.entries
            .remove(&ingredient_key(ingredient))
            .map(|(_, entry)| entry)
    }

    fn consume(&self, items: &[IngredientRequirement]) -> Result<Vec<InventoryEntry>, PlannerError> {
        let _guard = self.guard();

        // 先在暂存表里逐条扣减，全部成功后再写回
        let mut staged: IndexMap<String, InventoryEntry> = IndexMap::new();
        for item in items {
            let key = item.key();
            let current = match staged.get(&key) {
                Some(entry) => entry.clone(),
                None => match self.entries.get(&key) {
                    Some(entry) => entry.value().clone(),
                    None => {
                        return Err(PlannerError::InsufficientQuantity {
                            available: Quantity::zero(item.quantity.unit()),
                            requested: item.quantity.clone(),
                        })
                    }
                },
            };
            let updated = current.consume(&item.quantity)?;
            staged.insert(key, updated);
        }

        for (key, entry) in &staged {
            self.entries.insert(key.clone(), entry.clone());
        }
        Ok(staged.into_values().collect())
    }
}

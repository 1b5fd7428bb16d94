use crate::error::PlannerError;
use crate::models::{
    ingredient_key, IngredientRequirement, InventorySnapshot, Quantity, Recipe, RecipeId, Servings,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 某食材的缺口
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingIngredient {
    pub ingredient: String,
    pub missing: Quantity,
}

/// 单个菜谱的可做判定
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookabilityResult {
    pub recipe_id: RecipeId,
    pub servings: Servings,
    pub cookable: bool,
    /// 不可做时列出 required > available 的食材
    pub missing: Vec<MissingIngredient>,
}

/// 需求汇总表 - 食材 -> 总需求量
///
/// 按首次出现顺序保存；每种食材的规范单位取首次出现时的单位，
/// 之后的同名需求先换算到该单位再累加。
#[derive(Debug, Clone, Default)]
pub struct RequirementLedger {
    totals: IndexMap<String, IngredientRequirement>,
}

impl RequirementLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累加一条 (已缩放的) 需求
    pub fn add(&mut self, req: &IngredientRequirement) -> Result<(), PlannerError> {
        let key = req.key();
        match self.totals.get_mut(&key) {
            Some(total) => {
                total.quantity = total
                    .quantity
                    .try_add(&req.quantity)
                    .map_err(|e| e.for_ingredient(&total.ingredient))?;
            }
            None => {
                self.totals.insert(key, req.clone());
            }
        }
        Ok(())
    }

    /// 把菜谱按份数缩放后并入汇总
    pub fn add_recipe(&mut self, recipe: &Recipe, servings: &Servings) -> Result<(), PlannerError> {
        for req in &recipe.ingredients {
            self.add(&req.scale(servings))?;
        }
        Ok(())
    }

    pub fn total(&self, ingredient: &str) -> Option<&Quantity> {
        self.totals
            .get(&ingredient_key(ingredient))
            .map(|r| &r.quantity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IngredientRequirement> {
        self.totals.values()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// 与库存对比，返回每种食材的净缺口 (只含缺口 > 0 的食材)
    ///
    /// 任一食材单位不兼容即整体失败，不返回部分结果。
    pub fn shortfalls(
        &self,
        inventory: &InventorySnapshot,
    ) -> Result<Vec<MissingIngredient>, PlannerError> {
        let mut missing = Vec::new();
        for req in self.totals.values() {
            let available = inventory.available(&req.ingredient, req.quantity.unit())?;
            let short = req
                .quantity
                .saturating_sub(&available)
                .map_err(|e| e.for_ingredient(&req.ingredient))?;
            if !short.is_zero() {
                missing.push(MissingIngredient {
                    ingredient: req.ingredient.clone(),
                    missing: short,
                });
            }
        }
        Ok(missing)
    }
}

/// 购物清单条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingListEntry {
    pub ingredient: String,
    pub quantity: Quantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

/// 购物清单：默认按食材首次出现顺序排列
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShoppingList {
    pub entries: Vec<ShoppingListEntry>,
}

impl ShoppingList {
    pub fn from_missing(missing: Vec<MissingIngredient>) -> Self {
        let entries = missing
            .into_iter()
            .map(|m| ShoppingListEntry {
                ingredient: m.ingredient,
                quantity: m.missing,
                store: None,
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, ingredient: &str) -> Option<&ShoppingListEntry> {
        let key = ingredient_key(ingredient);
        self.entries
            .iter()
            .find(|e| ingredient_key(&e.ingredient) == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按食材名排序的视图
    pub fn sorted_by_name(&self) -> ShoppingList {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| ingredient_key(&a.ingredient).cmp(&ingredient_key(&b.ingredient)));
        ShoppingList { entries }
    }

    /// 按 食材 -> 商店 映射打上商店标记 (找不到的保持 None)
    pub fn with_stores(&self, stores: &HashMap<String, String>) -> ShoppingList {
        let lookup = normalize_store_map(stores);
        let entries = self
            .entries
            .iter()
            .map(|e| ShoppingListEntry {
                store: lookup.get(&ingredient_key(&e.ingredient)).cloned(),
                ..e.clone()
            })
            .collect();
        ShoppingList { entries }
    }

    /// 按商店拆分清单；纯分组，不重新计算数量
    pub fn split_by_store(&self, stores: &HashMap<String, String>) -> StoreSplit {
        let mut split = StoreSplit::default();
        for entry in self.with_stores(stores).entries {
            match entry.store.clone() {
                Some(store) => split.stores.entry(store).or_default().push(entry),
                None => split.unassigned.push(entry),
            }
        }
        split
    }
}

/// 食材名按小写归一；仅大小写不同的多个键取原始名排序最小者
fn normalize_store_map(stores: &HashMap<String, String>) -> HashMap<String, String> {
    let mut names: Vec<&String> = stores.keys().collect();
    names.sort();
    let mut lookup: HashMap<String, String> = HashMap::with_capacity(stores.len());
    for name in names {
        let store = &stores[name];
        match lookup.get(&ingredient_key(name)) {
            Some(chosen) if chosen != store => {
                tracing::warn!("食材 {} 的商店映射冲突，保留 {}，忽略 {}", name, chosen, store);
            }
            Some(_) => {}
            None => {
                lookup.insert(ingredient_key(name), store.clone());
            }
        }
    }
    lookup
}

/// 按商店拆分后的购物清单
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreSplit {
    /// 商店 -> 条目；商店按首次出现顺序
    pub stores: IndexMap<String, Vec<ShoppingListEntry>>,
    /// 没有商店映射的条目
    pub unassigned: Vec<ShoppingListEntry>,
}

impl StoreSplit {
    pub fn store(&self, name: &str) -> &[ShoppingListEntry] {
        self.stores.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_entries(&self) -> usize {
        self.stores.values().map(Vec::len).sum::<usize>() + self.unassigned.len()
    }
}

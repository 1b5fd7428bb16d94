use crate::error::{CookmateError, PlannerError, Result};
use crate::models::{
    CookabilityResult, InventorySnapshot, Recipe, RecipeId, RequirementLedger, Servings,
    ShoppingList,
};
use crate::store::{InventoryProvider, RecipeProvider};
use indexmap::IndexMap;
use rayon::prelude::*;
use std::sync::Arc;

/// 单个菜谱在指定份数下能否用当前库存做出
///
/// 同一菜谱里重复出现的食材先合并再比较；过期库存仍计入可用量。
pub fn check_cookability(
    recipe: &Recipe,
    servings: &Servings,
    inventory: &InventorySnapshot,
) -> Result<CookabilityResult, PlannerError> {
    let mut ledger = RequirementLedger::new();
    ledger.add_recipe(recipe, servings)?;
    let missing = ledger.shortfalls(inventory)?;
    Ok(CookabilityResult {
        recipe_id: recipe.id.clone(),
        servings: servings.clone(),
        cookable: missing.is_empty(),
        missing,
    })
}

/// 筛出可做的菜谱，保持输入顺序
///
/// 各菜谱互不依赖，在快照上并行判定；任一菜谱单位不兼容则整体失败。
pub fn filter_cookable<'a>(
    recipes: &'a [Recipe],
    servings: &Servings,
    inventory: &InventorySnapshot,
) -> Result<Vec<&'a Recipe>, PlannerError> {
    let verdicts: Vec<bool> = recipes
        .par_iter()
        .map(|r| check_cookability(r, servings, inventory).map(|c| c.cookable))
        .collect::<Result<_, _>>()?;

    Ok(recipes
        .iter()
        .zip(verdicts)
        .filter_map(|(recipe, ok)| ok.then_some(recipe))
        .collect())
}

/// 汇总多个 (菜谱, 份数) 的总需求，扣掉库存后生成购物清单
pub fn build_shopping_list(
    selections: &[(&Recipe, Servings)],
    inventory: &InventorySnapshot,
) -> Result<ShoppingList, PlannerError> {
    let mut ledger = RequirementLedger::new();
    for (recipe, servings) in selections {
        ledger.add_recipe(recipe, servings)?;
    }
    Ok(ShoppingList::from_missing(ledger.shortfalls(inventory)?))
}

/// 规划服务：每次调用取一份库存快照，规划本身不修改库存
pub struct PlannerService {
    recipes: Arc<dyn RecipeProvider>,
    inventory: Arc<dyn InventoryProvider>,
}

impl PlannerService {
    pub fn new(recipes: Arc<dyn RecipeProvider>, inventory: Arc<dyn InventoryProvider>) -> Self {
        Self { recipes, inventory }
    }

    fn find(&self, id: &RecipeId) -> Result<Recipe> {
        self.recipes
            .recipe(id)
            .ok_or_else(|| CookmateError::RecipeNotFound(id.clone()))
    }

    pub fn check(&self, id: &RecipeId, servings: &Servings) -> Result<CookabilityResult> {
        let recipe = self.find(id)?;
        let snapshot = self.inventory.snapshot()?;
        let result = check_cookability(&recipe, servings, &snapshot)?;
        if result.cookable {
            tracing::info!("菜谱 {} x{} 可做", recipe.name, servings);
        } else {
            tracing::warn!(
                "菜谱 {} x{} 缺 {} 种食材",
                recipe.name,
                servings,
                result.missing.len()
            );
        }
        Ok(result)
    }

    /// 全部菜谱中当前可做的 (按 id 排序)
    pub fn cookable_recipes(&self, servings: &Servings) -> Result<Vec<Recipe>> {
        let all = self.recipes.recipes();
        let snapshot = self.inventory.snapshot()?;
        let cookable: Vec<Recipe> = filter_cookable(&all, servings, &snapshot)
            .map_err(|e| {
                tracing::warn!("可做菜谱筛选失败: {}", e);
                e
            })?
            .into_iter()
            .cloned()
            .collect();
        tracing::info!("{} 个菜谱中 {} 个可做", all.len(), cookable.len());
        Ok(cookable)
    }

    /// 按计划 (菜谱 id -> 份数，保序) 生成购物清单
    pub fn shopping_list(&self, plan: &IndexMap<RecipeId, Servings>) -> Result<ShoppingList> {
        let recipes = plan
            .iter()
            .map(|(id, servings)| Ok((self.find(id)?, servings.clone())))
            .collect::<Result<Vec<_>>>()?;
        let selections: Vec<(&Recipe, Servings)> =
            recipes.iter().map(|(r, s)| (r, s.clone())).collect();

        let snapshot = self.inventory.snapshot()?;
        let list = build_shopping_list(&selections, &snapshot)?;
        tracing::info!("计划 {} 个菜谱, 需采购 {} 种食材", plan.len(), list.len());
        for entry in &list.entries {
            tracing::debug!("  {} {}", entry.ingredient, entry.quantity);
        }
        Ok(list)
    }

    /// 所有菜谱各做 `servings` 份所需的购物清单
    pub fn shopping_list_for_all(&self, servings: &Servings) -> Result<ShoppingList> {
        let plan: IndexMap<RecipeId, Servings> = self
            .recipes
            .recipes()
            .into_iter()
            .map(|r| (r.id, servings.clone()))
            .collect();
        self.shopping_list(&plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IngredientRequirement, InventoryEntry, MissingIngredient, Quantity, Unit};
    use crate::store::MemoryRecipeStore;

    fn req(name: &str, q: &str) -> IngredientRequirement {
        IngredientRequirement::new(name, q.parse().unwrap())
    }

    fn tomato_eggs() -> Recipe {
        Recipe::new(
            "tomato-eggs",
            "番茄炒蛋",
            vec![req("鸡蛋", "2 个"), req("番茄", "150 g")],
        )
    }

    fn snapshot(entries: &[(&str, &str)]) -> InventorySnapshot {
        InventorySnapshot::from_entries(
            entries
                .iter()
                .map(|(n, q)| InventoryEntry::new(*n, q.parse().unwrap())),
        )
        .unwrap()
    }

    #[test]
    fn reports_missing_eggs() {
        let inv = snapshot(&[("鸡蛋", "1 个"), ("番茄", "200 g")]);
        let result = check_cookability(&tomato_eggs(), &Servings::one(), &inv).unwrap();
        assert!(!result.cookable);
        assert_eq!(
            result.missing,
            vec![MissingIngredient {
                ingredient: "鸡蛋".to_string(),
                missing: Quantity::whole(1, Unit::Piece),
            }]
        );
    }

    #[test]
    fn double_servings_fit_larger_stock() {
        let inv = snapshot(&[("鸡蛋", "6 个"), ("番茄", "500 g")]);
        let two = Servings::whole(2).unwrap();
        assert!(check_cookability(&tomato_eggs(), &two, &inv).unwrap().cookable);
    }

    #[test]
    fn lookup_ignores_case_and_converts_units() {
        let recipe = Recipe::new("pancake", "Pancake", vec![req("Flour", "250 g"), req("milk", "300 ml")]);
        let inv = snapshot(&[("flour", "0.5 kg"), ("MILK", "0.2 l")]);
        let result = check_cookability(&recipe, &Servings::one(), &inv).unwrap();
        assert_eq!(
            result.missing,
            vec![MissingIngredient {
                ingredient: "milk".to_string(),
                missing: Quantity::whole(100, Unit::Milliliter),
            }]
        );
    }

    #[test]
    fn mismatched_units_fail() {
        let recipe = Recipe::new("bread", "面包", vec![req("面粉", "200 g")]);
        let inv = snapshot(&[("面粉", "3 个")]);
        let err = check_cookability(&recipe, &Servings::one(), &inv).unwrap_err();
        assert!(matches!(err, PlannerError::UnitMismatch { ref ingredient, .. } if ingredient == "面粉"));
    }

    #[test]
    fn filter_keeps_input_order() {
        let recipes = vec![
            Recipe::new("c", "米饭", vec![req("米", "100 g")]),
            tomato_eggs(),
            Recipe::new("a", "白粥", vec![req("米", "50 g")]),
        ];
        let inv = snapshot(&[("米", "200 g"), ("鸡蛋", "1 个")]);
        let ids: Vec<_> = filter_cookable(&recipes, &Servings::one(), &inv)
            .unwrap()
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn filter_aborts_on_any_mismatch() {
        let recipes = vec![
            Recipe::new("a", "白粥", vec![req("米", "50 g")]),
            Recipe::new("b", "面包", vec![req("面粉", "200 g")]),
        ];
        let inv = snapshot(&[("米", "200 g"), ("面粉", "3 个")]);
        assert!(filter_cookable(&recipes, &Servings::one(), &inv).is_err());
    }

    #[test]
    fn soy_sauce_only_appears_once_total_exceeds_stock() {
        let a = Recipe::new("a", "凉拌黄瓜", vec![req("酱油", "10 ml")]);
        let b = Recipe::new("b", "红烧肉", vec![req("酱油", "20 ml")]);
        let c = Recipe::new("c", "卤蛋", vec![req("酱油", "40 ml")]);
        let inv = snapshot(&[("酱油", "50 ml")]);
        let one = Servings::one();

        let list = build_shopping_list(&[(&a, one.clone()), (&b, one.clone())], &inv).unwrap();
        assert!(list.is_empty());

        let list =
            build_shopping_list(&[(&a, one.clone()), (&b, one.clone()), (&c, one)], &inv).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(
            list.get("酱油").unwrap().quantity,
            Quantity::whole(20, Unit::Milliliter)
        );
    }

    #[test]
    fn service_resolves_plan_and_rejects_unknown_ids() {
        let store = MemoryRecipeStore::new();
        store.add(Recipe::new("a", "蒸饺", vec![req("面粉", "200 g")])).unwrap();
        store.add(Recipe::new("b", "面条", vec![req("面粉", "300 g")])).unwrap();
        let service = PlannerService::new(
            Arc::new(store),
            Arc::new(snapshot(&[("面粉", "400 g")])),
        );

        let list = service.shopping_list_for_all(&Servings::one()).unwrap();
        assert_eq!(list.get("面粉").unwrap().quantity, Quantity::whole(100, Unit::Gram));

        let mut plan = IndexMap::new();
        plan.insert(RecipeId::from("nope"), Servings::one());
        assert!(matches!(
            service.shopping_list(&plan),
            Err(CookmateError::RecipeNotFound(_))
        ));
        assert!(matches!(
            service.check(&RecipeId::from("nope"), &Servings::one()),
            Err(CookmateError::RecipeNotFound(_))
        ));

        let cookable = service.cookable_recipes(&Servings::one()).unwrap();
        let ids: Vec<_> = cookable.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn tiny_shortfall_never_reads_as_zero() {
        use crate::store::exchange;
        use bigdecimal::{BigDecimal, Zero};
        use std::str::FromStr;

        // 1 oz = 28.349523125 g
        let recipe = Recipe::new("stew", "炖肉", vec![req("肉", "1 oz")]);
        let inv = snapshot(&[("肉", "28.3495 g")]);
        let result = check_cookability(&recipe, &Servings::one(), &inv).unwrap();
        assert!(!result.cookable);
        assert_eq!(result.missing[0].missing.to_string(), "0.001 oz");

        let list = build_shopping_list(&[(&recipe, Servings::one())], &inv).unwrap();
        let mut out = Vec::new();
        exchange::write_shopping_list(&list, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let row = text.lines().nth(1).unwrap();
        let amount = row.split(',').nth(1).unwrap();
        assert!(row.starts_with("肉,") && row.ends_with(",oz,"));
        assert!(BigDecimal::from_str(amount).unwrap() > BigDecimal::zero());
        assert_eq!(BigDecimal::from_str(amount).unwrap(), *list.entries[0].quantity.amount());
    }
}

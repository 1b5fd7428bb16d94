use crate::error::{CookmateError, PlannerError, Result};
use crate::events::{DomainEvent, EventBus, InventoryLow, RecipeCooked};
use crate::models::{InventorySnapshot, RecipeId, Servings};
use crate::service::planner::check_cookability;
use crate::service::report::LowStockThresholds;
use crate::store::{InventoryStore, RecipeProvider};
use chrono::Utc;
use std::sync::Arc;

/// 烹饪流程：校验库存 -> 扣减 -> 发布事件
pub struct CookService {
    recipes: Arc<dyn RecipeProvider>,
    inventory: Arc<dyn InventoryStore>,
    events: Arc<dyn EventBus>,
    thresholds: LowStockThresholds,
}

impl CookService {
    pub fn new(
        recipes: Arc<dyn RecipeProvider>,
        inventory: Arc<dyn InventoryStore>,
        events: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            recipes,
            inventory,
            events,
            thresholds: LowStockThresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: LowStockThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// 按份数做一道菜
    ///
    /// 库存不足时返回 `InsufficientInventory`，库存和事件都不变。
    pub fn cook(&self, id: &RecipeId, servings: &Servings) -> Result<RecipeCooked> {
        let recipe = self
            .recipes
            .recipe(id)
            .ok_or_else(|| CookmateError::RecipeNotFound(id.clone()))?;

        let snapshot = self.inventory.snapshot()?;
        let check = check_cookability(&recipe, servings, &snapshot)?;
        if !check.cookable {
            tracing::warn!("库存不足, 无法烹饪 {} x{}", recipe.name, servings);
            return Err(CookmateError::InsufficientInventory {
                recipe: recipe.id,
                missing: check.missing,
            });
        }

        let consumed = recipe.scaled(servings);
        let updated = match self.inventory.consume(&consumed) {
            Ok(updated) => updated,
            // 快照之后库存被并发扣减，consume 整体未生效；按当前库存重新给出缺口
            Err(PlannerError::InsufficientQuantity { .. }) => {
                let current = InventorySnapshot::from_entries(
                    consumed
                        .iter()
                        .filter_map(|req| self.inventory.get(&req.ingredient)),
                )?;
                let check = check_cookability(&recipe, servings, &current)?;
                tracing::warn!("扣减时库存已变化, 无法烹饪 {} x{}", recipe.name, servings);
                return Err(CookmateError::InsufficientInventory {
                    recipe: recipe.id,
                    missing: check.missing,
                });
            }
            Err(err) => return Err(err.into()),
        };

        let cooked = RecipeCooked {
            recipe_id: recipe.id.clone(),
            servings: servings.clone(),
            consumed,
            occurred_on: Utc::now(),
        };
        self.events.publish(&DomainEvent::RecipeCooked(cooked.clone()));
        tracing::info!("已烹饪 {} x{}, 扣减 {} 种食材", recipe.name, servings, updated.len());

        for entry in &updated {
            if let Some(threshold) = self.thresholds.breached_by(entry)? {
                tracing::warn!("{} 库存偏低: {} (阈值 {})", entry.ingredient, entry.quantity, threshold);
                self.events.publish(&DomainEvent::InventoryLow(InventoryLow {
                    ingredient: entry.ingredient.clone(),
                    current: entry.quantity.clone(),
                    threshold,
                    occurred_on: cooked.occurred_on,
                }));
            }
        }

        Ok(cooked)
    }
}

use crate::models::{IngredientRequirement, Quantity, RecipeId, Servings};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

/// 成功烹饪某道菜谱后发布
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeCooked {
    pub recipe_id: RecipeId,
    pub servings: Servings,
    /// 本次烹饪扣减的食材及数量
    pub consumed: Vec<IngredientRequirement>,
    pub occurred_on: DateTime<Utc>,
}

/// 库存低于阈值时发布
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryLow {
    pub ingredient: String,
    pub current: Quantity,
    pub threshold: Quantity,
    pub occurred_on: DateTime<Utc>,
}

/// 领域事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event_type")]
pub enum DomainEvent {
    RecipeCooked(RecipeCooked),
    InventoryLow(InventoryLow),
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::RecipeCooked(_) => "RecipeCooked",
            DomainEvent::InventoryLow(_) => "InventoryLow",
        }
    }
}

/// 事件总线
pub trait EventBus: Send + Sync {
    fn publish(&self, event: &DomainEvent);
}

/// 什么也不做
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn publish(&self, _event: &DomainEvent) {}
}

/// 把事件序列化后写入日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventBus;

impl EventBus for TracingEventBus {
    fn publish(&self, event: &DomainEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => tracing::info!(event = event.name(), "event: {}", payload),
            Err(e) => tracing::warn!(event = event.name(), "event serialization failed: {}", e),
        }
    }
}

/// 进程内收集事件，便于检查已发布的内容
#[derive(Debug, Default)]
pub struct RecordingEventBus {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl EventBus for RecordingEventBus {
    fn publish(&self, event: &DomainEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}

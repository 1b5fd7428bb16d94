use crate::models::{MissingIngredient, Quantity, RecipeId, Unit};
use thiserror::Error;

/// 规划器错误 (单位换算 / 份数 / 用量)
///
/// 全部是数据正确性错误：同步返回给调用方，不重试，也不返回部分结果。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    /// 两个数量的单位不属于同一换算族 (例如 质量 vs 计数)
    #[error("cannot combine {from} with {to}: units belong to different families")]
    IncompatibleUnit { from: Unit, to: Unit },

    /// 同一食材在菜谱/库存或多个菜谱之间使用了不可换算的单位
    #[error("ingredient '{ingredient}' is recorded as {expected} and {found}, which cannot be converted")]
    UnitMismatch {
        ingredient: String,
        expected: Unit,
        found: Unit,
    },

    /// 份数非正数或无法解析
    #[error("invalid servings '{0}': must be a positive number")]
    InvalidServings(String),

    /// 严格减法结果为负
    #[error("insufficient quantity: have {available}, need {requested}")]
    InsufficientQuantity {
        available: Quantity,
        requested: Quantity,
    },

    #[error("unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("invalid quantity '{0}'")]
    InvalidQuantity(String),
}

impl PlannerError {
    /// 把数量层面的单位错误提升为带食材名的 `UnitMismatch`
    pub fn for_ingredient(self, ingredient: &str) -> Self {
        match self {
            PlannerError::IncompatibleUnit { from, to } => PlannerError::UnitMismatch {
                ingredient: ingredient.to_string(),
                expected: to,
                found: from,
            },
            other => other,
        }
    }
}

/// 应用层错误 (服务 / 仓库 / 数据交换)
#[derive(Debug, Error)]
pub enum CookmateError {
    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error("recipe '{0}' not found")]
    RecipeNotFound(RecipeId),

    #[error("no recipe named '{0}'")]
    RecipeNameNotFound(String),

    #[error("recipe '{0}' already exists")]
    RecipeAlreadyExists(String),

    #[error("invalid recipe '{name}': {reason}")]
    InvalidRecipe { name: String, reason: String },

    #[error("ingredient '{0}' is not in the catalog")]
    UnknownIngredient(String),

    #[error("ingredient '{0}' already exists")]
    IngredientAlreadyExists(String),

    #[error("invalid ingredient '{name}': {reason}")]
    InvalidIngredient { name: String, reason: String },

    #[error("invalid configuration value for '{key}': '{value}'")]
    InvalidConfig { key: String, value: String },

    #[error("not enough stock to cook '{recipe}': {} ingredient(s) short", .missing.len())]
    InsufficientInventory {
        recipe: RecipeId,
        missing: Vec<MissingIngredient>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

pub type Result<T, E = CookmateError> = std::result::Result<T, E>;

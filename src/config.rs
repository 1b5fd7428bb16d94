use crate::error::{CookmateError, PlannerError, Result};
use crate::models::{Quantity, RecipeId, Servings};
use crate::service::LowStockThresholds;
use ::config::{Config, Environment, File};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::Level;

/// 应用配置
///
/// 加载顺序：默认值 -> `cookmate.toml` (可选) -> `COOKMATE__*` 环境变量，
/// 例如 `COOKMATE__LOG__LEVEL=debug`。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub planner: PlannerConfig,
    pub inventory: InventoryConfig,
    /// 食材 -> 商店
    pub stores: HashMap<String, String>,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// 初始数据 (JSON)
    pub seed_path: String,
    /// 购物清单 CSV 输出路径；不设置则不导出
    pub export_path: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            seed_path: "data/pantry.json".to_string(),
            export_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub default_servings: String,
    /// 采购计划；为空时按所有菜谱各 `default_servings` 份计算
    pub plan: Vec<PlanEntry>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_servings: "1".to_string(),
            plan: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    pub recipe: String,
    pub servings: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub expiring_within_days: u32,
    /// 每个单位族一个阈值，如 "50 g"、"2 pcs"
    pub low_stock: Vec<String>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            expiring_within_days: 3,
            low_stock: vec!["50 g".to_string(), "100 ml".to_string(), "2 pcs".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// 从工作目录下的 `cookmate.toml` 和环境变量加载
    pub fn load() -> Result<Self> {
        Self::build(File::with_name("cookmate").required(false))
    }

    /// 从指定文件加载 (格式按扩展名推断)，环境变量仍然生效
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(File::from(path.as_ref()).required(true))
    }

    fn build<S>(file: S) -> Result<Self>
    where
        S: ::config::Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("COOKMATE").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// 日志级别 (trace/debug/info/warn/error，不区分大小写)
    pub fn log_level(&self) -> Result<Level> {
        Level::from_str(self.log.level.trim()).map_err(|_| CookmateError::InvalidConfig {
            key: "log.level".to_string(),
            value: self.log.level.clone(),
        })
    }

    pub fn default_servings(&self) -> Result<Servings, PlannerError> {
        self.planner.default_servings.parse()
    }

    /// 配置中的采购计划 (保持配置顺序；同一菜谱出现多次时份数相加)
    pub fn plan(&self) -> Result<IndexMap<RecipeId, Servings>, PlannerError> {
        let mut plan: IndexMap<RecipeId, Servings> = IndexMap::new();
        for entry in &self.planner.plan {
            let servings: Servings = entry.servings.parse()?;
            let id = RecipeId(entry.recipe.trim().to_string());
            let total = match plan.get(&id) {
                Some(existing) => Servings::new(existing.value() + servings.value())?,
                None => servings,
            };
            plan.insert(id, total);
        }
        Ok(plan)
    }

    pub fn low_stock_thresholds(&self) -> Result<LowStockThresholds, PlannerError> {
        let quantities = self
            .inventory
            .low_stock
            .iter()
            .map(|text| text.parse::<Quantity>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LowStockThresholds::from_quantities(quantities))
    }
}

use chrono::Local;
use cookmate::service::{expired, expiring_soon, low_stock};
use cookmate::store::{exchange, InventoryProvider};
use cookmate::store::PantryStores;
use cookmate::{AppConfig, Pantry, PlannerService};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载配置 (日志级别也来自配置)
    let config = AppConfig::load()?;
    let level = config.log_level()?;

    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .with_max_level(level)
        .init();
    info!("Starting with config: {:?}", config);

    // 载入初始数据
    let PantryStores {
        recipes,
        inventory,
        ingredients,
    } = Pantry::from_path(&config.data.seed_path)?.into_stores()?;
    info!("食材目录 {} 种", ingredients.len());
    let inventory = Arc::new(inventory);
    let planner = PlannerService::new(Arc::new(recipes), inventory.clone());

    // 1. 当前可做的菜谱
    let servings = config.default_servings()?;
    for recipe in planner.cookable_recipes(&servings)? {
        info!("  可做: {} ({})", recipe.name, recipe.id);
    }

    // 2. 采购计划 -> 购物清单
    let plan = config.plan()?;
    let list = if plan.is_empty() {
        planner.shopping_list_for_all(&servings)?
    } else {
        planner.shopping_list(&plan)?
    };

    // 3. 按商店拆分
    let split = list.split_by_store(&config.stores);
    for (store, entries) in &split.stores {
        info!("{}:", store);
        for entry in entries {
            info!("  {} {}", entry.ingredient, entry.quantity);
        }
    }
    if !split.unassigned.is_empty() {
        info!("未分配商店:");
        for entry in &split.unassigned {
            info!("  {} {}", entry.ingredient, entry.quantity);
        }
    }

    if let Some(path) = &config.data.export_path {
        let file = std::fs::File::create(path)?;
        exchange::write_shopping_list(&list.with_stores(&config.stores), file)?;
        info!("购物清单已写入 {}", path);
    }

    // 4. 库存报告
    let snapshot = inventory.snapshot()?;
    let today = Local::now().date_naive();
    for entry in expired(&snapshot, today) {
        warn!("已过期: {} {}", entry.ingredient, entry.quantity);
    }
    for entry in expiring_soon(&snapshot, today, config.inventory.expiring_within_days) {
        info!("即将过期: {} {}", entry.ingredient, entry.quantity);
    }
    for item in low_stock(&snapshot, &config.low_stock_thresholds()?)? {
        warn!("库存偏低: {} {} (阈值 {})", item.ingredient, item.current, item.threshold);
    }

    Ok(())
}

pub mod cook;
pub mod planner;
pub mod report;

pub use cook::CookService;
pub use planner::{build_shopping_list, check_cookability, filter_cookable, PlannerService};
pub use report::{expired, expiring_soon, low_stock, LowStockItem, LowStockThresholds};

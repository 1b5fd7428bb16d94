pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod service;
pub mod store;

pub use config::AppConfig;
pub use error::{CookmateError, PlannerError, Result};
pub use service::{CookService, PlannerService};
pub use store::{MemoryInventoryStore, MemoryRecipeStore, Pantry};

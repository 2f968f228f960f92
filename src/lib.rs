pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod seed;

pub use config::Config;
pub use error::{GeoError, Result};
pub use models::{Area, City, District, EntityLevel, Neighborhood};
pub use seed::{HierarchySeeder, SeedState, SeedSummary};

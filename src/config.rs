use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::db::InsertRow;
use crate::models::{City, District, EntityLevel, Neighborhood};

/// Upper bound for `seeding.batch_size`.
///
/// A neighborhood row binds 7 parameters; SQLite caps a statement at 32766.
pub const MAX_BATCH_SIZE: usize = 4000;

/// SQLite's default limit on bound parameters per statement
pub const MAX_STATEMENT_PARAMS: usize = 32766;

/// Largest chunk a single multi-row insert for `level` can carry
pub fn max_chunk_size(level: EntityLevel) -> usize {
    match level {
        EntityLevel::City => MAX_STATEMENT_PARAMS / City::COLUMNS.len(),
        EntityLevel::District => MAX_STATEMENT_PARAMS / District::COLUMNS.len(),
        EntityLevel::Neighborhood => {
            MAX_BATCH_SIZE.min(MAX_STATEMENT_PARAMS / Neighborhood::COLUMNS.len())
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root directory holding cities.json, districts.json and neighborhoods/
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub tables: TableNames,
    #[serde(default)]
    pub seeding: SeedingConfig,
}

/// Target table names, one per entity level
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableNames {
    #[serde(default = "default_cities_table")]
    pub cities: String,
    #[serde(default = "default_districts_table")]
    pub districts: String,
    #[serde(default = "default_neighborhoods_table")]
    pub neighborhoods: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            cities: default_cities_table(),
            districts: default_districts_table(),
            neighborhoods: default_neighborhoods_table(),
        }
    }
}

impl TableNames {
    /// Resolve the table name for a level
    pub fn for_level(&self, level: EntityLevel) -> &str {
        match level {
            EntityLevel::City => &self.cities,
            EntityLevel::District => &self.districts,
            EntityLevel::Neighborhood => &self.neighborhoods,
        }
    }
}

/// Seeding behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct SeedingConfig {
    /// Chunk size for neighborhood inserts
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
    #[serde(default = "default_city_chunk_size")]
    pub city_chunk_size: usize,
    #[serde(default = "default_district_chunk_size")]
    pub district_chunk_size: usize,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            show_progress: default_show_progress(),
            city_chunk_size: default_city_chunk_size(),
            district_chunk_size: default_district_chunk_size(),
        }
    }
}

impl SeedingConfig {
    /// Maximum rows per insert statement for a level
    pub fn chunk_size(&self, level: EntityLevel) -> usize {
        match level {
            EntityLevel::City => self.city_chunk_size,
            EntityLevel::District => self.district_chunk_size,
            EntityLevel::Neighborhood => self.batch_size,
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/turkey-geo")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("turkey-geo.db")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cities_table() -> String {
    EntityLevel::City.plural().to_string()
}

fn default_districts_table() -> String {
    EntityLevel::District.plural().to_string()
}

fn default_neighborhoods_table() -> String {
    EntityLevel::Neighborhood.plural().to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_show_progress() -> bool {
    true
}

fn default_city_chunk_size() -> usize {
    1000
}

fn default_district_chunk_size() -> usize {
    500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            db_path: default_db_path(),
            log_level: default_log_level(),
            tables: TableNames::default(),
            seeding: SeedingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in TURKEY_GEO_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = std::env::var("TURKEY_GEO_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        Self::load_from(&config_path)
    }

    /// Load and validate configuration from an explicit path
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config = Self::from_toml_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        for level in EntityLevel::ALL {
            if self.seeding.chunk_size(level) == 0 {
                anyhow::bail!("chunk size for {} must be greater than 0", level);
            }
        }

        for (level, key) in [
            (EntityLevel::City, "city_chunk_size"),
            (EntityLevel::District, "district_chunk_size"),
            (EntityLevel::Neighborhood, "batch_size"),
        ] {
            let size = self.seeding.chunk_size(level);
            let max = max_chunk_size(level);
            if size > max {
                anyhow::bail!("seeding.{} must be at most {} (got {})", key, max, size);
            }
        }

        for level in EntityLevel::ALL {
            if self.tables.for_level(level).trim().is_empty() {
                anyhow::bail!("tables.{} must not be empty", level);
            }
        }

        let t = &self.tables;
        if t.cities == t.districts || t.cities == t.neighborhoods || t.districts == t.neighborhoods {
            anyhow::bail!("tables.cities, tables.districts and tables.neighborhoods must be distinct");
        }

        Ok(())
    }

    /// Get database path
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Get the data root path
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn cities_file(&self) -> PathBuf {
        self.data_path.join("cities.json")
    }

    pub fn districts_file(&self) -> PathBuf {
        self.data_path.join("districts.json")
    }

    pub fn neighborhoods_dir(&self) -> PathBuf {
        self.data_path.join("neighborhoods")
    }
}

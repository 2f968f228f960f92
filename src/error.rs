use std::path::PathBuf;
use thiserror::Error;

use crate::models::EntityLevel;
use crate::seed::SeedState;

/// Main error type for turkey-geo
#[derive(Error, Debug)]
pub enum GeoError {
    /// Database-related errors outside of a bulk insert
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source file or directory for a level is absent
    #[error("Source for {level} not found at {}", .path.display())]
    SourceNotFound { level: EntityLevel, path: PathBuf },

    /// Required top-level collection is missing or has zero records
    #[error("No {level} data found in {}", .path.display())]
    EmptyDataSet { level: EntityLevel, path: PathBuf },

    /// Malformed JSON or unexpected document shape
    #[error("Parse error in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// Required field absent (or null) in a source record
    #[error("Missing field `{field}` in {level} record {index} of {}", .path.display())]
    MissingField {
        level: EntityLevel,
        path: PathBuf,
        index: usize,
        field: &'static str,
    },

    /// Field present with the wrong JSON type
    #[error(
        "Invalid field `{field}` in {level} record {index} of {}: expected {expected}",
        .path.display()
    )]
    InvalidField {
        level: EntityLevel,
        path: PathBuf,
        index: usize,
        field: &'static str,
        expected: &'static str,
    },

    /// Duplicate id or dangling foreign key
    #[error("Constraint violation in {level} chunk {chunk} (table `{table}`): {message}")]
    ConstraintViolation {
        level: EntityLevel,
        table: String,
        chunk: usize,
        message: String,
    },

    /// Generic backend failure while writing a level
    #[error("Insert error for {level}{} (table `{table}`): {message}", chunk_label(.chunk))]
    Insert {
        level: EntityLevel,
        table: String,
        chunk: Option<usize>,
        message: String,
    },

    /// Seeder invoked outside of its idle state
    #[error("Seeder cannot run from state {state:?}")]
    InvalidState { state: SeedState },
}

fn chunk_label(chunk: &Option<usize>) -> String {
    match chunk {
        Some(idx) => format!(" chunk {}", idx),
        None => String::new(),
    }
}

impl GeoError {
    /// Entity level the error is attributed to, when there is one
    pub fn level(&self) -> Option<EntityLevel> {
        match self {
            GeoError::SourceNotFound { level, .. }
            | GeoError::EmptyDataSet { level, .. }
            | GeoError::MissingField { level, .. }
            | GeoError::InvalidField { level, .. }
            | GeoError::ConstraintViolation { level, .. }
            | GeoError::Insert { level, .. } => Some(*level),
            _ => None,
        }
    }
}

/// Convenient Result type using GeoError
pub type Result<T> = std::result::Result<T, GeoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GeoError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_error_from_rusqlite() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let geo_err: GeoError = rusqlite_err.into();
        assert!(matches!(geo_err, GeoError::Database(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let geo_err: GeoError = io_err.into();
        assert!(matches!(geo_err, GeoError::Io(_)));
    }

    #[test]
    fn test_source_not_found_carries_path() {
        let err = GeoError::SourceNotFound {
            level: EntityLevel::District,
            path: PathBuf::from("/data/districts.json"),
        };
        let msg = err.to_string();
        assert!(msg.contains("districts"));
        assert!(msg.contains("/data/districts.json"));
        assert_eq!(err.level(), Some(EntityLevel::District));
    }

    #[test]
    fn test_insert_error_chunk_label() {
        let with_chunk = GeoError::Insert {
            level: EntityLevel::Neighborhood,
            table: "neighborhoods".to_string(),
            chunk: Some(3),
            message: "disk I/O error".to_string(),
        };
        assert!(with_chunk.to_string().contains("neighborhoods chunk 3"));

        let without_chunk = GeoError::Insert {
            level: EntityLevel::City,
            table: "cities".to_string(),
            chunk: None,
            message: "database is locked".to_string(),
        };
        assert!(!without_chunk.to_string().contains("chunk"));
    }

    #[test]
    fn test_missing_field_display() {
        let err = GeoError::MissingField {
            level: EntityLevel::City,
            path: PathBuf::from("cities.json"),
            index: 4,
            field: "name",
        };
        let msg = err.to_string();
        assert!(msg.contains("`name`"));
        assert!(msg.contains("record 4"));
        assert!(msg.contains("cities.json"));
    }
}

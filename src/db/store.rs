//! Bulk-write boundary between the seeding pipeline and the store.
//!
//! [`BulkStore`] is the only write capability the seeder needs: open one
//! transaction for an entity level, push multi-row inserts into it, then
//! commit or roll back. [`SqliteStore`] implements it over a borrowed
//! [`rusqlite::Connection`].

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode};
use thiserror::Error;

use super::encode::{encode_area, encode_opt_text, encode_timestamp};
use super::schema::quote_ident;
use crate::models::{City, District, EntityLevel, Neighborhood};

/// Failure reported by a [`BulkStore`]
#[derive(Debug, Error)]
pub enum WriteError {
    /// Unique or foreign-key constraint rejected the write
    #[error("{0}")]
    Constraint(String),
    /// Any other backend failure
    #[error("{0}")]
    Backend(String),
}

impl From<rusqlite::Error> for WriteError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
                WriteError::Constraint(err.to_string())
            }
            _ => WriteError::Backend(err.to_string()),
        }
    }
}

/// A row that can be written by a multi-row insert
pub trait InsertRow {
    const LEVEL: EntityLevel;
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> i64;

    /// Values in [`InsertRow::COLUMNS`] order
    fn values(&self) -> Vec<Value>;
}

impl InsertRow for City {
    const LEVEL: EntityLevel = EntityLevel::City;
    const COLUMNS: &'static [&'static str] = &["id", "name", "created_at", "updated_at"];

    fn id(&self) -> i64 {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.id),
            Value::Text(self.name.clone()),
            encode_timestamp(self.created_at),
            encode_timestamp(self.updated_at),
        ]
    }
}

impl InsertRow for District {
    const LEVEL: EntityLevel = EntityLevel::District;
    const COLUMNS: &'static [&'static str] = &["id", "city_id", "name", "created_at", "updated_at"];

    fn id(&self) -> i64 {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.id),
            Value::Integer(self.city_id),
            Value::Text(self.name.clone()),
            encode_timestamp(self.created_at),
            encode_timestamp(self.updated_at),
        ]
    }
}

impl InsertRow for Neighborhood {
    const LEVEL: EntityLevel = EntityLevel::Neighborhood;
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "district_id",
        "name",
        "area",
        "postal_code",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.id),
            Value::Integer(self.district_id),
            Value::Text(self.name.clone()),
            encode_area(self.area.as_ref()),
            encode_opt_text(self.postal_code.as_deref()),
            encode_timestamp(self.created_at),
            encode_timestamp(self.updated_at),
        ]
    }
}

/// Transactional bulk-insert capability.
///
/// At most one level transaction is open at a time.
pub trait BulkStore {
    fn begin_level(&mut self, level: EntityLevel) -> Result<(), WriteError>;

    /// Insert all `rows` into `table` as one statement inside the open level
    fn bulk_insert<R: InsertRow>(&mut self, table: &str, rows: &[R]) -> Result<(), WriteError>;

    fn commit_level(&mut self) -> Result<(), WriteError>;

    fn rollback_level(&mut self) -> Result<(), WriteError>;
}

/// Render `INSERT INTO "t" ("a", "b") VALUES (?, ?), (?, ?)` for `rows` rows
fn insert_sql(table: &str, columns: &[&str], rows: usize) -> String {
    let cols = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let tuple = format!("({})", vec!["?"; columns.len()].join(", "));
    let values = vec![tuple.as_str(); rows].join(", ");
    format!("INSERT INTO {} ({}) VALUES {}", quote_ident(table), cols, values)
}

/// [`BulkStore`] over a SQLite connection
pub struct SqliteStore<'c> {
    conn: &'c Connection,
    open: Option<EntityLevel>,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn, open: None }
    }

    /// Level whose transaction is currently open
    pub fn open_level(&self) -> Option<EntityLevel> {
        self.open
    }
}

impl BulkStore for SqliteStore<'_> {
    fn begin_level(&mut self, level: EntityLevel) -> Result<(), WriteError> {
        if let Some(open) = self.open {
            return Err(WriteError::Backend(format!(
                "cannot begin {} while the {} transaction is open",
                level, open
            )));
        }
        // IMMEDIATE takes the write lock up front so no other writer interleaves.
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        self.open = Some(level);
        Ok(())
    }

    fn bulk_insert<R: InsertRow>(&mut self, table: &str, rows: &[R]) -> Result<(), WriteError> {
        if self.open.is_none() {
            return Err(WriteError::Backend(format!(
                "bulk insert into {} outside of a level transaction",
                table
            )));
        }
        if rows.is_empty() {
            return Ok(());
        }

        let sql = insert_sql(table, R::COLUMNS, rows.len());
        let params: Vec<Value> = rows.iter().flat_map(|row| row.values()).collect();
        self.conn.execute(&sql, params_from_iter(params.iter()))?;
        Ok(())
    }

    fn commit_level(&mut self) -> Result<(), WriteError> {
        if self.open.is_none() {
            return Err(WriteError::Backend("no level transaction to commit".to_string()));
        }
        self.conn.execute_batch("COMMIT")?;
        self.open = None;
        Ok(())
    }

    fn rollback_level(&mut self) -> Result<(), WriteError> {
        if self.open.take().is_none() {
            return Ok(());
        }
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for SqliteStore<'_> {
    fn drop(&mut self) {
        if let Some(level) = self.open_level() {
            log::warn!("Rolling back {} transaction left open", level);
            if let Err(e) = self.rollback_level() {
                log::error!("Rollback of {} failed: {}", level, e);
            }
        }
    }
}

//! Target schema for the three hierarchy tables.
//!
//! Table names come from configuration, so the DDL is rendered at runtime.
//! Creation is idempotent thanks to `CREATE TABLE IF NOT EXISTS`.

use rusqlite::{Connection, OptionalExtension};

use crate::config::TableNames;
use crate::error::Result;

/// Double-quote an SQL identifier
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Index names are derived from table names, so they need the same escaping
fn index_name(table: &str, column: &str) -> String {
    quote_ident(&format!("idx_{}_{}", table, column))
}

/// Render the full DDL for the configured table names
pub fn render(tables: &TableNames) -> String {
    let cities = quote_ident(&tables.cities);
    let districts = quote_ident(&tables.districts);
    let neighborhoods = quote_ident(&tables.neighborhoods);

    format!(
        r#"
CREATE TABLE IF NOT EXISTS {cities} (
    id          INTEGER PRIMARY KEY NOT NULL,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS {districts} (
    id          INTEGER PRIMARY KEY NOT NULL,
    city_id     INTEGER NOT NULL REFERENCES {cities}(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- area is untyped on purpose: sources mix integers, reals and text.
CREATE TABLE IF NOT EXISTS {neighborhoods} (
    id          INTEGER PRIMARY KEY NOT NULL,
    district_id INTEGER NOT NULL REFERENCES {districts}(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    area,
    postal_code TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS {district_city_idx} ON {districts}(city_id);
CREATE INDEX IF NOT EXISTS {neighborhood_district_idx} ON {neighborhoods}(district_id);
CREATE INDEX IF NOT EXISTS {neighborhood_postal_idx} ON {neighborhoods}(postal_code);
"#,
        district_city_idx = index_name(&tables.districts, "city_id"),
        neighborhood_district_idx = index_name(&tables.neighborhoods, "district_id"),
        neighborhood_postal_idx = index_name(&tables.neighborhoods, "postal_code"),
    )
}

/// Create the three tables and their indexes if they don't exist
pub fn ensure_schema(conn: &Connection, tables: &TableNames) -> Result<()> {
    conn.execute_batch(&render(tables))?;
    log::debug!(
        "Schema ready ({}, {}, {})",
        tables.cities,
        tables.districts,
        tables.neighborhoods
    );
    Ok(())
}

/// Check whether a table exists
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Delete every row from the three tables, children first, in one transaction.
///
/// Returns the number of rows removed across all tables.
pub fn clear(conn: &mut Connection, tables: &TableNames) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut removed = 0;
    for table in [&tables.neighborhoods, &tables.districts, &tables.cities] {
        removed += tx.execute(&format!("DELETE FROM {}", quote_ident(table)), [])?;
    }
    tx.commit()?;
    log::info!("Cleared {} existing rows", removed);
    Ok(removed)
}

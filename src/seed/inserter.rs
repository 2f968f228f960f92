use crate::db::{BulkStore, InsertRow, WriteError};
use crate::error::{GeoError, Result};
use crate::models::EntityLevel;

/// Writes one entity level's rows in fixed-size chunks.
///
/// Chunk indexes keep counting across calls so that, for neighborhoods,
/// an error names its position within the whole level rather than the file.
#[derive(Debug)]
pub struct BatchInserter {
    level: EntityLevel,
    table: String,
    chunk_size: usize,
    chunks_written: usize,
    rows_written: usize,
}

impl BatchInserter {
    pub fn new(level: EntityLevel, table: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            level,
            table: table.into(),
            chunk_size: chunk_size.max(1),
            chunks_written: 0,
            rows_written: 0,
        }
    }

    pub fn level(&self) -> EntityLevel {
        self.level
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn chunks_written(&self) -> usize {
        self.chunks_written
    }

    /// Number of chunks `rows` rows will be split into
    pub fn chunk_count(&self, rows: usize) -> usize {
        (rows + self.chunk_size - 1) / self.chunk_size
    }

    /// Insert `rows` chunk by chunk into the store's open level transaction.
    ///
    /// `on_chunk` receives the row count of each committed-to-transaction chunk.
    pub fn insert<S, R>(
        &mut self,
        store: &mut S,
        rows: &[R],
        mut on_chunk: impl FnMut(usize),
    ) -> Result<usize>
    where
        S: BulkStore,
        R: InsertRow,
    {
        let mut inserted = 0;
        for chunk in rows.chunks(self.chunk_size) {
            store
                .bulk_insert(&self.table, chunk)
                .map_err(|e| self.chunk_error(e))?;
            self.chunks_written += 1;
            self.rows_written += chunk.len();
            inserted += chunk.len();
            on_chunk(chunk.len());
        }
        Ok(inserted)
    }

    fn chunk_error(&self, err: WriteError) -> GeoError {
        match err {
            WriteError::Constraint(message) => GeoError::ConstraintViolation {
                level: self.level,
                table: self.table.clone(),
                chunk: self.chunks_written,
                message,
            },
            WriteError::Backend(message) => GeoError::Insert {
                level: self.level,
                table: self.table.clone(),
                chunk: Some(self.chunks_written),
                message,
            },
        }
    }

    fn transaction_error(&self, err: WriteError) -> GeoError {
        GeoError::Insert {
            level: self.level,
            table: self.table.clone(),
            chunk: None,
            message: err.to_string(),
        }
    }
}

/// Run `body` inside one level transaction.
///
/// Commits when `body` succeeds; otherwise rolls back so nothing written for
/// this level stays visible, and returns the original error.
pub fn within_level<S, T>(
    store: &mut S,
    inserter: &mut BatchInserter,
    body: impl FnOnce(&mut S, &mut BatchInserter) -> Result<T>,
) -> Result<T>
where
    S: BulkStore,
{
    store
        .begin_level(inserter.level())
        .map_err(|e| inserter.transaction_error(e))?;

    let outcome = body(&mut *store, &mut *inserter).and_then(|value| {
        store
            .commit_level()
            .map(|()| value)
            .map_err(|e| inserter.transaction_error(e))
    });

    if outcome.is_err() {
        log::warn!(
            "Rolling back {} after {} rows in {} chunks",
            inserter.level(),
            inserter.rows_written(),
            inserter.chunks_written()
        );
        if let Err(e) = store.rollback_level() {
            log::error!("Rollback of {} failed: {}", inserter.level(), e);
        }
    }

    outcome
}

/// Insert a complete single-source level in one transaction
pub fn insert_level<S, R>(
    store: &mut S,
    inserter: &mut BatchInserter,
    rows: &[R],
    on_chunk: impl FnMut(usize),
) -> Result<usize>
where
    S: BulkStore,
    R: InsertRow,
{
    within_level(store, inserter, |store, inserter| {
        inserter.insert(store, rows, on_chunk)
    })
}

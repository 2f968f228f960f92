use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};

use super::inserter::{self, BatchInserter};
use super::mapper::{self, FromRecord};
use super::progress::ProgressReporter;
use super::source;
use crate::config::Config;
use crate::db::{BulkStore, InsertRow};
use crate::error::{GeoError, Result};
use crate::models::{City, District, EntityLevel, Neighborhood};

/// Lifecycle of one seeding run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedState {
    Idle,
    SeedingCities,
    SeedingDistricts,
    SeedingNeighborhoods,
    Complete,
    /// Terminal; records the level that aborted the run
    Failed(EntityLevel),
}

/// Counts reported at the end of a successful run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeedSummary {
    pub cities: usize,
    pub districts: usize,
    pub neighborhoods: usize,
    pub region_files: usize,
    pub empty_region_files: usize,
    pub elapsed: Duration,
}

/// Seeds cities, then districts, then neighborhoods.
///
/// Each level is written in its own transaction and must commit before the
/// next level starts. The first error aborts the run; levels committed
/// before it stay in place.
pub struct HierarchySeeder<'s, S, P> {
    store: &'s mut S,
    config: Config,
    progress: P,
    state: SeedState,
    last_stamp: Option<NaiveDateTime>,
}

impl<'s, S, P> HierarchySeeder<'s, S, P>
where
    S: BulkStore,
    P: ProgressReporter,
{
    pub fn new(store: &'s mut S, config: Config, progress: P) -> Self {
        Self {
            store,
            config,
            progress,
            state: SeedState::Idle,
            last_stamp: None,
        }
    }

    pub fn state(&self) -> SeedState {
        self.state
    }

    pub fn progress(&self) -> &P {
        &self.progress
    }

    /// Run all three levels. Only valid from [`SeedState::Idle`].
    pub fn run(&mut self) -> Result<SeedSummary> {
        if self.state != SeedState::Idle {
            return Err(GeoError::InvalidState { state: self.state });
        }
        self.config
            .validate()
            .map_err(|e| GeoError::Config(e.to_string()))?;

        let start = Instant::now();
        let mut summary = SeedSummary::default();
        self.progress.run_started();
        log::info!("Seeding from {}", self.config.data_path().display());

        self.state = SeedState::SeedingCities;
        let cities_file = self.config.cities_file();
        summary.cities = self
            .seed_single::<City>(&cities_file)
            .map_err(|e| self.fail(EntityLevel::City, e))?;

        self.state = SeedState::SeedingDistricts;
        let districts_file = self.config.districts_file();
        summary.districts = self
            .seed_single::<District>(&districts_file)
            .map_err(|e| self.fail(EntityLevel::District, e))?;

        self.state = SeedState::SeedingNeighborhoods;
        summary.neighborhoods = self
            .seed_neighborhoods(&mut summary)
            .map_err(|e| self.fail(EntityLevel::Neighborhood, e))?;

        self.state = SeedState::Complete;
        summary.elapsed = start.elapsed();
        self.progress.run_completed(&summary);
        log::info!(
            "Seeding complete: {} cities, {} districts, {} neighborhoods ({} region files, {} empty) in {:?}",
            summary.cities,
            summary.districts,
            summary.neighborhoods,
            summary.region_files,
            summary.empty_region_files,
            summary.elapsed
        );
        Ok(summary)
    }

    fn fail(&mut self, level: EntityLevel, err: GeoError) -> GeoError {
        self.state = SeedState::Failed(level);
        log::error!("Seeding {} failed: {}", level, err);
        err
    }

    /// Audit stamp for a level: whole seconds, never earlier than the last one
    fn next_stamp(&mut self) -> NaiveDateTime {
        let now = Utc::now().naive_utc().trunc_subsecs(0);
        let stamp = match self.last_stamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn inserter_for(&self, level: EntityLevel) -> BatchInserter {
        BatchInserter::new(
            level,
            self.config.tables.for_level(level),
            self.config.seeding.chunk_size(level),
        )
    }

    /// Cities and districts: one file, one transaction
    fn seed_single<R>(&mut self, path: &Path) -> Result<usize>
    where
        R: FromRecord + InsertRow,
    {
        let level = R::LEVEL;
        let source = source::read_required(level, path)?;
        let stamp = self.next_stamp();
        let rows: Vec<R> = mapper::map_collection(&source, stamp)?;
        drop(source);

        let mut inserter = self.inserter_for(level);
        self.progress.level_started(level, inserter.chunk_count(rows.len()));

        let progress = &mut self.progress;
        let count = inserter::insert_level(&mut *self.store, &mut inserter, &rows, |_| {
            progress.advance(level, 1)
        })?;

        self.progress.level_completed(level, count);
        log::info!("Inserted {} {} into `{}`", count, level, inserter.table());
        Ok(count)
    }

    /// Neighborhoods: every region file inside a single level transaction.
    ///
    /// Files are read one at a time and released before the next is opened.
    fn seed_neighborhoods(&mut self, summary: &mut SeedSummary) -> Result<usize> {
        let level = EntityLevel::Neighborhood;
        let files = source::discover_region_files(&self.config.neighborhoods_dir())?;
        let stamp = self.next_stamp();

        let mut inserter = self.inserter_for(level);
        self.progress.level_started(level, files.len());

        let progress = &mut self.progress;
        let (count, empty) =
            inserter::within_level(&mut *self.store, &mut inserter, |store, inserter| {
                let mut empty = 0;
                for (idx, path) in files.iter().enumerate() {
                    let written = seed_region_file(store, inserter, path, stamp).map_err(|e| {
                        log::error!("Region file {} failed: {}", path.display(), e);
                        e
                    })?;
                    match written {
                        0 => {
                            empty += 1;
                            log::warn!("No neighborhoods in {}, skipping", path.display());
                        }
                        n => log::debug!(
                            "[{}/{}] {}: {} neighborhoods",
                            idx + 1,
                            files.len(),
                            path.display(),
                            n
                        ),
                    }
                    progress.advance(level, 1);
                }
                Ok((inserter.rows_written(), empty))
            })?;

        summary.region_files = files.len();
        summary.empty_region_files = empty;
        self.progress.level_completed(level, count);
        log::info!("Inserted {} {} into `{}`", count, level, inserter.table());
        Ok(count)
    }
}

/// Read, map and insert one region file; zero records writes nothing
fn seed_region_file<S: BulkStore>(
    store: &mut S,
    inserter: &mut BatchInserter,
    path: &Path,
    stamp: NaiveDateTime,
) -> Result<usize> {
    let source = source::read_region_file(path)?;
    if source.is_empty() {
        return Ok(0);
    }
    let rows: Vec<Neighborhood> = mapper::map_collection(&source, stamp)?;
    drop(source);
    inserter.insert(store, &rows, |_| {})
}

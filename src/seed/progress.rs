use crate::models::EntityLevel;
use super::seeder::SeedSummary;

/// Observer for seeding progress. Never influences control flow.
pub trait ProgressReporter {
    fn run_started(&mut self) {}

    /// `units` is chunks for single-file levels, files for neighborhoods
    fn level_started(&mut self, _level: EntityLevel, _units: usize) {}

    fn advance(&mut self, _level: EntityLevel, _units: usize) {}

    fn level_completed(&mut self, _level: EntityLevel, _rows: usize) {}

    fn run_completed(&mut self, _summary: &SeedSummary) {}
}

/// Discards every event
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Reports progress through the `log` facade
#[derive(Debug, Default)]
pub struct LogProgress {
    total: usize,
    done: usize,
}

impl ProgressReporter for LogProgress {
    fn run_started(&mut self) {
        log::info!("Starting Turkey geographic data seeding");
    }

    fn level_started(&mut self, level: EntityLevel, units: usize) {
        self.total = units;
        self.done = 0;
        match level {
            EntityLevel::Neighborhood => log::info!("Processing {} neighborhood files...", units),
            _ => log::info!("Seeding {}...", level),
        }
    }

    fn advance(&mut self, level: EntityLevel, units: usize) {
        self.done += units;
        log::info!("[{}/{}] {}", self.done, self.total, level);
    }

    fn level_completed(&mut self, level: EntityLevel, rows: usize) {
        log::info!("✓ Inserted {} {}", rows, level);
    }

    fn run_completed(&mut self, summary: &SeedSummary) {
        log::info!(
            "✅ Seeding completed: {} cities, {} districts, {} neighborhoods in {:?}",
            summary.cities,
            summary.districts,
            summary.neighborhoods,
            summary.elapsed
        );
    }
}

/// Progress event captured by [`RecordingProgress`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    RunStarted,
    LevelStarted(EntityLevel, usize),
    Advance(EntityLevel, usize),
    LevelCompleted(EntityLevel, usize),
    RunCompleted,
}

/// Keeps every event in order; useful for embedding callers and tests
#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub events: Vec<ProgressEvent>,
}

impl ProgressReporter for RecordingProgress {
    fn run_started(&mut self) {
        self.events.push(ProgressEvent::RunStarted);
    }

    fn level_started(&mut self, level: EntityLevel, units: usize) {
        self.events.push(ProgressEvent::LevelStarted(level, units));
    }

    fn advance(&mut self, level: EntityLevel, units: usize) {
        self.events.push(ProgressEvent::Advance(level, units));
    }

    fn level_completed(&mut self, level: EntityLevel, rows: usize) {
        self.events.push(ProgressEvent::LevelCompleted(level, rows));
    }

    fn run_completed(&mut self, _summary: &SeedSummary) {
        self.events.push(ProgressEvent::RunCompleted);
    }
}

impl<P: ProgressReporter + ?Sized> ProgressReporter for Box<P> {
    fn run_started(&mut self) {
        (**self).run_started()
    }

    fn level_started(&mut self, level: EntityLevel, units: usize) {
        (**self).level_started(level, units)
    }

    fn advance(&mut self, level: EntityLevel, units: usize) {
        (**self).advance(level, units)
    }

    fn level_completed(&mut self, level: EntityLevel, rows: usize) {
        (**self).level_completed(level, rows)
    }

    fn run_completed(&mut self, summary: &SeedSummary) {
        (**self).run_completed(summary)
    }
}

/// Pick the reporter for the `seeding.show_progress` setting
pub fn reporter(show_progress: bool) -> Box<dyn ProgressReporter + Send> {
    if show_progress {
        Box::new(LogProgress::default())
    } else {
        Box::new(NoProgress)
    }
}

//! Seeding pipeline: read source files, map records, insert level by level.

pub mod inserter;
pub mod mapper;
pub mod progress;
pub mod seeder;
pub mod source;

pub use inserter::BatchInserter;
pub use mapper::FromRecord;
pub use progress::{LogProgress, NoProgress, ProgressReporter};
pub use seeder::{HierarchySeeder, SeedState, SeedSummary};
pub use source::RawCollection;

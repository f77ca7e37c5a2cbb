pub mod batch;
pub mod collector;
pub mod dedup;
pub mod error;
pub mod limiter;
pub mod report;
pub mod runner;
pub mod settings;

pub use batch::{Batch, BatchSummary};
pub use collector::{Collector, ResultCallback};
pub use dedup::DistinctUrls;
pub use error::TallyError;
pub use limiter::{ConcurrencyLimiter, Slot};
pub use runner::BatchRunner;
pub use settings::BatchSettings;

pub use tagtally_scanner::{FetchError, FetchResult, TagCounts};

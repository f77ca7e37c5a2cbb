pub mod error;
pub mod fetcher;
pub mod result;
pub mod tags;

pub use error::FetchError;
pub use fetcher::{Download, Fetcher, FetcherConfig, parse_target};
pub use result::FetchResult;
pub use tags::{TagCounts, count_tags};

//! # fio log summarizer
//!
//! Ingests the per-operation logs fio writes (`bw_bw.log`, `lat_lat.log`,
//! `lat_slat.log`, `lat_clat.log`, `iops_iops.log`) and compresses them into
//! structured statistical summaries: global statistics, exact percentiles
//! down to P99.999, and fixed-width binned time series overall, per I/O
//! direction, and over the sub-P1 / super-P99 tails so outliers stay visible
//! after compression.
//!
//! A log line is four decimal integers separated by `", "`; on a fast device
//! one run is tens of millions of lines, so the engine works in a small
//! number of passes over one in-memory record array and writes a single JSON
//! envelope per file.

pub mod bucket;
pub mod cli;
pub mod metadata;
pub mod percentile;
pub mod record;
pub mod results;
pub mod scanner;
pub mod summarize;
pub mod utils;

pub use bucket::{bucket_width, BucketAccumulator, BucketSummary};
pub use percentile::{percentiles, PercentileMap, PercentileRecord};
pub use record::{load_fio_log, Direction, LogRecord};
pub use results::{LogSummary, LogType};
pub use summarize::{build_bins, summarize, DirectionBins};

/// The current version of the summarizer.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod defaults {
    /// Default number of buckets in each binned series.
    pub const HISTOGRAM_BINS: usize = 10;
}

//! Score Engine
//!
//! Client-side transforms over fetched results: merging per-metric chart
//! series by calendar date, weighting and combining per-metric scores into a
//! composite, and the P/E reversion scorer used for offline data.

pub mod composite;
pub mod merge;
pub mod pe_reversion;
pub mod smoothing;
pub mod weights;

pub use composite::{ScoreAggregator, ScoringConfig, DEFAULT_FACTOR_SLOTS};
pub use merge::{merge_chart, merge_series};
pub use pe_reversion::{pe_reversion_score, PeReversionConfig};
pub use smoothing::{rolling_mean, smooth_series};
pub use weights::WeightSet;

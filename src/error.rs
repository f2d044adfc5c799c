//! Error types for the winter-road-analysis crate.
use chrono::NaiveDateTime;
use thiserror::Error;

/// Error type for the crate.
///
/// These never escape an analyzer's `analyze` method, they are converted into a result with an
/// unknown risk level there. They do escape configuration validation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum AnalysisError {
    /// There are no samples in the series.
    #[error("the weather series is empty")]
    EmptySeries,
    /// A value that is required for this analysis is not available anywhere in the series.
    #[error("missing required value: {0}")]
    MissingValue(&'static str),
    /// Samples are not strictly ascending in time.
    #[error("samples out of order: {next} does not follow {previous}")]
    UnorderedSeries {
        /// Valid time of the earlier sample in the slice.
        previous: NaiveDateTime,
        /// Valid time of the sample that should have been later.
        next: NaiveDateTime,
    },
    /// The newest sample is too old to describe current conditions.
    #[error("newest sample from {newest} is too old for an evaluation at {now}")]
    StaleData {
        /// Valid time of the newest sample.
        newest: NaiveDateTime,
        /// The evaluation instant.
        now: NaiveDateTime,
    },
    /// The newest sample is valid after the evaluation instant.
    #[error("newest sample from {newest} is later than the evaluation at {now}")]
    FutureData {
        /// Valid time of the newest sample.
        newest: NaiveDateTime,
        /// The evaluation instant.
        now: NaiveDateTime,
    },
    /// Bad or inconsistent thresholds.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Shorthand for results.
pub type Result<T> = std::result::Result<T, AnalysisError>;

//! Error types for CAPM computations.

use thiserror::Error;

/// Result type for CAPM operations.
pub type Result<T> = std::result::Result<T, CapmError>;

/// Errors that can occur while running the CAPM pipeline.
#[derive(Debug, Error)]
pub enum CapmError {
    /// No date survives alignment of the input series
    #[error("Empty intersection: no common dates across {series} series")]
    EmptyIntersection {
        /// Number of series that were aligned (benchmark included)
        series: usize,
    },

    /// Normalization base is zero or undefined
    #[error("Invalid base value for {instrument}: {value}")]
    InvalidBaseValue {
        /// Column whose first row cannot be used as a base
        instrument: String,
        /// Offending first-row value
        value: f64,
    },

    /// Benchmark returns have zero variance
    #[error("Degenerate market: benchmark {benchmark} has zero return variance")]
    DegenerateMarket {
        /// Benchmark column identifier
        benchmark: String,
    },

    /// Regression and covariance betas disagree
    #[error(
        "Estimator divergence for {instrument}: regression beta {regression} vs covariance beta {covariance}"
    )]
    EstimatorDivergence {
        /// Instrument being estimated
        instrument: String,
        /// Beta from the least-squares fit
        regression: f64,
        /// Beta from the covariance matrix
        covariance: f64,
    },

    /// Missing required column in a table
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// The same instrument was supplied twice
    #[error("Duplicate instrument: {0}")]
    DuplicateInstrument(String),

    /// Insufficient data for the computation
    #[error("Insufficient data: need {required} periods, got {available}")]
    InsufficientData {
        /// Required number of periods
        required: usize,
        /// Available number of periods
        available: usize,
    },

    /// A price series violates its construction invariants
    #[error("Invalid series {instrument}: {reason}")]
    InvalidSeries {
        /// Instrument the series belongs to
        instrument: String,
        /// What went wrong
        reason: String,
    },

    /// Table rows are not in strictly ascending date order
    #[error("Unordered dates: {previous} is followed by {next}")]
    UnorderedDates {
        /// Earlier row date
        previous: chrono::NaiveDate,
        /// Row date that does not follow it
        next: chrono::NaiveDate,
    },

    /// Polars DataFrame error
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Matrix shape error
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Failure reported by an upstream price provider
    #[error("Provider error: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CapmError {
    /// Wraps an upstream provider failure without interpreting it.
    pub fn provider<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Provider(Box::new(err))
    }
}

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capm/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod align;
pub mod beta;
pub mod capm;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod provider;
pub mod returns;
pub mod series;
pub mod table;

// Re-export core types
pub use align::{AlignPolicy, align};
pub use beta::{
    BetaAlphaEstimate, BetaEstimate, BetaEstimator, CovarianceBeta, RegressionBeta,
    estimate_beta_alpha,
};
pub use capm::{ExpectedReturn, TRADING_DAYS_PER_YEAR, expected_return, market_return, round_to};
pub use error::{CapmError, Result};
pub use normalize::normalize;
pub use pipeline::{CapmConfig, CapmPipeline, CapmReport, InstrumentRisk};
pub use provider::{DateRange, PriceProvider, ProviderError, StaticPriceProvider};
pub use returns::{cumulative_growth, daily_returns};
pub use series::{InstrumentId, Observation, PriceSeries};
pub use table::{AlignedTable, ReturnsTable, Table};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

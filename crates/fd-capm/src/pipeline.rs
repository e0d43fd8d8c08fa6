//! End-to-end CAPM pipeline.
//!
//! raw prices → aligned table → {normalized table, returns table} → beta/alpha
//! per instrument → expected return per instrument.
//!
//! Every run is a pure function of its inputs and configuration; the
//! resulting [`CapmReport`] shares nothing with other runs.

use crate::{
    AlignPolicy, AlignedTable, BetaAlphaEstimate, ExpectedReturn, InstrumentId, PriceProvider,
    PriceSeries, Result, ReturnsTable, align, daily_returns, estimate_beta_alpha, market_return,
    normalize,
    capm::round_to,
    provider::DateRange,
};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapmConfig {
    /// Annual risk-free rate, in percent.
    pub risk_free_rate: f64,
    /// Gap-filling policy used when aligning series.
    pub align_policy: AlignPolicy,
    /// Benchmark instrument requested from a price provider.
    pub benchmark: InstrumentId,
    /// Number of calendar years of history requested from a price provider.
    pub lookback_years: u32,
}

impl Default for CapmConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            align_policy: AlignPolicy::InnerJoin,
            benchmark: InstrumentId::new("SP500"),
            lookback_years: 1,
        }
    }
}

/// Risk figures for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRisk {
    /// Beta, alpha and covariance beta
    pub estimate: BetaAlphaEstimate,
    /// CAPM expected return
    pub expected_return: ExpectedReturn,
}

/// Every artifact of a single pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct CapmReport {
    /// Prices aligned on common dates
    pub prices: AlignedTable,
    /// Prices rebased to 1.0 on the first row
    pub normalized: AlignedTable,
    /// Percentage daily returns
    pub returns: ReturnsTable,
    /// Risk-free rate used for the projection, in percent
    pub risk_free_rate: f64,
    /// Annualized benchmark return, in percent
    pub market_return: f64,
    /// One entry per instrument, in column order
    pub instruments: Vec<InstrumentRisk>,
}

impl CapmReport {
    /// Risk figures for a single instrument.
    pub fn get(&self, instrument: &str) -> Option<&InstrumentRisk> {
        self.instruments
            .iter()
            .find(|r| r.estimate.instrument.as_str() == instrument)
    }

    /// Display table with beta and alpha rounded to 4 places and expected
    /// return rounded to 2 places.
    pub fn summary_frame(&self) -> Result<DataFrame> {
        let ids: Vec<&str> = self
            .instruments
            .iter()
            .map(|r| r.estimate.instrument.as_str())
            .collect();
        let beta: Vec<f64> = self.instruments.iter().map(|r| round_to(r.estimate.beta, 4)).collect();
        let alpha: Vec<f64> = self.instruments.iter().map(|r| round_to(r.estimate.alpha, 4)).collect();
        let beta_cov: Vec<f64> = self
            .instruments
            .iter()
            .map(|r| round_to(r.estimate.beta_covariance, 4))
            .collect();
        let expected: Vec<f64> = self
            .instruments
            .iter()
            .map(|r| r.expected_return.rounded())
            .collect();

        Ok(df![
            "instrument" => ids,
            "beta" => beta,
            "alpha" => alpha,
            "beta_covariance" => beta_cov,
            "expected_return" => expected,
        ]?)
    }
}

/// Runs the CAPM pipeline under a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct CapmPipeline {
    config: CapmConfig,
}

impl CapmPipeline {
    /// Create a pipeline with the given configuration.
    pub const fn with_config(config: CapmConfig) -> Self {
        Self { config }
    }

    /// Returns the current configuration.
    pub const fn config(&self) -> &CapmConfig {
        &self.config
    }

    /// Run over fully materialized series.
    ///
    /// The benchmark column takes its identifier from `benchmark`; the
    /// configured benchmark id is only used by [`Self::run_with_provider`].
    pub fn run(&self, instruments: &[PriceSeries], benchmark: &PriceSeries) -> Result<CapmReport> {
        let prices = align(instruments, benchmark, self.config.align_policy)?;
        let normalized = normalize(&prices)?;
        let returns = daily_returns(&prices)?;

        let rm = market_return(&returns)?;
        let rf = self.config.risk_free_rate;
        let bench = returns.benchmark().as_str();

        let risks = returns
            .instruments()
            .iter()
            .map(|id| {
                let estimate = estimate_beta_alpha(&returns, id.as_str(), bench)?;
                let expected_return = ExpectedReturn::project(id.clone(), estimate.beta, rf, rm);
                Ok(InstrumentRisk {
                    estimate,
                    expected_return,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            instruments = risks.len(),
            rows = returns.len(),
            market_return = rm,
            "capm run complete"
        );

        Ok(CapmReport {
            prices,
            normalized,
            returns,
            risk_free_rate: rf,
            market_return: rm,
            instruments: risks,
        })
    }

    /// Fetch `instruments` and the configured benchmark for the
    /// `lookback_years` ending at `end`, then run.
    ///
    /// Provider failures abort the run as [`crate::CapmError::Provider`].
    pub fn run_with_provider<P: PriceProvider>(
        &self,
        provider: &P,
        instruments: &[InstrumentId],
        end: NaiveDate,
    ) -> Result<CapmReport> {
        let range = DateRange::trailing_years(end, self.config.lookback_years)?;
        tracing::debug!(start = %range.start, end = %range.end, "fetching price series");

        let fetch = |id: &InstrumentId| {
            provider
                .fetch(id, range)
                .map_err(crate::CapmError::provider)
        };

        let series = instruments
            .iter()
            .map(fetch)
            .collect::<Result<Vec<_>>>()?;
        let benchmark = fetch(&self.config.benchmark)?;

        self.run(&series, &benchmark)
    }
}

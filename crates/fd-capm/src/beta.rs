//! Market beta and alpha estimation.
//!
//! Beta measures the sensitivity of an instrument's returns to benchmark
//! returns:
//!
//! `β = Cov(R_i, R_m) / Var(R_m)`, `α = mean(R_i) - β · mean(R_m)`
//!
//! Two estimators are provided and kept as separate code paths:
//!
//! - [`RegressionBeta`] fits `R_i ≈ β · R_m + α` by ordinary least squares over
//!   the two columns.
//! - [`CovarianceBeta`] reads `β` from the sample covariance matrix of the whole
//!   returns table. It produces no alpha.
//!
//! The two are algebraically identical, so [`estimate_beta_alpha`] runs both and
//! treats any disagreement beyond [`BETA_TOLERANCE`] as an error.

use crate::{CapmError, InstrumentId, Result, ReturnsTable, capm::round_to};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance within which both estimators must agree. It is relative to the
/// larger beta magnitude when that is at least 1 and absolute below 1.
pub const BETA_TOLERANCE: f64 = 1e-9;

/// Benchmark return variance (in squared percent) at or below which the market
/// is considered constant.
pub const MIN_MARKET_VARIANCE: f64 = 1e-12;

/// Output of a single estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaEstimate {
    /// Slope against the benchmark
    pub beta: f64,
    /// Intercept, when the estimator produces one
    pub alpha: Option<f64>,
}

/// An estimator of market beta over a returns table.
pub trait BetaEstimator: Send + Sync + fmt::Debug {
    /// Unique identifier for this estimator.
    fn name(&self) -> &str;

    /// Estimate beta of `instrument` against `benchmark`.
    ///
    /// Both identifiers must name columns of `returns`.
    fn estimate(
        &self,
        returns: &ReturnsTable,
        instrument: &str,
        benchmark: &str,
    ) -> Result<BetaEstimate>;
}

/// Ordinary least-squares fit of a first-degree polynomial.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegressionBeta;

impl BetaEstimator for RegressionBeta {
    fn name(&self) -> &str {
        "regression"
    }

    fn estimate(
        &self,
        returns: &ReturnsTable,
        instrument: &str,
        benchmark: &str,
    ) -> Result<BetaEstimate> {
        let x = column(returns, instrument)?;
        let m = column(returns, benchmark)?;
        ensure_rows(returns.len())?;

        let n = m.len() as f64;
        let mean_x = x.iter().sum::<f64>() / n;
        let mean_m = m.iter().sum::<f64>() / n;

        let (sxy, sxx) = x
            .iter()
            .zip(m)
            .fold((0.0, 0.0), |(sxy, sxx), (xi, mi)| {
                let dm = mi - mean_m;
                (sxy + (xi - mean_x) * dm, sxx + dm * dm)
            });

        ensure_market_variance(sxx / (n - 1.0), benchmark)?;

        let beta = sxy / sxx;
        Ok(BetaEstimate {
            beta,
            alpha: Some(mean_x - beta * mean_m),
        })
    }
}

/// Covariance-over-variance ratio from the full sample covariance matrix.
#[derive(Debug, Default, Clone, Copy)]
pub struct CovarianceBeta;

impl BetaEstimator for CovarianceBeta {
    fn name(&self) -> &str {
        "covariance"
    }

    fn estimate(
        &self,
        returns: &ReturnsTable,
        instrument: &str,
        benchmark: &str,
    ) -> Result<BetaEstimate> {
        let i = position(returns, instrument)?;
        let j = position(returns, benchmark)?;
        ensure_rows(returns.len())?;

        let cov = covariance_matrix(returns)?;
        let var_m = cov[[j, j]];
        ensure_market_variance(var_m, benchmark)?;

        Ok(BetaEstimate {
            beta: cov[[i, j]] / var_m,
            alpha: None,
        })
    }
}

/// Sample covariance matrix (ddof = 1) of every column, benchmark last.
pub fn covariance_matrix(returns: &ReturnsTable) -> Result<Array2<f64>> {
    ensure_rows(returns.len())?;

    let data = returns.to_matrix()?;
    let n = data.nrows() as f64;
    let mean = data.mean_axis(Axis(0)).ok_or(CapmError::InsufficientData {
        required: 2,
        available: 0,
    })?;
    let centered = &data - &mean;

    Ok(centered.t().dot(&centered) / (n - 1.0))
}

/// Beta and alpha of one instrument, with the cross-checking covariance beta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetaAlphaEstimate {
    /// Instrument the estimate belongs to
    pub instrument: InstrumentId,
    /// Regression slope
    pub beta: f64,
    /// Regression intercept
    pub alpha: f64,
    /// Beta from the covariance matrix
    pub beta_covariance: f64,
}

impl From<BetaAlphaEstimate> for (f64, f64, f64) {
    fn from(est: BetaAlphaEstimate) -> Self {
        (est.beta, est.alpha, est.beta_covariance)
    }
}

impl fmt::Display for BetaAlphaEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: beta={:.4} alpha={:.4} (covariance beta={:.4})",
            self.instrument,
            round_to(self.beta, 4),
            round_to(self.alpha, 4),
            round_to(self.beta_covariance, 4)
        )
    }
}

/// Estimate beta and alpha of `instrument` against `benchmark` with both
/// estimators and verify they agree.
///
/// # Errors
///
/// - [`CapmError::MissingColumn`] for an unknown identifier
/// - [`CapmError::InsufficientData`] for fewer than two rows
/// - [`CapmError::DegenerateMarket`] when benchmark returns are constant
/// - [`CapmError::EstimatorDivergence`] when the two betas disagree
pub fn estimate_beta_alpha(
    returns: &ReturnsTable,
    instrument: &str,
    benchmark: &str,
) -> Result<BetaAlphaEstimate> {
    let regression = RegressionBeta.estimate(returns, instrument, benchmark)?;
    let covariance = CovarianceBeta.estimate(returns, instrument, benchmark)?;

    if !betas_agree(regression.beta, covariance.beta) {
        return Err(CapmError::EstimatorDivergence {
            instrument: instrument.to_string(),
            regression: regression.beta,
            covariance: covariance.beta,
        });
    }

    let estimate = BetaAlphaEstimate {
        instrument: InstrumentId::new(instrument),
        beta: regression.beta,
        alpha: regression.alpha.unwrap_or_default(),
        beta_covariance: covariance.beta,
    };
    tracing::debug!(%estimate, "estimated beta");

    Ok(estimate)
}

/// Whether two betas agree within [`BETA_TOLERANCE`], scaled by
/// `max(|a|, |b|, 1)`.
pub fn betas_agree(a: f64, b: f64) -> bool {
    (a - b).abs() <= BETA_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

fn column<'a>(returns: &'a ReturnsTable, id: &str) -> Result<&'a [f64]> {
    returns
        .column(id)
        .ok_or_else(|| CapmError::MissingColumn(id.to_string()))
}

fn position(returns: &ReturnsTable, id: &str) -> Result<usize> {
    returns
        .column_ids()
        .position(|c| c.as_str() == id)
        .ok_or_else(|| CapmError::MissingColumn(id.to_string()))
}

fn ensure_rows(available: usize) -> Result<()> {
    if available < 2 {
        return Err(CapmError::InsufficientData {
            required: 2,
            available,
        });
    }
    Ok(())
}

fn ensure_market_variance(var_m: f64, benchmark: &str) -> Result<()> {
    if var_m.is_nan() || var_m <= MIN_MARKET_VARIANCE {
        return Err(CapmError::DegenerateMarket {
            benchmark: benchmark.to_string(),
        });
    }
    Ok(())
}

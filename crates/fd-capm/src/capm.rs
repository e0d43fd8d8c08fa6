//! Expected return projection under the Capital Asset Pricing Model.
//!
//! `E[R_i] = R_f + β_i × (R_m − R_f)`
//!
//! The market return `R_m` is the mean daily benchmark return annualized over
//! [`TRADING_DAYS_PER_YEAR`].

use crate::{CapmError, InstrumentId, Result, ReturnsTable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading days used to annualize the mean daily benchmark return.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annualized benchmark return, in percent.
///
/// The mean runs over every row of the returns table, including the zero
/// return defined for the first row.
pub fn market_return(returns: &ReturnsTable) -> Result<f64> {
    let bench = returns.benchmark_column();
    if bench.is_empty() {
        return Err(CapmError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    let mean = bench.iter().sum::<f64>() / bench.len() as f64;
    Ok(mean * TRADING_DAYS_PER_YEAR)
}

/// Round half away from zero to `places` decimals.
///
/// Every presentation path (`Display` impls and report tables) rounds through
/// this function so the same value never prints two ways.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// CAPM expected return: `rf + beta × (rm − rf)`.
pub fn expected_return(beta: f64, risk_free_rate: f64, market_return: f64) -> f64 {
    risk_free_rate + beta * (market_return - risk_free_rate)
}

/// Expected return of one instrument at full precision.
///
/// [`fmt::Display`] rounds to two decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedReturn {
    /// Instrument the projection belongs to
    pub instrument: InstrumentId,
    /// Annual expected return, in percent
    pub value: f64,
}

impl ExpectedReturn {
    /// Project the expected return of `instrument` from its beta.
    pub fn project(
        instrument: InstrumentId,
        beta: f64,
        risk_free_rate: f64,
        market_return: f64,
    ) -> Self {
        Self {
            instrument,
            value: expected_return(beta, risk_free_rate, market_return),
        }
    }

    /// Value rounded to two decimal places.
    pub fn rounded(&self) -> f64 {
        round_to(self.value, 2)
    }
}

impl fmt::Display for ExpectedReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    #[case::market_beta(1.0, 0.0, 12.0, 12.0)]
    #[case::zero_beta(0.0, 3.0, 12.0, 3.0)]
    #[case::levered(1.5, 2.0, 10.0, 14.0)]
    #[case::negative_beta(-2.0, 1.0, 6.0, -9.0)]
    fn test_expected_return(
        #[case] beta: f64,
        #[case] rf: f64,
        #[case] rm: f64,
        #[case] expected: f64,
    ) {
        assert_relative_eq!(expected_return(beta, rf, rm), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_market_return_annualizes_mean() {
        let returns = ReturnsTable::new(
            (2..=5)
                .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
                .collect(),
            vec![],
            "SP500".into(),
            vec![vec![0.0, 1.0, -0.5, 0.3]],
        )
        .unwrap();

        // mean = 0.8 / 4 = 0.2
        assert_relative_eq!(market_return(&returns).unwrap(), 50.4, epsilon = 1e-9);
    }

    #[test]
    fn test_market_return_requires_rows() {
        let returns = ReturnsTable::new(vec![], vec![], "SP500".into(), vec![vec![]]).unwrap();
        assert!(matches!(
            market_return(&returns),
            Err(CapmError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_expected_return_display_keeps_precision() {
        let er = ExpectedReturn::project("AAPL".into(), 1.23456, 0.0, 10.0);

        assert_relative_eq!(er.value, 12.3456, epsilon = 1e-12);
        assert_eq!(er.to_string(), "12.35");
        assert_relative_eq!(er.rounded(), 12.35, epsilon = 1e-12);
    }

    #[rstest]
    #[case::half_up(0.125, "0.13")]
    #[case::half_down_negative(-0.125, "-0.13")]
    #[case::below_half(0.124, "0.12")]
    fn test_display_matches_rounded(#[case] market: f64, #[case] shown: &str) {
        let er = ExpectedReturn::project("AAPL".into(), 1.0, 0.0, market);

        assert_eq!(er.to_string(), shown);
        assert_eq!(format!("{:.2}", er.rounded()), shown);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.234_56, 4), 1.2346);
        assert_eq!(round_to(-0.000_06, 4), -0.0001);
        assert_eq!(round_to(2.5, 0), 3.0);
    }
}

//! Worked examples through the public API.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use fd_capm::{
    AlignPolicy, CapmError, PriceSeries, align, daily_returns, estimate_beta_alpha,
    expected_return, market_return,
};

fn dates() -> Vec<NaiveDate> {
    (2..=4)
        .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
        .collect()
}

fn series(id: &str, prices: &[f64]) -> PriceSeries {
    PriceSeries::from_parts(id, dates(), prices.to_vec()).unwrap()
}

#[test]
fn constant_growth_benchmark() {
    let table = align(
        &[
            series("UP", &[100.0, 110.0, 121.0]),
            series("DOWN", &[100.0, 90.0, 81.0]),
        ],
        &series("SP500", &[100.0, 105.0, 110.25]),
        AlignPolicy::InnerJoin,
    )
    .unwrap();
    let returns = daily_returns(&table).unwrap();

    for row in 1..=2 {
        let values = returns.row(row).unwrap();
        assert_relative_eq!(values[0], 10.0, epsilon = 1e-9);
        assert_relative_eq!(values[1], -10.0, epsilon = 1e-9);
        assert_relative_eq!(values[2], 5.0, epsilon = 1e-9);
    }

    let (up_beta, up_alpha, up_cov): (f64, f64, f64) =
        estimate_beta_alpha(&returns, "UP", "SP500").unwrap().into();
    let (down_beta, _, _): (f64, f64, f64) =
        estimate_beta_alpha(&returns, "DOWN", "SP500").unwrap().into();
    assert!(up_beta > down_beta);
    assert_relative_eq!(up_beta, up_cov, max_relative = 1e-9);
    assert_relative_eq!(up_alpha, 0.0, epsilon = 1e-9);

    let rm = market_return(&returns).unwrap();
    assert_relative_eq!(expected_return(up_beta, 0.0, rm), 2.0 * rm, max_relative = 1e-9);
}

#[test]
fn flat_benchmark_is_degenerate() {
    let table = align(
        &[series("UP", &[100.0, 110.0, 121.0])],
        &series("SP500", &[100.0, 100.0, 100.0]),
        AlignPolicy::InnerJoin,
    )
    .unwrap();
    let returns = daily_returns(&table).unwrap();
    assert_eq!(returns.benchmark_column(), &[0.0, 0.0, 0.0]);

    let err = estimate_beta_alpha(&returns, "UP", "SP500").unwrap_err();
    assert!(matches!(err, CapmError::DegenerateMarket { .. }));
}

#[test]
fn disjoint_dates_have_no_intersection() {
    let later: Vec<NaiveDate> = (10..=12)
        .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
        .collect();
    let bench = PriceSeries::from_parts("SP500", later, vec![1.0, 2.0, 3.0]).unwrap();

    let err = align(&[series("UP", &[1.0, 2.0, 3.0])], &bench, AlignPolicy::InnerJoin).unwrap_err();
    assert!(matches!(err, CapmError::EmptyIntersection { series: 2 }));
}

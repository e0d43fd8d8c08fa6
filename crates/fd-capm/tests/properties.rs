//! Property checks for the CAPM pipeline over seeded random walks.

use approx::assert_relative_eq;
use chrono::{Days, NaiveDate};
use fd_capm::{
    AlignPolicy, AlignedTable, CapmError, CapmPipeline, PriceSeries, align, beta::betas_agree,
    cumulative_growth, daily_returns, estimate_beta_alpha, normalize,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rstest::rstest;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

/// Random walk with a given sensitivity to a shared market walk.
fn random_universe(seed: u64, rows: usize, betas: &[f64]) -> (Vec<PriceSeries>, PriceSeries) {
    let mut rng = StdRng::seed_from_u64(seed);
    let dates: Vec<NaiveDate> = (0..rows as u64)
        .map(|d| start().checked_add_days(Days::new(d)).unwrap())
        .collect();

    let market: Vec<f64> = (0..rows).map(|_| rng.gen_range(-0.02..0.02)).collect();
    let walk = |shocks: &[f64]| {
        shocks
            .iter()
            .scan(100.0, |level, r| {
                *level *= 1.0 + r;
                Some(*level)
            })
            .collect::<Vec<_>>()
    };

    let instruments = betas
        .iter()
        .enumerate()
        .map(|(i, beta)| {
            let shocks: Vec<f64> = market
                .iter()
                .map(|m| beta * m + rng.gen_range(-0.01..0.01))
                .collect();
            PriceSeries::from_parts(format!("S{i}"), dates.clone(), walk(&shocks)).unwrap()
        })
        .collect();
    let benchmark = PriceSeries::from_parts("SP500", dates, walk(&market)).unwrap();

    (instruments, benchmark)
}

fn aligned(seed: u64) -> AlignedTable {
    let (instruments, benchmark) = random_universe(seed, 120, &[0.5, 1.0, 1.8]);
    align(&instruments, &benchmark, AlignPolicy::InnerJoin).unwrap()
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(42)]
fn returns_preserve_row_count_and_zero_first_row(#[case] seed: u64) {
    let table = aligned(seed);
    let returns = daily_returns(&table).unwrap();

    assert_eq!(returns.len(), table.len());
    assert!(returns.row(0).unwrap().iter().all(|v| *v == 0.0));
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(42)]
fn estimators_agree(#[case] seed: u64) {
    let returns = daily_returns(&aligned(seed)).unwrap();

    for id in returns.instruments() {
        let est = estimate_beta_alpha(&returns, id.as_str(), "SP500").unwrap();
        assert!(
            betas_agree(est.beta, est.beta_covariance),
            "{id}: {} vs {}",
            est.beta,
            est.beta_covariance
        );
    }
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(42)]
fn normalize_first_row_and_idempotence(#[case] seed: u64) {
    let once = normalize(&aligned(seed)).unwrap();
    assert!(once.row(0).unwrap().iter().all(|v| *v == 1.0));

    let twice = normalize(&once).unwrap();
    for id in once.column_ids() {
        let a = once.column(id.as_str()).unwrap();
        let b = twice.column(id.as_str()).unwrap();
        for (x, y) in a.iter().zip(b) {
            assert_relative_eq!(*x, *y, max_relative = 1e-12);
        }
    }
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(42)]
fn returns_round_trip_to_prices(#[case] seed: u64) {
    let table = aligned(seed);
    let growth = cumulative_growth(&daily_returns(&table).unwrap()).unwrap();

    for id in table.column_ids() {
        let prices = table.column(id.as_str()).unwrap();
        let rebuilt = growth.column(id.as_str()).unwrap();
        for (p, g) in prices.iter().zip(rebuilt) {
            assert_relative_eq!(*p, prices[0] * g, max_relative = 1e-10);
        }
    }
}

#[test]
fn higher_sensitivity_means_higher_beta() {
    let (instruments, benchmark) = random_universe(3, 500, &[0.3, 2.0]);
    let report = CapmPipeline::default().run(&instruments, &benchmark).unwrap();

    let low = report.get("S0").unwrap().estimate.beta;
    let high = report.get("S1").unwrap().estimate.beta;
    assert!(high > low, "{high} <= {low}");
}

#[test]
fn forward_fill_never_looks_ahead() {
    let dates = |days: &[u64]| {
        days.iter()
            .map(|d| start().checked_add_days(Days::new(*d)).unwrap())
            .collect::<Vec<_>>()
    };
    let a = PriceSeries::from_parts("A", dates(&[0, 2, 4]), vec![1.0, 2.0, 3.0]).unwrap();
    let bench =
        PriceSeries::from_parts("SP500", dates(&[1, 2, 3, 4]), vec![10.0, 11.0, 12.0, 13.0])
            .unwrap();

    let table = align(&[a], &bench, AlignPolicy::ForwardFill).unwrap();
    assert_eq!(table.dates(), dates(&[1, 2, 3, 4]).as_slice());
    assert_eq!(table.column("A"), Some([1.0, 2.0, 2.0, 3.0].as_slice()));
}

#[test]
fn disjoint_series_fail_alignment() {
    let a = PriceSeries::from_parts("A", vec![start()], vec![1.0]).unwrap();
    let bench = PriceSeries::from_parts(
        "SP500",
        vec![start().checked_add_days(Days::new(1)).unwrap()],
        vec![10.0],
    )
    .unwrap();

    let err = CapmPipeline::default().run(&[a], &bench).unwrap_err();
    assert!(matches!(err, CapmError::EmptyIntersection { .. }));
}

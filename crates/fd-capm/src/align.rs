//! Series alignment - merging instrument and benchmark prices on common dates.
//!
//! Two policies are supported:
//!
//! - [`AlignPolicy::InnerJoin`] keeps only the dates observed by every series.
//!   This is the default because it never introduces synthetic zero returns on
//!   filled days.
//! - [`AlignPolicy::ForwardFill`] keeps the union of dates and fills each gap
//!   with the most recent prior observation of the same series. Dates before a
//!   series' first observation cannot be filled without look-ahead and are
//!   dropped.

use crate::{AlignedTable, CapmError, InstrumentId, PriceSeries, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Gap-filling policy used when merging series.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignPolicy {
    /// Keep only dates present in all series
    #[default]
    InnerJoin,
    /// Keep the union of dates, filling gaps with the last prior observation
    ForwardFill,
}

/// Merge instrument series and a benchmark series into one [`AlignedTable`].
///
/// Columns follow the order of `series_list`, benchmark last.
///
/// # Errors
///
/// - [`CapmError::EmptyIntersection`] when no row survives alignment
/// - [`CapmError::DuplicateInstrument`] when two inputs share an identifier
pub fn align(
    series_list: &[PriceSeries],
    benchmark_series: &PriceSeries,
    policy: AlignPolicy,
) -> Result<AlignedTable> {
    let all: Vec<&PriceSeries> = series_list
        .iter()
        .chain(std::iter::once(benchmark_series))
        .collect();

    let mut seen = HashSet::with_capacity(all.len());
    for series in &all {
        if !seen.insert(series.instrument()) {
            return Err(CapmError::DuplicateInstrument(series.instrument().to_string()));
        }
    }

    let (dates, columns) = match policy {
        AlignPolicy::InnerJoin => inner_join(&all),
        AlignPolicy::ForwardFill => forward_fill(&all),
    };

    if dates.is_empty() {
        return Err(CapmError::EmptyIntersection { series: all.len() });
    }

    tracing::debug!(
        ?policy,
        instruments = series_list.len(),
        rows = dates.len(),
        "aligned price series"
    );

    let instruments: Vec<InstrumentId> = series_list
        .iter()
        .map(|s| s.instrument().clone())
        .collect();

    AlignedTable::new(
        dates,
        instruments,
        benchmark_series.instrument().clone(),
        columns,
    )
}

fn inner_join(all: &[&PriceSeries]) -> (Vec<NaiveDate>, Vec<Vec<f64>>) {
    let Some((first, rest)) = all.split_first() else {
        return (Vec::new(), Vec::new());
    };

    let mut common: BTreeSet<NaiveDate> = first.observations().iter().map(|o| o.date).collect();
    for series in rest {
        let dates: HashSet<NaiveDate> = series.observations().iter().map(|o| o.date).collect();
        common.retain(|d| dates.contains(d));
    }

    let dates: Vec<NaiveDate> = common.into_iter().collect();
    let columns = all
        .iter()
        .map(|series| {
            // Observations are date-ordered and every common date is present.
            series
                .observations()
                .iter()
                .filter(|o| dates.binary_search(&o.date).is_ok())
                .map(|o| o.price)
                .collect()
        })
        .collect();

    (dates, columns)
}

fn forward_fill(all: &[&PriceSeries]) -> (Vec<NaiveDate>, Vec<Vec<f64>>) {
    // No row can be filled until every series has produced an observation.
    let start = all
        .iter()
        .map(|s| s.observations().first().map(|o| o.date))
        .try_fold(NaiveDate::MIN, |acc, first| first.map(|d| acc.max(d)));
    let Some(start) = start else {
        return (Vec::new(), Vec::new());
    };

    let union: BTreeSet<NaiveDate> = all
        .iter()
        .flat_map(|s| s.observations().iter().map(|o| o.date))
        .collect();
    let dropped = union.range(..start).count();
    if dropped > 0 {
        tracing::warn!(
            dropped,
            %start,
            "forward fill dropped leading dates without a prior observation"
        );
    }

    let dates: Vec<NaiveDate> = union.range(start..).copied().collect();
    let columns = all
        .iter()
        .map(|series| {
            let obs = series.observations();
            let mut cursor = 0;
            let mut last = f64::NAN;
            dates
                .iter()
                .map(|date| {
                    while cursor < obs.len() && obs[cursor].date <= *date {
                        last = obs[cursor].price;
                        cursor += 1;
                    }
                    last
                })
                .collect()
        })
        .collect();

    (dates, columns)
}

//! Price provider seam.
//!
//! Fetching prices is the caller's concern. The core only defines the
//! [`PriceProvider`] contract it consumes and an in-memory implementation used
//! by the CLI and tests. Provider failures reach the pipeline as
//! [`CapmError::Provider`] without being interpreted.

use crate::{CapmError, InstrumentId, PriceSeries};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Inclusive date range for a price request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First date, inclusive
    pub start: NaiveDate,
    /// Last date, inclusive
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ProviderError> {
        if start > end {
            return Err(ProviderError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `years` calendar years ending at `end`.
    pub fn trailing_years(end: NaiveDate, years: u32) -> Result<Self, ProviderError> {
        let start = end
            .checked_sub_months(Months::new(years.saturating_mul(12)))
            .ok_or(ProviderError::InvalidRange {
                start: NaiveDate::MIN,
                end,
            })?;
        Self::new(start, end)
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Errors raised by [`StaticPriceProvider`].
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No series is stored for the symbol
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(InstrumentId),

    /// The symbol has no observations inside the requested range
    #[error("No prices for {instrument} between {start} and {end}")]
    EmptyRange {
        /// Requested instrument
        instrument: InstrumentId,
        /// Range start
        start: NaiveDate,
        /// Range end
        end: NaiveDate,
    },

    /// Range start is after its end
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange {
        /// Start date of the range
        start: NaiveDate,
        /// End date of the range
        end: NaiveDate,
    },
}

impl From<ProviderError> for CapmError {
    fn from(err: ProviderError) -> Self {
        Self::provider(err)
    }
}

/// A source of price series.
pub trait PriceProvider {
    /// Error reported on failure; the core carries it opaquely.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the series of `instrument` restricted to `range`.
    fn fetch(&self, instrument: &InstrumentId, range: DateRange)
    -> Result<PriceSeries, Self::Error>;
}

/// Provider serving series held in memory.
#[derive(Debug, Default, Clone)]
pub struct StaticPriceProvider {
    series: HashMap<InstrumentId, PriceSeries>,
}

impl StaticPriceProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a series, replacing any previous one for the same instrument.
    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.instrument().clone(), series);
    }

    /// Stored instruments in sorted order.
    pub fn instruments(&self) -> Vec<&InstrumentId> {
        let mut ids: Vec<_> = self.series.keys().collect();
        ids.sort();
        ids
    }

    /// Latest observation date across every stored series.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.series
            .values()
            .filter_map(|s| s.date_range().map(|(_, end)| end))
            .max()
    }
}

impl FromIterator<PriceSeries> for StaticPriceProvider {
    fn from_iter<I: IntoIterator<Item = PriceSeries>>(iter: I) -> Self {
        let mut provider = Self::new();
        for series in iter {
            provider.insert(series);
        }
        provider
    }
}

impl PriceProvider for StaticPriceProvider {
    type Error = ProviderError;

    fn fetch(&self, instrument: &InstrumentId, range: DateRange) -> Result<PriceSeries, ProviderError> {
        let series = self
            .series
            .get(instrument)
            .ok_or_else(|| ProviderError::UnknownSymbol(instrument.clone()))?;

        let window = series.between(range.start, range.end);
        if window.is_empty() {
            return Err(ProviderError::EmptyRange {
                instrument: instrument.clone(),
                start: range.start,
                end: range.end,
            });
        }
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn provider() -> StaticPriceProvider {
        [
            PriceSeries::from_parts(
                "AAPL",
                vec![date(2023, 6, 1), date(2024, 1, 2), date(2024, 6, 3)],
                vec![180.0, 185.0, 194.0],
            )
            .unwrap(),
            PriceSeries::from_parts("SP500", vec![date(2024, 6, 3)], vec![5283.0]).unwrap(),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_trailing_years() {
        let range = DateRange::trailing_years(date(2024, 6, 3), 1).unwrap();
        assert_eq!(range.start, date(2023, 6, 3));
        assert!(range.contains(date(2024, 1, 2)));
        assert!(!range.contains(date(2023, 6, 1)));
    }

    #[test]
    fn test_invalid_range() {
        assert!(matches!(
            DateRange::new(date(2024, 2, 1), date(2024, 1, 1)),
            Err(ProviderError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_fetch_slices_to_range() {
        let provider = provider();
        let range = DateRange::trailing_years(date(2024, 6, 3), 1).unwrap();

        let series = provider.fetch(&"AAPL".into(), range).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(provider.last_date(), Some(date(2024, 6, 3)));
        assert_eq!(provider.instruments().len(), 2);
    }

    #[test]
    fn test_fetch_errors() {
        let provider = provider();
        let range = DateRange::new(date(2020, 1, 1), date(2020, 12, 31)).unwrap();

        assert!(matches!(
            provider.fetch(&"TSLA".into(), range),
            Err(ProviderError::UnknownSymbol(_))
        ));
        assert!(matches!(
            provider.fetch(&"AAPL".into(), range),
            Err(ProviderError::EmptyRange { .. })
        ));

        let err: CapmError = ProviderError::UnknownSymbol("TSLA".into()).into();
        assert!(matches!(err, CapmError::Provider(_)));
    }
}

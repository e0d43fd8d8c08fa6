//! Raw price series for a single instrument.
//!
//! A [`PriceSeries`] is the unit handed to the core by a price provider. Its
//! invariants are checked once at construction so every later stage can rely on
//! strictly increasing dates and non-negative prices.

use crate::{CapmError, Result};
use chrono::NaiveDate;
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Identifier of an instrument or benchmark column (e.g. `AAPL`, `SP500`).
#[derive(
    Debug, Display, From, Into, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InstrumentId(String);

impl InstrumentId {
    /// Create an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InstrumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for InstrumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A single dated price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Trading date
    pub date: NaiveDate,
    /// Closing price; NaN marks an undefined quote
    pub price: f64,
}

#[derive(Deserialize)]
struct RawPriceSeries {
    instrument: InstrumentId,
    observations: Vec<Observation>,
}

/// Ordered `(date, price)` observations for one instrument.
///
/// Dates are strictly increasing and prices are non-negative. A NaN price is
/// accepted as an undefined observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPriceSeries")]
pub struct PriceSeries {
    instrument: InstrumentId,
    observations: Vec<Observation>,
}

impl TryFrom<RawPriceSeries> for PriceSeries {
    type Error = CapmError;

    fn try_from(raw: RawPriceSeries) -> Result<Self> {
        Self::new(raw.instrument, raw.observations)
    }
}

impl PriceSeries {
    /// Create a validated series.
    ///
    /// Fails with [`CapmError::InvalidSeries`] on unordered or duplicate dates
    /// and on negative prices.
    pub fn new(instrument: impl Into<InstrumentId>, observations: Vec<Observation>) -> Result<Self> {
        let instrument = instrument.into();

        for pair in observations.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(CapmError::InvalidSeries {
                    instrument: instrument.to_string(),
                    reason: format!(
                        "dates must be strictly increasing ({} then {})",
                        pair[0].date, pair[1].date
                    ),
                });
            }
        }

        if let Some(obs) = observations.iter().find(|o| o.price < 0.0) {
            return Err(CapmError::InvalidSeries {
                instrument: instrument.to_string(),
                reason: format!("negative price {} on {}", obs.price, obs.date),
            });
        }

        Ok(Self {
            instrument,
            observations,
        })
    }

    /// Build a series from parallel date and price vectors.
    pub fn from_parts(
        instrument: impl Into<InstrumentId>,
        dates: Vec<NaiveDate>,
        prices: Vec<f64>,
    ) -> Result<Self> {
        let instrument = instrument.into();
        if dates.len() != prices.len() {
            return Err(CapmError::InvalidSeries {
                instrument: instrument.to_string(),
                reason: format!("{} dates vs {} prices", dates.len(), prices.len()),
            });
        }

        let observations = dates
            .into_iter()
            .zip(prices)
            .map(|(date, price)| Observation { date, price })
            .collect();

        Self::new(instrument, observations)
    }

    /// Instrument this series belongs to.
    pub const fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    /// Observations in date order.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// First and last observation dates.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.observations.first(), self.observations.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }

    /// Price on an exact date, if observed.
    pub fn price_on(&self, date: NaiveDate) -> Option<f64> {
        self.observations
            .binary_search_by_key(&date, |o| o.date)
            .ok()
            .map(|idx| self.observations[idx].price)
    }

    /// Sub-series restricted to `start..=end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let observations = self
            .observations
            .iter()
            .filter(|o| o.date >= start && o.date <= end)
            .copied()
            .collect();

        Self {
            instrument: self.instrument.clone(),
            observations,
        }
    }
}

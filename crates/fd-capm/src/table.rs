//! Typed, date-indexed tables shared by every pipeline stage.
//!
//! A [`Table`] is an ordered column list (tradable instruments followed by the
//! benchmark) with one row per date. Column identity and row alignment are
//! validated at construction, so a column can never silently drift against the
//! date index. The `K` marker separates price levels ([`AlignedTable`]) from
//! percentage returns ([`ReturnsTable`]) at compile time.

use crate::{CapmError, InstrumentId, Result};
use chrono::NaiveDate;
use ndarray::Array2;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::marker::PhantomData;

/// Marker for tables holding price levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prices {}

/// Marker for tables holding percentage daily returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returns {}

/// Date-aligned prices (raw or normalized), benchmark included.
pub type AlignedTable = Table<Prices>;

/// Percentage simple returns with the same shape as the source [`AlignedTable`].
pub type ReturnsTable = Table<Returns>;

/// Row-aligned table of `f64` columns indexed by ascending dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "")]
pub struct Table<K> {
    dates: Vec<NaiveDate>,
    instruments: Vec<InstrumentId>,
    benchmark: InstrumentId,
    /// One column per instrument, benchmark last.
    columns: Vec<Vec<f64>>,
    #[serde(skip)]
    kind: PhantomData<K>,
}

impl<K> Table<K> {
    /// Create a validated table.
    ///
    /// `columns` holds one vector per entry of `instruments`, followed by the
    /// benchmark column. Every column must have exactly one value per date.
    pub fn new(
        dates: Vec<NaiveDate>,
        instruments: Vec<InstrumentId>,
        benchmark: InstrumentId,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if let Some(pair) = dates.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(CapmError::UnorderedDates {
                previous: pair[0],
                next: pair[1],
            });
        }

        let mut seen = HashSet::with_capacity(instruments.len() + 1);
        for id in instruments.iter().chain(std::iter::once(&benchmark)) {
            if !seen.insert(id) {
                return Err(CapmError::DuplicateInstrument(id.to_string()));
            }
        }

        if columns.len() != instruments.len() + 1 {
            return Err(CapmError::InvalidSeries {
                instrument: benchmark.to_string(),
                reason: format!(
                    "expected {} columns, got {}",
                    instruments.len() + 1,
                    columns.len()
                ),
            });
        }

        let ids = instruments.iter().chain(std::iter::once(&benchmark));
        for (id, column) in ids.zip(&columns) {
            if column.len() != dates.len() {
                return Err(CapmError::InvalidSeries {
                    instrument: id.to_string(),
                    reason: format!("{} values for {} dates", column.len(), dates.len()),
                });
            }
        }

        Ok(Self {
            dates,
            instruments,
            benchmark,
            columns,
            kind: PhantomData,
        })
    }

    /// Row dates in ascending order.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Tradable instruments in column order.
    pub fn instruments(&self) -> &[InstrumentId] {
        &self.instruments
    }

    /// Benchmark column identifier.
    pub const fn benchmark(&self) -> &InstrumentId {
        &self.benchmark
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// All column identifiers, benchmark last.
    pub fn column_ids(&self) -> impl Iterator<Item = &InstrumentId> {
        self.instruments
            .iter()
            .chain(std::iter::once(&self.benchmark))
    }

    /// Values of the named column (instrument or benchmark).
    pub fn column(&self, id: &str) -> Option<&[f64]> {
        self.position(id).map(|idx| self.columns[idx].as_slice())
    }

    /// Values of the benchmark column.
    pub fn benchmark_column(&self) -> &[f64] {
        &self.columns[self.instruments.len()]
    }

    /// Values of one row in column order, benchmark last.
    pub fn row(&self, idx: usize) -> Option<Vec<f64>> {
        (idx < self.len()).then(|| self.columns.iter().map(|c| c[idx]).collect())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.column_ids().position(|c| c.as_str() == id)
    }

    /// Build a same-shaped table by transforming every column independently.
    pub(crate) fn map_columns<T, F>(&self, mut f: F) -> Result<Table<T>>
    where
        F: FnMut(&InstrumentId, &[f64]) -> Result<Vec<f64>>,
    {
        let columns = self
            .column_ids()
            .zip(&self.columns)
            .map(|(id, values)| f(id, values))
            .collect::<Result<Vec<_>>>()?;

        Table::new(
            self.dates.clone(),
            self.instruments.clone(),
            self.benchmark.clone(),
            columns,
        )
    }

    /// Values as a `rows x columns` matrix, benchmark last.
    pub fn to_matrix(&self) -> Result<Array2<f64>> {
        let rows = self.len();
        let cols = self.columns.len();
        let mut flat = Vec::with_capacity(rows * cols);
        for idx in 0..rows {
            flat.extend(self.columns.iter().map(|c| c[idx]));
        }

        Ok(Array2::from_shape_vec((rows, cols), flat)?)
    }

    /// Convert to a DataFrame with a `date` column followed by one `f64`
    /// column per instrument and the benchmark.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut frame_columns = Vec::with_capacity(self.columns.len() + 1);
        frame_columns.push(Column::from(
            DateChunked::from_naive_date(PlSmallStr::from_static("date"), self.dates.iter().copied())
                .into_series(),
        ));

        for (id, values) in self.column_ids().zip(&self.columns) {
            frame_columns.push(Column::from(Series::new(
                PlSmallStr::from(id.as_str()),
                values.as_slice(),
            )));
        }

        Ok(DataFrame::new(frame_columns)?)
    }

    /// First `n` rows as a DataFrame.
    pub fn head(&self, n: usize) -> Result<DataFrame> {
        Ok(self.to_dataframe()?.head(Some(n)))
    }

    /// Last `n` rows as a DataFrame.
    pub fn tail(&self, n: usize) -> Result<DataFrame> {
        Ok(self.to_dataframe()?.tail(Some(n)))
    }
}

//! Daily percentage returns.
//!
//! `r[t] = (p[t] / p[t-1] - 1) × 100`, computed per column with no coupling
//! between instruments. Row 0 has no prior observation and is defined as zero.

use crate::{AlignedTable, Result, ReturnsTable};

/// Convert an aligned price table into percentage simple returns.
///
/// The result has the same dates and columns as `table`, and row 0 is zero for
/// every column.
///
/// A NaN price produces a `0` return in its own cell, and the next defined
/// price is compared against the last defined one, so a gap does not swallow
/// the move that follows it. A return against a zero or missing base is also
/// filled with `0`. This keeps compatibility with the dashboard this pipeline
/// feeds, but it understates volatility: the filled cells are not a sound basis
/// for further statistics.
pub fn daily_returns(table: &AlignedTable) -> Result<ReturnsTable> {
    let mut filled = 0usize;
    let returns = table.map_columns(|_, prices| {
        let mut column = Vec::with_capacity(prices.len());
        let mut last = prices.first().copied().filter(|p| p.is_finite());
        if !prices.is_empty() {
            column.push(0.0);
        }
        for &price in prices.iter().skip(1) {
            if !price.is_finite() {
                filled += 1;
                column.push(0.0);
                continue;
            }

            let r = last.map_or(f64::NAN, |base| (price / base - 1.0) * 100.0);
            if r.is_finite() {
                column.push(r);
            } else {
                filled += 1;
                column.push(0.0);
            }
            last = Some(price);
        }
        Ok(column)
    })?;

    if filled > 0 {
        tracing::warn!(filled, "undefined daily returns filled with zero");
    }
    tracing::debug!(rows = returns.len(), "computed daily returns");

    Ok(returns)
}

/// Compound percentage returns back into a growth index starting at `1.0`.
///
/// For returns produced by [`daily_returns`] from a table without undefined
/// cells this reproduces the normalized price table.
pub fn cumulative_growth(returns: &ReturnsTable) -> Result<AlignedTable> {
    returns.map_columns(|_, column| {
        Ok(column
            .iter()
            .scan(1.0, |level, r| {
                *level *= 1.0 + r / 100.0;
                Some(*level)
            })
            .collect())
    })
}

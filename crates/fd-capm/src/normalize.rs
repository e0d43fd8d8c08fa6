//! Price normalization to a common base.
//!
//! Every column is divided by its own first-row value so all series start at
//! `1.0`, making instruments with very different price levels comparable on
//! one chart.

use crate::{AlignedTable, CapmError, Result};

/// Rescale every column (benchmark included) by its first-row value.
///
/// The input table is left untouched. Normalizing an already-normalized table
/// returns an equal table.
///
/// # Errors
///
/// [`CapmError::InvalidBaseValue`] when a first-row value is zero or not finite.
pub fn normalize(table: &AlignedTable) -> Result<AlignedTable> {
    let normalized = table.map_columns(|id, values| {
        let base = values.first().copied().unwrap_or(f64::NAN);
        if base == 0.0 || !base.is_finite() {
            return Err(CapmError::InvalidBaseValue {
                instrument: id.to_string(),
                value: base,
            });
        }

        Ok(values.iter().map(|v| v / base).collect())
    })?;

    tracing::debug!(rows = normalized.len(), "normalized price table");
    Ok(normalized)
}

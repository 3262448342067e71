use async_trait::async_trait;
use tracing::warn;

use crate::{error::StoreError, store::Worksheet};

/// A minimal interface for allocating row ids within a worksheet.
///
/// Ids are positive, and every allocated id is strictly greater than every id
/// already present in the worksheet when the allocation happened. Neither
/// implementation coordinates with other writers: two concurrent submissions
/// may be handed the same id.
#[async_trait]
pub trait IdAllocator: Send + Sync {
    /// Returns the id for the next row appended to `worksheet`.
    ///
    /// # Errors
    ///
    /// Returns an error if the worksheet cannot be read, or
    /// [`StoreError::IdSpaceExhausted`] once the id column holds `u64::MAX`.
    async fn next_id<W: Worksheet>(&self, worksheet: &W) -> Result<u64, StoreError>;
}

/// Returns the id following the largest assigned id, or `1` when nothing has
/// been assigned yet.
///
/// Returns `None` when the largest assigned id is `u64::MAX`.
pub const fn next_id_after(max_assigned: Option<u64>) -> Option<u64> {
    match max_assigned {
        Some(max) => max.checked_add(1),
        None => Some(1),
    }
}

/// Returns the largest id in a column of raw id cells.
///
/// Blank cells are skipped. Cells holding anything other than a non-negative
/// whole number are skipped with a warning.
pub fn max_assigned_id<S: AsRef<str>>(cells: &[S]) -> Option<u64> {
    cells.iter().filter_map(|c| parse_id_cell(c.as_ref())).max()
}

/// Parses a raw id cell. Accepts `7` as well as the `7.0` some backends
/// render numbers as.
pub fn parse_id_cell(cell: &str) -> Option<u64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(id) = cell.parse::<u64>() {
        return Some(id);
    }
    match cell.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 => {
            Some(f as u64)
        }
        _ => {
            warn!(cell, "skipping non-numeric id cell");
            None
        }
    }
}

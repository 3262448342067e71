use async_trait::async_trait;
use tracing::instrument;

use crate::{
    allocator::{IdAllocator, max_assigned_id, next_id_after},
    error::StoreError,
    store::Worksheet,
};

/// Column holding row ids.
pub const ID_COLUMN: usize = 1;

/// First row below the header.
pub const FIRST_DATA_ROW: usize = 2;

/// An allocator that re-reads the id column for every allocation.
///
/// Each call costs two reads, but always observes rows appended by earlier
/// calls and by other writers up to the moment of the read.
///
/// ## Features
/// - ✅ No state, nothing to invalidate
/// - ✅ Sees rows written by other writers between allocations
/// - ❌ One round-trip per allocated id
///
/// ## See Also
/// - [`CounterAllocator`]
///
/// [`CounterAllocator`]: crate::CounterAllocator
#[derive(Clone, Copy, Debug, Default)]
pub struct ReadMaxAllocator;

impl ReadMaxAllocator {
    pub const fn new() -> Self {
        Self
    }

    /// Reads the largest id currently in the worksheet.
    ///
    /// # Errors
    ///
    /// Returns an error if the worksheet cannot be read.
    pub async fn current_max<W: Worksheet>(worksheet: &W) -> Result<Option<u64>, StoreError> {
        let last_row = worksheet.last_row().await?;
        if last_row < FIRST_DATA_ROW {
            return Ok(None);
        }
        let cells = worksheet
            .read_column(FIRST_DATA_ROW, last_row, ID_COLUMN)
            .await?;
        Ok(max_assigned_id(&cells))
    }
}

#[async_trait]
impl IdAllocator for ReadMaxAllocator {
    #[instrument(level = "trace", skip_all, fields(worksheet = worksheet.name()))]
    async fn next_id<W: Worksheet>(&self, worksheet: &W) -> Result<u64, StoreError> {
        let max = Self::current_max(worksheet).await?;
        next_id_after(max).ok_or_else(|| StoreError::IdSpaceExhausted {
            worksheet: worksheet.name().to_string(),
        })
    }
}

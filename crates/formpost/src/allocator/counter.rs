use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::Mutex;
use portable_atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::{
    allocator::{IdAllocator, ReadMaxAllocator},
    error::StoreError,
    store::Worksheet,
};

/// An allocator that reads each worksheet once and then counts in memory.
///
/// The first allocation for a worksheet seeds an [`AtomicU64`] from the
/// largest id present; later allocations increment it without touching the
/// store. Allocations from one process never collide, even when submissions
/// for the same worksheet overlap.
///
/// ## Features
/// - ✅ One read per worksheet for the lifetime of the allocator
/// - ✅ Overlapping submissions in one process get distinct ids
/// - ❌ Rows written by other processes after seeding are not seen
///
/// ## See Also
/// - [`ReadMaxAllocator`]
#[derive(Clone, Debug, Default)]
pub struct CounterAllocator {
    counters: Arc<Mutex<HashMap<String, Arc<AtomicU64>>>>,
}

impl CounterAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the counter of a worksheet so that the next allocation re-reads
    /// it.
    pub fn forget(&self, worksheet: &str) {
        self.counters.lock().remove(worksheet);
    }

    async fn counter<W: Worksheet>(&self, worksheet: &W) -> Result<Arc<AtomicU64>, StoreError> {
        let existing = self.counters.lock().get(worksheet.name()).cloned();
        if let Some(counter) = existing {
            return Ok(counter);
        }

        let seed = ReadMaxAllocator::current_max(worksheet).await?.unwrap_or(0);
        debug!(worksheet = worksheet.name(), seed, "seeded id counter");
        let counter = Arc::clone(
            self.counters
                .lock()
                .entry(worksheet.name().to_string())
                .or_insert_with(|| Arc::new(AtomicU64::new(seed))),
        );
        Ok(counter)
    }
}

#[async_trait]
impl IdAllocator for CounterAllocator {
    async fn next_id<W: Worksheet>(&self, worksheet: &W) -> Result<u64, StoreError> {
        let counter = self.counter(worksheet).await?;
        counter
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
            .map(|previous| previous + 1)
            .map_err(|_| StoreError::IdSpaceExhausted {
                worksheet: worksheet.name().to_string(),
            })
    }
}

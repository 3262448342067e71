use core::{fmt, str::FromStr};

use async_trait::async_trait;

use crate::{
    allocator::{CounterAllocator, IdAllocator, ReadMaxAllocator},
    error::StoreError,
    store::Worksheet,
};

/// An allocator picked at runtime, for callers that cannot name the concrete
/// strategy at compile time.
#[derive(Clone, Debug)]
pub enum AllocationStrategy {
    ReadMax(ReadMaxAllocator),
    Counter(CounterAllocator),
}

impl Default for AllocationStrategy {
    fn default() -> Self {
        Self::ReadMax(ReadMaxAllocator)
    }
}

impl FromStr for AllocationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read-max" | "read_max" => Ok(Self::ReadMax(ReadMaxAllocator)),
            "counter" => Ok(Self::Counter(CounterAllocator::new())),
            other => Err(format!(
                "unknown allocation strategy {other:?}, expected read-max or counter"
            )),
        }
    }
}

impl fmt::Display for AllocationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReadMax(_) => "read-max",
            Self::Counter(_) => "counter",
        })
    }
}

#[async_trait]
impl IdAllocator for AllocationStrategy {
    async fn next_id<W: Worksheet>(&self, worksheet: &W) -> Result<u64, StoreError> {
        match self {
            Self::ReadMax(allocator) => allocator.next_id(worksheet).await,
            Self::Counter(allocator) => allocator.next_id(worksheet).await,
        }
    }
}

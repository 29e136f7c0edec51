//! Monotonic ID allocation

use async_trait::async_trait;

use crate::domain::DomainResult;

/// Hands out strictly increasing IDs, including across restarts.
#[async_trait]
pub trait IdAllocator: Send + Sync {
    /// Claim the next ID. Claimed IDs are never handed out again, whether or
    /// not the caller ends up using them.
    async fn next_id(&self) -> DomainResult<u64>;

    /// Give back the unused part of the current lease so the next process
    /// continues without a gap.
    async fn release(&self) -> DomainResult<()>;
}

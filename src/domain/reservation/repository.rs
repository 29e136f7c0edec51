//! Reservation repository interface

use async_trait::async_trait;

use super::model::{DayRange, Reservation, ReservationKind};
use crate::domain::DomainResult;

/// Result of one admission transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The reservation is durable.
    Committed,
    /// The car already holds this overlapping reservation; nothing was written.
    Overlap(Reservation),
}

/// Per-car interval index over the store.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    fn kind(&self) -> ReservationKind;

    /// Whether no stored reservation of `car_id` overlaps `range`.
    async fn is_free(&self, car_id: u64, range: DayRange) -> DomainResult<bool>;

    /// All readable reservations of `car_id`, in key order.
    async fn find_for_car(&self, car_id: u64) -> DomainResult<Vec<Reservation>>;

    /// Re-check freedom and write `reservation` in one transaction.
    ///
    /// Fails with `DomainError::CommitConflict` when the store rejects the
    /// commit because of a concurrent writer.
    async fn admit(&self, reservation: &Reservation) -> DomainResult<Admission>;
}

//! Reservation manager
//!
//! Admission of bookings and leases: validate the day range, claim an ID,
//! then re-check and write inside one store transaction while holding the
//! car's admission gate. A transaction that loses a commit race is re-run a
//! bounded number of times and reported as a conflict once attempts run out.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::admission_gate::AdmissionGate;
use crate::domain::{
    Admission, DayRange, DomainError, DomainResult, IdAllocator, Principal, Reservation,
    ReservationKind, ReservationRepository,
};
use crate::shared::utills::{retry_with_backoff, RetryConfig};

/// Final outcome label for `reservation_admissions_total`.
#[derive(Debug, Clone, Copy)]
enum Outcome {
    Accepted,
    Conflict,
    Invalid,
    Error,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::Conflict => "conflict",
            Outcome::Invalid => "invalid",
            Outcome::Error => "error",
        }
    }
}

pub struct ReservationManager {
    repo: Arc<dyn ReservationRepository>,
    ids: Arc<dyn IdAllocator>,
    gate: AdmissionGate,
    retry: RetryConfig,
}

impl ReservationManager {
    pub fn new(
        repo: Arc<dyn ReservationRepository>,
        ids: Arc<dyn IdAllocator>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            repo,
            ids,
            gate: AdmissionGate::new(),
            retry,
        }
    }

    pub fn kind(&self) -> ReservationKind {
        self.repo.kind()
    }

    fn record(&self, outcome: Outcome) {
        metrics::counter!(
            "reservation_admissions_total",
            "kind" => self.kind().as_str(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
    }

    /// Admit a reservation of `car_id` for `[from_day, to_day]` owned by
    /// `principal`.
    ///
    /// Overlap with an existing reservation, and commit races that outlast
    /// the retry budget, both end in `DomainError::ReservationExists`.
    pub async fn create(
        &self,
        principal: &Principal,
        car_id: u64,
        from_day: u64,
        to_day: u64,
    ) -> DomainResult<Reservation> {
        let kind = self.kind();

        let range = DayRange::new(from_day, to_day).inspect_err(|_| self.record(Outcome::Invalid))?;

        let reservation_id = match self.ids.next_id().await {
            Ok(id) => id,
            Err(e) => {
                error!(%kind, car_id, error = %e, "Failed to allocate reservation id");
                self.record(Outcome::Error);
                return Err(e);
            }
        };
        let reservation = Reservation::new(reservation_id, car_id, principal.user_id, range);

        let admitted = {
            let _permit = self.gate.enter(car_id).await;
            retry_with_backoff(
                &self.retry,
                |_| self.repo.admit(&reservation),
                DomainError::is_commit_conflict,
                |_| {
                    metrics::counter!("reservation_commit_retries_total", "kind" => kind.as_str())
                        .increment(1)
                },
                "reservation_admit",
            )
            .await
        };

        match admitted {
            Ok(Admission::Committed) => {
                self.record(Outcome::Accepted);
                info!(
                    %kind,
                    id = reservation.reservation_id,
                    car_id,
                    user_id = principal.user_id,
                    range = %range,
                    "Reservation admitted"
                );
                Ok(reservation)
            }
            Ok(Admission::Overlap(existing)) => {
                self.record(Outcome::Conflict);
                info!(
                    %kind,
                    car_id,
                    requested = %range,
                    existing_id = existing.reservation_id,
                    "Reservation rejected: overlap"
                );
                Err(DomainError::ReservationExists(kind))
            }
            Err(e) if e.is_commit_conflict() => {
                self.record(Outcome::Conflict);
                warn!(%kind, car_id, requested = %range, error = %e, "Commit conflicts exhausted");
                Err(DomainError::ReservationExists(kind))
            }
            Err(e) => {
                self.record(Outcome::Error);
                error!(%kind, car_id, requested = %range, error = %e, "Admission failed");
                Err(e)
            }
        }
    }

    /// Whether `car_id` has no reservation overlapping `[from_day, to_day]`.
    pub async fn is_free(&self, car_id: u64, from_day: u64, to_day: u64) -> DomainResult<bool> {
        let range = DayRange::new(from_day, to_day)?;
        self.repo.is_free(car_id, range).await
    }

    pub async fn list_for_car(&self, car_id: u64) -> DomainResult<Vec<Reservation>> {
        self.repo.find_for_car(car_id).await
    }

    /// Hand the unused part of the ID lease back to the store.
    pub async fn release(&self) -> DomainResult<()> {
        self.ids.release().await
    }
}

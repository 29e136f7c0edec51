//! SeaORM implementation of ReservationRepository
//!
//! The interval index is a view over the car's key prefix in `kv_entries`.
//! Every read runs inside a transaction so a multi-page scan sees one
//! snapshot.

use std::ops::ControlFlow;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use tracing::{debug, warn};

use crate::domain::{
    Admission, DayRange, DomainResult, Reservation, ReservationKind, ReservationRepository,
};
use crate::infrastructure::database::entities::kv_entry;
use crate::infrastructure::database::keys::{car_prefix, reservation_key};
use crate::infrastructure::database::kv;
use crate::infrastructure::database::records::ReservationRecord;

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
    kind: ReservationKind,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection, kind: ReservationKind) -> Self {
        Self { db, kind }
    }
}

// ── Index helpers ───────────────────────────────────────────────

/// Decode a stored entry, logging and skipping anything unreadable.
fn decode_entry(kind: ReservationKind, entry: &kv_entry::Model) -> Option<Reservation> {
    let record = match ReservationRecord::decode(&entry.value) {
        Ok(record) => record,
        Err(e) => {
            warn!(%kind, key = %entry.key, error = %e, "Skipping undecodable reservation record");
            return None;
        }
    };
    match record.into_domain() {
        Ok(reservation) => Some(reservation),
        Err(e) => {
            warn!(%kind, key = %entry.key, error = %e, "Skipping invalid reservation record");
            None
        }
    }
}

/// First stored reservation of `car_id` overlapping `range`, if any.
async fn first_overlap<C: ConnectionTrait>(
    conn: &C,
    kind: ReservationKind,
    car_id: u64,
    range: DayRange,
) -> Result<Option<Reservation>, DbErr> {
    let mut hit = None;
    kv::scan_prefix(conn, &car_prefix(car_id), |entry| {
        match decode_entry(kind, entry) {
            Some(existing) if existing.range.overlaps(&range) => {
                hit = Some(existing);
                ControlFlow::Break(())
            }
            _ => ControlFlow::Continue(()),
        }
    })
    .await?;
    Ok(hit)
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    fn kind(&self) -> ReservationKind {
        self.kind
    }

    async fn is_free(&self, car_id: u64, range: DayRange) -> DomainResult<bool> {
        let txn = self.db.begin().await?;
        let overlap = first_overlap(&txn, self.kind, car_id, range).await?;
        txn.commit().await?;
        Ok(overlap.is_none())
    }

    async fn find_for_car(&self, car_id: u64) -> DomainResult<Vec<Reservation>> {
        let txn = self.db.begin().await?;
        let mut found = Vec::new();
        kv::scan_prefix(&txn, &car_prefix(car_id), |entry| {
            found.extend(decode_entry(self.kind, entry));
            ControlFlow::Continue(())
        })
        .await?;
        txn.commit().await?;
        Ok(found)
    }

    async fn admit(&self, reservation: &Reservation) -> DomainResult<Admission> {
        let txn = self.db.begin().await?;

        if let Some(existing) =
            first_overlap(&txn, self.kind, reservation.car_id, reservation.range).await?
        {
            debug!(
                kind = %self.kind,
                car_id = reservation.car_id,
                requested = %reservation.range,
                existing = %existing.range,
                "Overlapping reservation"
            );
            return Ok(Admission::Overlap(existing));
        }

        let key = reservation_key(reservation.car_id, reservation.range);
        let value = ReservationRecord::from(reservation).encode()?;
        kv::insert(&txn, &key, value).await?;
        txn.commit().await?;

        debug!(kind = %self.kind, key = %key, id = reservation.reservation_id, "Reservation stored");
        Ok(Admission::Committed)
    }
}

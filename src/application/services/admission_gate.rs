//! Per-car admission gate
//!
//! Serializes admission transactions for the same car inside one process.
//! Cars are independent: admissions for different cars never wait on each
//! other here.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct AdmissionGate {
    slots: DashMap<u64, Arc<Mutex<()>>>,
}

/// Held while one admission for `car_id` runs. Dropping it lets the next
/// waiter in.
pub struct AdmissionPermit<'a> {
    car_id: u64,
    guard: Option<OwnedMutexGuard<()>>,
    slots: &'a DashMap<u64, Arc<Mutex<()>>>,
}

impl AdmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enter(&self, car_id: u64) -> AdmissionPermit<'_> {
        let slot = self.slots.entry(car_id).or_default().clone();
        let guard = slot.lock_owned().await;
        AdmissionPermit {
            car_id,
            guard: Some(guard),
            slots: &self.slots,
        }
    }

    /// Number of cars with an admission in flight or queued.
    pub fn active_cars(&self) -> usize {
        self.slots.len()
    }
}

impl Drop for AdmissionPermit<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map still references the slot: nobody is waiting.
        self.slots
            .remove_if(&self.car_id, |_, slot| Arc::strong_count(slot) == 1);
    }
}

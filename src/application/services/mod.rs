//! Application services

mod admission_gate;
mod reservation_manager;

pub use admission_gate::{AdmissionGate, AdmissionPermit};
pub use reservation_manager::ReservationManager;

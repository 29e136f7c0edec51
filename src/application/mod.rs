pub mod identity;
pub mod services;

pub use identity::UserService;
pub use services::{AdmissionGate, ReservationManager};

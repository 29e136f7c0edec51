//! Reservation aggregate
//!
//! Bookings and leases: the day-range model, the overlap predicate and the
//! repository interface the admission protocol runs against.

pub mod model;
pub mod repository;

pub use model::{DayRange, Reservation, ReservationKind};
pub use repository::{Admission, ReservationRepository};

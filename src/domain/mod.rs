pub mod reservation;
pub mod sequence;
pub mod user;

// Re-export commonly used types
pub use reservation::{Admission, DayRange, Reservation, ReservationKind, ReservationRepository};
pub use sequence::IdAllocator;
pub use user::{Principal, User, UserRepositoryInterface};

// Re-export error types from shared for convenience
pub use crate::shared::types::errors::{DomainError, DomainResult, ErrorKind, InfraError};

//! Database repository implementations

pub mod reservation_repository;
pub mod sequence_allocator;
pub mod user_repository;

pub use reservation_repository::SeaOrmReservationRepository;
pub use sequence_allocator::{SeaOrmSequenceAllocator, DEFAULT_BANDWIDTH};
pub use user_repository::UserRepository;

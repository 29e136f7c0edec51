//! # Car Rental Services
//!
//! HTTP microservices for a car-rental domain: user registration and
//! authentication, car leases and time-bounded bookings. Bookings and leases
//! share one availability core that admits a day range for a car only when
//! it overlaps none of the car's existing reservations.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Reservation and user entities, errors, repository traits
//! - **application**: Reservation manager, admission gate, user service
//! - **infrastructure**: SeaORM key-value store, ID sequences, crypto
//! - **interfaces**: Axum routers, extractors and middleware
//! - **shared**: Shutdown coordination, retry helper, error types

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig, ServiceKind};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig};

pub use application::{ReservationManager, UserService};
pub use domain::{DomainError, DomainResult, Principal, Reservation, ReservationKind};

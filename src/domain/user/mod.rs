//! User aggregate
//!
//! Accounts managed by the auth service and the principal other services
//! receive from a verified token.

pub mod model;
pub mod repository;

pub use model::{Principal, User};
pub use repository::UserRepositoryInterface;

//! Identity module — user registration & authentication

pub mod service;

pub use service::{UserService, MAX_PASSWORD_CHARS, MAX_USERNAME_CHARS};

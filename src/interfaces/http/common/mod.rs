//! Shared HTTP building blocks

pub mod api_error;
pub mod json_body;

pub use api_error::{ApiError, ApiResult};
pub use json_body::{JsonBody, JsonBodyRejection};

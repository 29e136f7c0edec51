//! HTTP REST API interfaces
//!
//! - `common`: error mapping and the JSON body extractor
//! - `middleware`: `X-Auth` token verification
//! - `modules`: handlers and DTOs per resource
//! - `router`: per-service routers with OpenAPI documents

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_auth_router, create_booking_router, create_lease_router, CommonRoutes};

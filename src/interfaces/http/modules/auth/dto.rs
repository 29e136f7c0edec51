//! Authentication DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Body of both `/create_user` and `/auth_user`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UserCredentials {
    #[validate(length(min = 1, max = 64, message = "username must be 1-64 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 128, message = "password must be 1-128 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserResponse {
    pub user_id: u64,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthUserResponse {
    pub token: String,
}

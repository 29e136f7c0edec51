//! Authentication API handlers

use std::sync::Arc;

use axum::{extract::State, Json};

use super::dto::{AuthUserResponse, CreateUserResponse, UserCredentials};
use crate::application::UserService;
use crate::infrastructure::database::repositories::UserRepository;
use crate::interfaces::http::common::{ApiResult, JsonBody};

/// Auth state
#[derive(Clone)]
pub struct AuthHandlerState {
    pub users: Arc<UserService<UserRepository>>,
}

#[utoipa::path(
    post,
    path = "/create_user",
    tag = "Authentication",
    request_body = UserCredentials,
    responses(
        (status = 200, description = "User registered", body = CreateUserResponse),
        (status = 400, description = "Invalid body or `user already exists`", body = String)
    )
)]
pub async fn create_user(
    State(state): State<AuthHandlerState>,
    JsonBody(request): JsonBody<UserCredentials>,
) -> ApiResult<Json<CreateUserResponse>> {
    let user = state
        .users
        .register(&request.username, &request.password)
        .await?;

    Ok(Json(CreateUserResponse {
        user_id: user.user_id,
        username: user.username,
    }))
}

#[utoipa::path(
    post,
    path = "/auth_user",
    tag = "Authentication",
    request_body = UserCredentials,
    responses(
        (status = 200, description = "Signed token for `X-Auth`", body = AuthUserResponse),
        (status = 400, description = "Invalid body or `wrong password`", body = String)
    )
)]
pub async fn auth_user(
    State(state): State<AuthHandlerState>,
    JsonBody(request): JsonBody<UserCredentials>,
) -> ApiResult<Json<AuthUserResponse>> {
    let token = state.users.login(&request.username, &request.password).await?;
    Ok(Json(AuthUserResponse { token }))
}

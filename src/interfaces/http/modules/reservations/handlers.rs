//! Booking and lease HTTP handlers
//!
//! The caller is always the verified [`Principal`] placed by the auth
//! middleware; request bodies never name the user.

use std::sync::Arc;

use axum::extract::State;
use axum::{Extension, Json};

use super::dto::*;
use crate::application::ReservationManager;
use crate::domain::Principal;
use crate::interfaces::http::common::{ApiResult, JsonBody};

/// Application state for reservation handlers.
#[derive(Clone)]
pub struct ReservationAppState {
    pub manager: Arc<ReservationManager>,
}

// ── Booking service ─────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/create_booking",
    tag = "Bookings",
    security(("x_auth" = [])),
    request_body = CarDaysRequest,
    responses(
        (status = 200, description = "Booking admitted", body = BookingResponse),
        (status = 400, description = "Invalid body, reversed range or `booking already exists`", body = String),
        (status = 401, description = "Missing or invalid token", body = String)
    )
)]
pub async fn create_booking(
    State(state): State<ReservationAppState>,
    Extension(principal): Extension<Principal>,
    JsonBody(request): JsonBody<CarDaysRequest>,
) -> ApiResult<Json<BookingResponse>> {
    let booking = state
        .manager
        .create(&principal, request.car_id, request.from_day, request.to_day)
        .await?;
    Ok(Json(booking.into()))
}

#[utoipa::path(
    post,
    path = "/check_car",
    tag = "Bookings",
    security(("x_auth" = [])),
    request_body = CarDaysRequest,
    responses(
        (status = 200, description = "Whether the car is free for the whole range", body = CheckCarResponse),
        (status = 400, description = "Invalid body or reversed range", body = String),
        (status = 401, description = "Missing or invalid token", body = String)
    )
)]
pub async fn check_car(
    State(state): State<ReservationAppState>,
    JsonBody(request): JsonBody<CarDaysRequest>,
) -> ApiResult<Json<CheckCarResponse>> {
    let is_free = state
        .manager
        .is_free(request.car_id, request.from_day, request.to_day)
        .await?;
    Ok(Json(CheckCarResponse { is_free }))
}

#[utoipa::path(
    post,
    path = "/car_bookings",
    tag = "Bookings",
    security(("x_auth" = [])),
    request_body = CarRequest,
    responses(
        (status = 200, description = "Bookings of the car in key order", body = CarBookingsResponse),
        (status = 401, description = "Missing or invalid token", body = String)
    )
)]
pub async fn car_bookings(
    State(state): State<ReservationAppState>,
    JsonBody(request): JsonBody<CarRequest>,
) -> ApiResult<Json<CarBookingsResponse>> {
    let bookings = state.manager.list_for_car(request.car_id).await?;
    Ok(Json(CarBookingsResponse {
        bookings: bookings.into_iter().map(Into::into).collect(),
    }))
}

// ── Lease service ───────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/create_lease",
    tag = "Leases",
    security(("x_auth" = [])),
    request_body = CarDaysRequest,
    responses(
        (status = 200, description = "Lease admitted", body = LeaseResponse),
        (status = 400, description = "Invalid body, reversed range or `lease already exists`", body = String),
        (status = 401, description = "Missing or invalid token", body = String)
    )
)]
pub async fn create_lease(
    State(state): State<ReservationAppState>,
    Extension(principal): Extension<Principal>,
    JsonBody(request): JsonBody<CarDaysRequest>,
) -> ApiResult<Json<LeaseResponse>> {
    let lease = state
        .manager
        .create(&principal, request.car_id, request.from_day, request.to_day)
        .await?;
    Ok(Json(lease.into()))
}

#[utoipa::path(
    post,
    path = "/car_leases",
    tag = "Leases",
    security(("x_auth" = [])),
    request_body = CarRequest,
    responses(
        (status = 200, description = "Leases of the car in key order", body = CarLeasesResponse),
        (status = 401, description = "Missing or invalid token", body = String)
    )
)]
pub async fn car_leases(
    State(state): State<ReservationAppState>,
    JsonBody(request): JsonBody<CarRequest>,
) -> ApiResult<Json<CarLeasesResponse>> {
    let leases = state.manager.list_for_car(request.car_id).await?;
    Ok(Json(CarLeasesResponse {
        leases: leases.into_iter().map(Into::into).collect(),
    }))
}

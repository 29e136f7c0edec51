//! Booking and lease DTOs
//!
//! Both services accept the same request shapes; responses name the ID after
//! the service (`booking_id` / `lease_id`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::Reservation;

/// Car and inclusive day range, as sent to `/create_booking`,
/// `/create_lease` and `/check_car`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CarDaysRequest {
    pub car_id: u64,
    pub from_day: u64,
    pub to_day: u64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CarRequest {
    pub car_id: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    pub user_id: u64,
    pub car_id: u64,
    pub booking_id: u64,
    pub from_day: u64,
    pub to_day: u64,
}

impl From<Reservation> for BookingResponse {
    fn from(r: Reservation) -> Self {
        Self {
            user_id: r.user_id,
            car_id: r.car_id,
            booking_id: r.reservation_id,
            from_day: r.from_day(),
            to_day: r.to_day(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaseResponse {
    pub user_id: u64,
    pub car_id: u64,
    pub lease_id: u64,
    pub from_day: u64,
    pub to_day: u64,
}

impl From<Reservation> for LeaseResponse {
    fn from(r: Reservation) -> Self {
        Self {
            user_id: r.user_id,
            car_id: r.car_id,
            lease_id: r.reservation_id,
            from_day: r.from_day(),
            to_day: r.to_day(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckCarResponse {
    pub is_free: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CarBookingsResponse {
    pub bookings: Vec<BookingResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CarLeasesResponse {
    pub leases: Vec<LeaseResponse>,
}

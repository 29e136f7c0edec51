//! Reservation domain entity

use std::fmt;

use crate::domain::{DomainError, DomainResult};

/// Which service a reservation belongs to.
///
/// Bookings and leases share the admission machinery but live in separate
/// stores, with their own ID sequences and wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationKind {
    Booking,
    Lease,
}

impl ReservationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::Lease => "lease",
        }
    }

    /// Name of the store sequence reservation IDs are drawn from.
    pub fn sequence_name(&self) -> &'static str {
        match self {
            Self::Booking => "booking_id_sequence",
            Self::Lease => "lease_id_sequence",
        }
    }
}

impl fmt::Display for ReservationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range of day ordinals, `from_day <= to_day`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayRange {
    from_day: u64,
    to_day: u64,
}

impl DayRange {
    pub fn new(from_day: u64, to_day: u64) -> DomainResult<Self> {
        if from_day > to_day {
            return Err(DomainError::InvalidRange { from_day, to_day });
        }
        Ok(Self { from_day, to_day })
    }

    pub fn from_day(&self) -> u64 {
        self.from_day
    }

    pub fn to_day(&self) -> u64 {
        self.to_day
    }

    /// Inclusive on both ends: `[1,3]` and `[3,5]` share day 3.
    pub fn overlaps(&self, other: &DayRange) -> bool {
        other.from_day <= self.to_day && self.from_day <= other.to_day
    }
}

impl fmt::Display for DayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from_day, self.to_day)
    }
}

/// An admitted booking or lease of one car for a range of days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub reservation_id: u64,
    pub car_id: u64,
    pub user_id: u64,
    pub range: DayRange,
}

impl Reservation {
    pub fn new(reservation_id: u64, car_id: u64, user_id: u64, range: DayRange) -> Self {
        Self {
            reservation_id,
            car_id,
            user_id,
            range,
        }
    }

    pub fn from_day(&self) -> u64 {
        self.range.from_day()
    }

    pub fn to_day(&self) -> u64 {
        self.range.to_day()
    }
}

// ── Tests ──────────────────────────────────────────────────────

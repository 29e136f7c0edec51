//! JSON records stored as `kv_entries` values.

use serde::{Deserialize, Serialize};

use crate::domain::{DayRange, DomainResult, Reservation, User};

/// Stored form of a booking or lease.
///
/// Older stores named the ID field after the service, so both `booking_id`
/// and `lease_id` are accepted on read. They also left out zero-valued
/// fields, which read back as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRecord {
    #[serde(default, alias = "booking_id", alias = "lease_id")]
    pub reservation_id: u64,
    #[serde(default)]
    pub car_id: u64,
    #[serde(default)]
    pub user_id: u64,
    #[serde(default)]
    pub from_day: u64,
    #[serde(default)]
    pub to_day: u64,
}

impl ReservationRecord {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(value: &str) -> serde_json::Result<Self> {
        serde_json::from_str(value)
    }

    /// Stored day range, rejecting records with `from_day > to_day`.
    pub fn range(&self) -> DomainResult<DayRange> {
        DayRange::new(self.from_day, self.to_day)
    }

    pub fn into_domain(self) -> DomainResult<Reservation> {
        let range = self.range()?;
        Ok(Reservation::new(
            self.reservation_id,
            self.car_id,
            self.user_id,
            range,
        ))
    }
}

impl From<&Reservation> for ReservationRecord {
    fn from(r: &Reservation) -> Self {
        Self {
            reservation_id: r.reservation_id,
            car_id: r.car_id,
            user_id: r.user_id,
            from_day: r.from_day(),
            to_day: r.to_day(),
        }
    }
}

/// Stored form of a registered user, keyed by username.
///
/// Missing fields read as empty, as older stores omitted zero values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub user_id: u64,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password_hash: String,
}

impl From<&User> for UserRecord {
    fn from(u: &User) -> Self {
        Self {
            user_id: u.user_id,
            user_name: u.username.clone(),
            password_hash: u.password_hash.clone(),
        }
    }
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        User {
            user_id: r.user_id,
            username: r.user_name,
            password_hash: r.password_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_record_field_names() {
        let reservation = Reservation::new(3, 7, 42, DayRange::new(1, 3).unwrap());
        let json = ReservationRecord::from(&reservation).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "reservation_id": 3,
                "car_id": 7,
                "user_id": 42,
                "from_day": 1,
                "to_day": 3,
            })
        );
        assert_eq!(
            ReservationRecord::decode(&json).unwrap().into_domain().unwrap(),
            reservation
        );
    }

    #[test]
    fn test_legacy_id_field_names() {
        let booking = ReservationRecord::decode(
            r#"{"booking_id":5,"car_id":1,"user_id":2,"from_day":3,"to_day":4}"#,
        )
        .unwrap();
        assert_eq!(booking.reservation_id, 5);

        let lease = ReservationRecord::decode(
            r#"{"lease_id":6,"car_id":1,"user_id":2,"from_day":3,"to_day":4}"#,
        )
        .unwrap();
        assert_eq!(lease.reservation_id, 6);
    }

    #[test]
    fn test_reversed_stored_range_is_rejected() {
        let record = ReservationRecord::decode(
            r#"{"reservation_id":1,"car_id":1,"user_id":1,"from_day":9,"to_day":2}"#,
        )
        .unwrap();
        assert!(record.into_domain().is_err());
        assert!(ReservationRecord::decode("not json").is_err());
    }

    #[test]
    fn test_omitted_zero_fields_read_as_zero() {
        let record =
            ReservationRecord::decode(r#"{"car_id":7,"user_id":1,"booking_id":3,"to_day":5}"#)
                .unwrap();
        assert_eq!(record.from_day, 0);
        assert_eq!(record.range().unwrap(), DayRange::new(0, 5).unwrap());

        let first = ReservationRecord::decode(r#"{"car_id":2,"from_day":1,"to_day":1}"#).unwrap();
        assert_eq!(first.reservation_id, 0);
        assert_eq!(first.user_id, 0);

        let user: UserRecord =
            serde_json::from_str(r#"{"user_name":"root","password_hash":"$2b$04$x"}"#).unwrap();
        assert_eq!(user.user_id, 0);
    }

    #[test]
    fn test_user_record_layout() {
        let user = User {
            user_id: 1,
            username: "alice".into(),
            password_hash: "$2b$04$hash".into(),
        };
        let json = serde_json::to_value(UserRecord::from(&user)).unwrap();
        assert_eq!(json["user_name"], "alice");
        assert_eq!(json["user_id"], 1);

        let back: UserRecord = serde_json::from_value(json).unwrap();
        assert_eq!(User::from(back), user);
    }
}

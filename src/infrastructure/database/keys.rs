//! Storage key layout for reservations.
//!
//! A reservation lives under `"{car_id}_{from_day}_{to_day}"` in unpadded
//! decimal. The separator is not a digit, so `"{car_id}_"` selects exactly one
//! car's reservations: car `1` never matches car `10`.

use crate::domain::DayRange;

pub const KEY_SEPARATOR: char = '_';

/// Composite key of a reservation.
pub fn reservation_key(car_id: u64, range: DayRange) -> String {
    format!(
        "{car_id}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}",
        range.from_day(),
        range.to_day()
    )
}

/// Prefix shared by every reservation key of `car_id`.
pub fn car_prefix(car_id: u64) -> String {
    format!("{car_id}{KEY_SEPARATOR}")
}

/// Smallest string greater than every string starting with `prefix`.
///
/// Returns `None` when no such bound exists (empty prefix, or a prefix made
/// only of `char::MAX`), in which case the scan is open-ended.
pub fn prefix_upper_bound(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.pop() {
        if let Some(next) = char::from_u32(last as u32 + 1) {
            chars.push(next);
            return Some(chars.into_iter().collect());
        }
    }
    None
}

/// Decode a reservation key back into its car and day range.
pub fn parse_reservation_key(key: &str) -> Option<(u64, DayRange)> {
    let mut parts = key.split(KEY_SEPARATOR);
    let car_id = parts.next()?.parse().ok()?;
    let from_day = parts.next()?.parse().ok()?;
    let to_day = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let range = DayRange::new(from_day, to_day).ok()?;
    Some((car_id, range))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(from: u64, to: u64) -> DayRange {
        DayRange::new(from, to).unwrap()
    }

    #[test]
    fn test_reservation_key_layout() {
        assert_eq!(reservation_key(7, range(1, 3)), "7_1_3");
        assert_eq!(reservation_key(0, range(0, 0)), "0_0_0");
        assert_eq!(
            reservation_key(u64::MAX, range(5, u64::MAX)),
            format!("{}_5_{}", u64::MAX, u64::MAX)
        );
    }

    #[test]
    fn test_car_prefix_does_not_match_other_cars() {
        let prefix = car_prefix(1);
        assert!(reservation_key(1, range(4, 9)).starts_with(&prefix));
        assert!(!reservation_key(10, range(4, 9)).starts_with(&prefix));
        assert!(!reservation_key(11, range(1, 1)).starts_with(&prefix));
    }

    #[test]
    fn test_prefix_upper_bound() {
        assert_eq!(prefix_upper_bound("7_").as_deref(), Some("7`"));
        assert_eq!(prefix_upper_bound("").as_deref(), None);

        // Car 10 sorts below car 1's range, car 2 above it.
        let upper = prefix_upper_bound("1_").unwrap();
        assert!("1_999_999" < upper.as_str());
        assert!("10_1_1" < "1_");
        assert!("2_1_1" >= upper.as_str());
    }

    #[test]
    fn test_parse_reservation_key() {
        let (car, parsed) = parse_reservation_key("12_3_8").unwrap();
        assert_eq!(car, 12);
        assert_eq!(parsed, range(3, 8));

        assert!(parse_reservation_key("12_8_3").is_none());
        assert!(parse_reservation_key("12_3").is_none());
        assert!(parse_reservation_key("12_3_8_1").is_none());
        assert!(parse_reservation_key("alice").is_none());
    }
}

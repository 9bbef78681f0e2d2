//! Request field validation and coercion.
//!
//! Handlers accept loosely typed JSON (`"true"`, `"3"`, timestamps for dates)
//! and run every field through one of these helpers before it reaches the
//! database. Each helper fails with the offending field name so the error
//! response can point at it.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 30;
pub const PASSWORD_MIN: usize = 6;

const CANONICAL_DATE: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Trimmed, non-empty string without control characters
pub fn required_text(field: &'static str, value: Option<&str>) -> Result<String, FieldError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => printable(field, v),
        _ => Err(FieldError::new(field, format!("{} is required", field))),
    }
}

/// Trimmed string; blank input is treated as absent
pub fn optional_text(field: &'static str, value: Option<&str>) -> Result<Option<String>, FieldError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| printable(field, v))
        .transpose()
}

// Postgres text columns cannot hold NUL
fn printable(field: &'static str, value: &str) -> Result<String, FieldError> {
    if value.chars().any(char::is_control) {
        return Err(FieldError::new(field, format!("{} contains invalid characters", field)));
    }
    Ok(value.to_string())
}

/// Present fields must not be blank; absent fields stay absent
pub fn text_if_present(field: &'static str, value: Option<&str>) -> Result<Option<String>, FieldError> {
    match value {
        None => Ok(None),
        Some(v) => required_text(field, Some(v)).map(Some),
    }
}

pub fn username(value: Option<&str>) -> Result<String, FieldError> {
    let name = required_text("username", value)?;
    let len = name.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(FieldError::new(
            "username",
            format!("Username must be between {} and {} characters", USERNAME_MIN, USERNAME_MAX),
        ));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(FieldError::new(
            "username",
            "Username can only contain letters, numbers and hyphens",
        ));
    }
    Ok(name)
}

/// Passwords are not trimmed; only the length is checked
pub fn password(field: &'static str, value: Option<&str>) -> Result<String, FieldError> {
    match value {
        Some(p) if p.chars().count() >= PASSWORD_MIN => Ok(p.to_string()),
        Some(_) => Err(FieldError::new(
            field,
            format!("Password must be at least {} characters", PASSWORD_MIN),
        )),
        None => Err(FieldError::new(field, "Password is required")),
    }
}

pub fn id(field: &'static str, value: &str) -> Result<Uuid, FieldError> {
    Uuid::parse_str(value.trim()).map_err(|_| FieldError::new(field, format!("Invalid {} format", field)))
}

/// Booleans arrive as JSON booleans, `"true"`/`"false"`, or 0/1
pub fn coerce_bool(field: &'static str, value: &Value) -> Result<bool, FieldError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(FieldError::new(field, format!("{} must be a boolean", field))),
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(FieldError::new(field, format!("{} must be a boolean", field))),
        },
        _ => Err(FieldError::new(field, format!("{} must be a boolean", field))),
    }
}

/// Integer from a JSON number or numeric string. Fractions are rejected,
/// except a zero fraction (`2.0`).
pub fn coerce_integer(field: &'static str, value: &Value) -> Result<i64, FieldError> {
    let not_integer = || FieldError::new(field, format!("{} must be an integer", field));
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 => Ok(f as i64),
                    _ => Err(not_integer()),
                }
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| not_integer()),
        _ => Err(not_integer()),
    }
}

fn coerce_bounded(field: &'static str, value: &Value, min: i64, message: &str) -> Result<i32, FieldError> {
    let n = coerce_integer(field, value)?;
    if n < min {
        return Err(FieldError::new(field, message.to_string()));
    }
    i32::try_from(n).map_err(|_| FieldError::new(field, format!("{} is too large", field)))
}

/// Passenger count: integer ≥ 1
pub fn passenger_count(value: &Value) -> Result<i32, FieldError> {
    coerce_bounded(
        "passengerCount",
        value,
        1,
        "passengerCount must be a positive integer",
    )
}

pub fn current_pob(value: &Value) -> Result<i32, FieldError> {
    coerce_bounded("currentPOB", value, 0, "currentPOB cannot be negative")
}

pub fn maximum_pob(value: &Value) -> Result<i32, FieldError> {
    coerce_bounded("maximumPOB", value, 1, "maximumPOB must be greater than 0")
}

/// Normalize any accepted date representation to `YYYY-MM-DD`.
///
/// Accepts a plain date, an RFC 3339 timestamp (converted to UTC first),
/// a naive `YYYY-MM-DD HH:MM:SS[.fff]` / `YYYY-MM-DDTHH:MM:SS[.fff]`
/// timestamp, or epoch milliseconds.
pub fn trip_date(value: &Value) -> Result<String, FieldError> {
    let invalid = || FieldError::new("tripDate", "tripDate must be a valid date");
    let date = match value {
        Value::String(s) => parse_date_text(s.trim()).ok_or_else(invalid)?,
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).ok_or_else(invalid)?;
            DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(invalid)?.date_naive()
        }
        _ => return Err(FieldError::new("tripDate", "tripDate is required")),
    };
    // Years past 9999 would not format as YYYY-MM-DD
    if !(0..=9999).contains(&date.year()) {
        return Err(invalid());
    }
    Ok(date.format(CANONICAL_DATE).to_string())
}

/// Same normalization for path and query parameters
pub fn trip_date_str(value: &str) -> Result<String, FieldError> {
    trip_date(&Value::String(value.to_string()))
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, CANONICAL_DATE) {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|ts| ts.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trip_dates_normalize_to_the_same_day() {
        let expected = "2024-01-05";
        assert_eq!(trip_date(&json!("2024-01-05")).unwrap(), expected);
        assert_eq!(trip_date(&json!("2024-01-05T10:30:00.000Z")).unwrap(), expected);
        assert_eq!(trip_date(&json!("2024-01-05T23:59:59+00:00")).unwrap(), expected);
        assert_eq!(trip_date(&json!("2024-01-05 08:00:00")).unwrap(), expected);
        // 2024-01-05T12:00:00Z as epoch milliseconds
        assert_eq!(trip_date(&json!(1_704_456_000_000_i64)).unwrap(), expected);
    }

    #[test]
    fn offsets_are_applied_before_taking_the_date() {
        assert_eq!(trip_date(&json!("2024-01-05T23:30:00-02:00")).unwrap(), "2024-01-06");
    }

    #[test]
    fn unparsable_dates_are_field_errors() {
        for bad in [json!("05/01/2024"), json!("2024-13-01"), json!(""), json!(true), json!(null)] {
            let err = trip_date(&bad).unwrap_err();
            assert_eq!(err.field, "tripDate");
        }
    }

    #[test]
    fn dates_beyond_four_digit_years_are_rejected() {
        // 10000-01-01T00:00:00Z
        let err = trip_date(&json!(253_402_300_800_000_i64)).unwrap_err();
        assert_eq!(err.field, "tripDate");
        // 9999-12-31T00:00:00Z
        assert_eq!(trip_date(&json!(253_402_214_400_000_i64)).unwrap(), "9999-12-31");
        assert!(trip_date(&json!(-62_198_755_200_000_i64)).is_err());
    }

    #[test]
    fn usernames_follow_the_pattern() {
        assert_eq!(username(Some("  crew-01 ")).unwrap(), "crew-01");
        assert!(username(Some("ab")).is_err());
        assert!(username(Some(&"a".repeat(31))).is_err());
        assert!(username(Some("has space")).is_err());
        assert!(username(Some("under_score")).is_err());
        assert!(username(None).is_err());
    }

    #[test]
    fn required_text_trims() {
        assert_eq!(required_text("origin", Some("  Heliport ")).unwrap(), "Heliport");
        assert!(required_text("origin", Some("   ")).is_err());
        assert_eq!(optional_text("location", Some("  ")).unwrap(), None);
        assert_eq!(optional_text("location", Some(" Heliport ")).unwrap().as_deref(), Some("Heliport"));
        assert_eq!(text_if_present("origin", None).unwrap(), None);
        assert!(text_if_present("origin", Some("")).is_err());
    }

    #[test]
    fn control_characters_are_rejected() {
        let err = required_text("origin", Some("Heli\u{0}port")).unwrap_err();
        assert_eq!(err.field, "origin");
        assert!(text_if_present("origin", Some("Heli\nport")).is_err());
        assert!(optional_text("jobRole", Some("Medic\u{0}")).is_err());
    }

    #[test]
    fn field_errors_display_field_and_message() {
        let err = FieldError::new("tripDate", "tripDate must be a valid date");
        assert_eq!(err.to_string(), "tripDate: tripDate must be a valid date");
    }

    #[test]
    fn booleans_are_coerced() {
        assert!(coerce_bool("confirmed", &json!(true)).unwrap());
        assert!(coerce_bool("confirmed", &json!("true")).unwrap());
        assert!(!coerce_bool("confirmed", &json!("0")).unwrap());
        assert!(coerce_bool("confirmed", &json!(1)).unwrap());
        assert!(coerce_bool("confirmed", &json!("maybe")).is_err());
    }

    #[test]
    fn passenger_counts_must_be_positive_integers() {
        assert_eq!(passenger_count(&json!(3)).unwrap(), 3);
        assert_eq!(passenger_count(&json!("4")).unwrap(), 4);
        assert_eq!(passenger_count(&json!(2.0)).unwrap(), 2);
        assert!(passenger_count(&json!(0)).is_err());
        assert!(passenger_count(&json!(-1)).is_err());
        assert!(passenger_count(&json!(2.5)).is_err());
        assert!(passenger_count(&json!("two")).is_err());
        assert!(passenger_count(&json!(i64::MAX)).is_err());
    }

    #[test]
    fn pob_bounds() {
        assert_eq!(current_pob(&json!(0)).unwrap(), 0);
        assert!(current_pob(&json!(-1)).is_err());
        assert!(maximum_pob(&json!(0)).is_err());
        assert_eq!(maximum_pob(&json!("120")).unwrap(), 120);
    }

    #[test]
    fn ids_must_be_uuids() {
        assert!(id("id", "6f1c1c1e-8d2b-4c67-9a7e-2f0f3c9b1a11").is_ok());
        assert_eq!(id("id", "42").unwrap_err().message, "Invalid id format");
    }

    #[test]
    fn passwords_need_minimum_length() {
        assert!(password("password", Some("12345")).is_err());
        assert!(password("password", Some("123456")).is_ok());
        assert!(password("password", None).is_err());
    }
}

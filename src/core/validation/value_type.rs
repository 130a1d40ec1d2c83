//! Value type validation
//!
//! Checks a raw string value against the declared [`ValueType`] of its data
//! element or attribute.

use crate::domain::ids::Uid;
use crate::domain::metadata::ValueType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

/// Longest accepted TEXT value
pub const MAX_TEXT_LENGTH: usize = 50_000;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
            .expect("email pattern is valid")
    })
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\+?[0-9 ()\-]{3,50}$").expect("phone pattern is valid")
    })
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(https?|ftp)://[^\s/$.?#][^\s]*$")
            .expect("url pattern is valid")
    })
}

fn parse_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn parse_datetime(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").is_ok()
        || parse_date(value)
}

fn parse_time(value: &str) -> bool {
    NaiveTime::parse_from_str(value, "%H:%M").is_ok()
        || NaiveTime::parse_from_str(value, "%H:%M:%S").is_ok()
}

fn parse_coordinate(value: &str) -> bool {
    let Ok(serde_json::Value::Array(parts)) = serde_json::from_str::<serde_json::Value>(value) else {
        return false;
    };
    match parts.as_slice() {
        [lng, lat] => match (lng.as_f64(), lat.as_f64()) {
            (Some(lng), Some(lat)) => (-180.0..=180.0).contains(&lng) && (-90.0..=90.0).contains(&lat),
            _ => false,
        },
        _ => false,
    }
}

/// Validates a value against its value type
///
/// # Returns
///
/// `Ok(())` when valid, otherwise a short reason such as `value_not_integer`.
pub fn validate_value(value_type: ValueType, value: &str) -> Result<(), &'static str> {
    let valid = match value_type {
        ValueType::Text => {
            return if value.chars().count() > MAX_TEXT_LENGTH {
                Err("value_length_greater_than_max_length")
            } else {
                Ok(())
            };
        }
        ValueType::LongText => true,
        ValueType::Letter => value.chars().count() == 1 && value.chars().all(char::is_alphabetic),
        ValueType::PhoneNumber => phone_regex().is_match(value),
        ValueType::Email => email_regex().is_match(value),
        ValueType::Boolean => matches!(value.to_lowercase().as_str(), "true" | "false" | "1" | "0"),
        ValueType::TrueOnly => matches!(value.to_lowercase().as_str(), "true" | "1"),
        ValueType::Date | ValueType::Age => parse_date(value) || parse_datetime(value),
        ValueType::Datetime => parse_datetime(value),
        ValueType::Time => parse_time(value),
        ValueType::Number => value.parse::<f64>().map(f64::is_finite).unwrap_or(false),
        ValueType::UnitInterval => value
            .parse::<f64>()
            .map(|v| (0.0..=1.0).contains(&v))
            .unwrap_or(false),
        ValueType::Percentage => value
            .parse::<f64>()
            .map(|v| (0.0..=100.0).contains(&v))
            .unwrap_or(false),
        ValueType::Integer => value.parse::<i64>().is_ok(),
        ValueType::IntegerPositive => value.parse::<i64>().map(|v| v > 0).unwrap_or(false),
        ValueType::IntegerNegative => value.parse::<i64>().map(|v| v < 0).unwrap_or(false),
        ValueType::IntegerZeroOrPositive => value.parse::<i64>().map(|v| v >= 0).unwrap_or(false),
        ValueType::Url => url_regex().is_match(value),
        ValueType::FileResource | ValueType::Image | ValueType::OrganisationUnit => {
            Uid::new(value).is_ok()
        }
        ValueType::Coordinate => parse_coordinate(value),
        ValueType::Username => !value.trim().is_empty(),
    };

    if valid {
        Ok(())
    } else {
        Err(reason(value_type))
    }
}

/// Whether the value is valid for its value type
pub fn value_is_valid(value_type: ValueType, value: &str) -> bool {
    validate_value(value_type, value).is_ok()
}

fn reason(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::Text | ValueType::LongText => "value_length_greater_than_max_length",
        ValueType::Letter => "value_not_letter",
        ValueType::PhoneNumber => "value_not_valid_phone_number",
        ValueType::Email => "value_not_valid_email",
        ValueType::Boolean => "value_not_bool",
        ValueType::TrueOnly => "value_not_true_only",
        ValueType::Date | ValueType::Age => "value_not_valid_date",
        ValueType::Datetime => "value_not_valid_datetime",
        ValueType::Time => "value_not_valid_time",
        ValueType::Number => "value_not_numeric",
        ValueType::UnitInterval => "value_not_unit_interval",
        ValueType::Percentage => "value_not_percentage",
        ValueType::Integer => "value_not_integer",
        ValueType::IntegerPositive => "value_not_positive_integer",
        ValueType::IntegerNegative => "value_not_negative_integer",
        ValueType::IntegerZeroOrPositive => "value_not_zero_or_positive_integer",
        ValueType::Url => "value_not_url",
        ValueType::FileResource | ValueType::Image => "value_not_valid_file_resource_uid",
        ValueType::OrganisationUnit => "value_not_valid_organisation_unit",
        ValueType::Coordinate => "value_not_coordinate",
        ValueType::Username => "value_not_valid_username",
    }
}

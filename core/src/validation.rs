use chrono::NaiveDate;

use crate::error::ValidationError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> Result<NaiveDate, ValidationError> {
    let text = text.trim();
    let invalid = || ValidationError::InvalidFormat {
        field: "date".to_string(),
        value: text.to_string(),
    };
    // chrono accepts unpadded months/days; require the exact 10-char shape.
    let shape_ok = text.len() == 10
        && text.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| invalid())
}

pub fn parse_non_negative_float(text: &str, field: &str) -> Result<f64, ValidationError> {
    let text = text.trim();
    let value: f64 = text
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| ValidationError::InvalidNumber {
            field: field.to_string(),
            value: text.to_string(),
            expected: "number",
        })?;
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    // -0.0 passes the check above; store it as plain zero.
    Ok(value + 0.0)
}

pub fn parse_non_negative_int(text: &str, field: &str) -> Result<u32, ValidationError> {
    let text = text.trim();
    let invalid = || ValidationError::InvalidNumber {
        field: field.to_string(),
        value: text.to_string(),
        expected: "whole number",
    };
    let negative = || ValidationError::Negative {
        field: field.to_string(),
    };
    let value: i64 = text.parse().map_err(|_| {
        // Too large for i64 but still a negative whole number.
        match text.strip_prefix('-') {
            Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                negative()
            }
            _ => invalid(),
        }
    })?;
    if value < 0 {
        return Err(negative());
    }
    u32::try_from(value).map_err(|_| invalid())
}

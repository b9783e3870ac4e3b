use chrono::NaiveDate;

use super::FieldError;

/// Parse a selling date in either of the feed's two shapes: a full
/// `YYYY-MM-DD` (10 chars) or a `YYYY-MM` month (7 chars, day = 1st).
/// The length dispatch is a deliberate lightweight format sniff; both
/// shapes occur in the feed without any per-file format marker.
pub fn parse_selling_date(value: &str) -> Result<NaiveDate, FieldError> {
    let invalid = || FieldError::InvalidDateFormat {
        value: value.to_string(),
    };

    match value.chars().count() {
        10 => NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid()),
        7 => NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

pub mod dates;
pub mod fields;
pub mod loader;

use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use thiserror::Error;

use fields::{extract_declared, labels};

/// One source line, field label -> raw value, as zipped against the header.
pub type RawRow = HashMap<String, String>;

/// A validated transaction. Construction is all-or-nothing; a `Record`
/// never exposes partially parsed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub link: String,
    pub floor_plan: String,
    /// Total price, in ten-thousands of the feed currency.
    pub price: i64,
    pub selling_date: NaiveDate,
    /// Days on market; `None` when the source column is blank.
    pub listing_duration_days: Option<i64>,
    pub unit_price: f64,
    pub area: f64,
    pub window_direction: String,
    pub furnish: String,
    pub floor: String,
    /// Blank-tolerant by design: empty string when the source is blank.
    pub building_type: String,
}

impl Record {
    pub fn from_raw(raw: &RawRow) -> std::result::Result<Self, FieldError> {
        let link = require(raw, labels::LINK)?;
        let floor_plan = require(raw, labels::FLOOR_PLAN)?;
        let price = parse_int(labels::PRICE, &require(raw, labels::PRICE)?)?;
        let selling_date = dates::parse_selling_date(&require(raw, labels::SELLING_DATE)?)?;
        let listing_duration_days = extract_declared(raw, labels::LISTING_DURATION)?
            .map(|v| parse_int(labels::LISTING_DURATION, v))
            .transpose()?;
        let unit_price = parse_float(labels::UNIT_PRICE, &require(raw, labels::UNIT_PRICE)?)?;
        let area = parse_float(labels::AREA, &require(raw, labels::AREA)?)?;
        let window_direction = require(raw, labels::WINDOW_DIRECTION)?;
        let furnish = require(raw, labels::FURNISH)?;
        let floor = require(raw, labels::FLOOR)?;
        let building_type = extract_declared(raw, labels::BUILDING_TYPE)?
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            link,
            floor_plan,
            price,
            selling_date,
            listing_duration_days,
            unit_price,
            area,
            window_direction,
            furnish,
            floor,
            building_type,
        })
    }

    /// First of the month of `selling_date`; the monthly grouping key.
    pub fn selling_month(&self) -> NaiveDate {
        // Day 1 of an already-valid year/month cannot fail.
        NaiveDate::from_ymd_opt(self.selling_date.year(), self.selling_date.month(), 1).unwrap()
    }

    /// Zero unit price marks a known bad-data pattern in the feed; such
    /// records are excluded from aggregation with a logged warning.
    pub fn is_valid(&self) -> bool {
        self.unit_price != 0.0
    }
}

fn require(raw: &RawRow, field: &str) -> std::result::Result<String, FieldError> {
    // A required field that passes extraction always yields a value.
    Ok(extract_declared(raw, field)?
        .unwrap_or_default()
        .to_string())
}

fn parse_int(field: &str, value: &str) -> std::result::Result<i64, FieldError> {
    value.parse().map_err(|_| FieldError::NumericParse {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_float(field: &str, value: &str) -> std::result::Result<f64, FieldError> {
    value.parse().map_err(|_| FieldError::NumericParse {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Row-level validation causes; wrapped with file/row context by the loader.
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("missing field '{field}'")]
    Missing { field: String },
    #[error("field '{field}' is empty")]
    Empty { field: String },
    #[error("invalid date format: '{value}' (expected YYYY-MM-DD or YYYY-MM)")]
    InvalidDateFormat { value: String },
    #[error("field '{field}' is not a number: '{value}'")]
    NumericParse { field: String, value: String },
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("{file}, row {row}: {source}")]
    RecordValidation {
        file: String,
        row: usize,
        source: FieldError,
    },
    #[error("{file}, row {row}: {detail}")]
    SchemaMismatch {
        file: String,
        row: usize,
        detail: String,
    },
    #[error("file name '{name}' does not match <community>_<rest>.<ext>")]
    FileNaming { name: String },
    #[error("no valid records in any input file")]
    NoValidRecords,
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
pub(crate) fn sample_raw() -> RawRow {
    [
        (labels::LINK, "https://example.com/tx/101"),
        (labels::FLOOR_PLAN, "2室1厅"),
        (labels::PRICE, "320"),
        (labels::SELLING_DATE, "2023-05-17"),
        (labels::LISTING_DURATION, "45"),
        (labels::UNIT_PRICE, "5.2"),
        (labels::AREA, "61.5"),
        (labels::WINDOW_DIRECTION, "南"),
        (labels::FURNISH, "精装"),
        (labels::FLOOR, "中楼层(共18层)"),
        (labels::BUILDING_TYPE, "板楼"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips_extracted_fields() {
        let record = Record::from_raw(&sample_raw()).unwrap();
        assert_eq!(record.link, "https://example.com/tx/101");
        assert_eq!(record.floor_plan, "2室1厅");
        assert_eq!(record.price, 320);
        assert_eq!(
            record.selling_date,
            NaiveDate::from_ymd_opt(2023, 5, 17).unwrap()
        );
        assert_eq!(record.listing_duration_days, Some(45));
        assert_eq!(record.unit_price, 5.2);
        assert_eq!(record.area, 61.5);
        assert_eq!(record.window_direction, "南");
        assert_eq!(record.furnish, "精装");
        assert_eq!(record.floor, "中楼层(共18层)");
        assert_eq!(record.building_type, "板楼");
    }

    #[test]
    fn missing_required_field_fails() {
        let mut raw = sample_raw();
        raw.remove(labels::UNIT_PRICE);
        let err = Record::from_raw(&raw).unwrap_err();
        assert_eq!(
            err,
            FieldError::Missing {
                field: labels::UNIT_PRICE.to_string()
            }
        );
    }

    #[test]
    fn empty_required_field_fails() {
        let mut raw = sample_raw();
        raw.insert(labels::FLOOR_PLAN.to_string(), String::new());
        let err = Record::from_raw(&raw).unwrap_err();
        assert_eq!(
            err,
            FieldError::Empty {
                field: labels::FLOOR_PLAN.to_string()
            }
        );
    }

    #[test]
    fn blank_listing_duration_is_none() {
        let mut raw = sample_raw();
        raw.insert(labels::LISTING_DURATION.to_string(), String::new());
        let record = Record::from_raw(&raw).unwrap();
        assert_eq!(record.listing_duration_days, None);
    }

    #[test]
    fn blank_building_type_defaults_to_empty_string() {
        let mut raw = sample_raw();
        raw.insert(labels::BUILDING_TYPE.to_string(), String::new());
        let record = Record::from_raw(&raw).unwrap();
        assert_eq!(record.building_type, "");
    }

    #[test]
    fn non_numeric_price_fails() {
        let mut raw = sample_raw();
        raw.insert(labels::PRICE.to_string(), "320万".to_string());
        let err = Record::from_raw(&raw).unwrap_err();
        assert!(matches!(err, FieldError::NumericParse { .. }));
    }

    #[test]
    fn selling_month_is_first_of_month() {
        let record = Record::from_raw(&sample_raw()).unwrap();
        assert_eq!(
            record.selling_month(),
            NaiveDate::from_ymd_opt(2023, 5, 1).unwrap()
        );
    }

    #[test]
    fn zero_unit_price_is_invalid() {
        let mut raw = sample_raw();
        raw.insert(labels::UNIT_PRICE.to_string(), "0".to_string());
        let record = Record::from_raw(&raw).unwrap();
        assert!(!record.is_valid());
    }
}

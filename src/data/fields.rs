use tracing::warn;

use super::{FieldError, RawRow};

/// Field labels as they appear in the source feed's header.
pub mod labels {
    pub const LINK: &str = "链接";
    pub const FLOOR_PLAN: &str = "户型";
    pub const PRICE: &str = "价格";
    pub const SELLING_DATE: &str = "成交日期";
    pub const LISTING_DURATION: &str = "挂牌时长";
    pub const UNIT_PRICE: &str = "单价";
    pub const AREA: &str = "面积";
    pub const WINDOW_DIRECTION: &str = "朝向";
    pub const FURNISH: &str = "装修";
    pub const FLOOR: &str = "楼层";
    pub const BUILDING_TYPE: &str = "建筑类型";
}

/// Per-field empty policy. This table is the single source of truth for
/// the declared header set; the loader verifies headers against it and
/// record construction reads values through it.
pub struct FieldSpec {
    pub label: &'static str,
    pub allow_empty: bool,
    /// Substitute for a blank value where `allow_empty` holds.
    pub empty_value: Option<&'static str>,
}

const fn required(label: &'static str) -> FieldSpec {
    FieldSpec {
        label,
        allow_empty: false,
        empty_value: None,
    }
}

const fn blank_tolerant(label: &'static str, empty_value: Option<&'static str>) -> FieldSpec {
    FieldSpec {
        label,
        allow_empty: true,
        empty_value,
    }
}

pub const FIELDS: &[FieldSpec] = &[
    required(labels::LINK),
    required(labels::FLOOR_PLAN),
    required(labels::PRICE),
    required(labels::SELLING_DATE),
    blank_tolerant(labels::LISTING_DURATION, None),
    required(labels::UNIT_PRICE),
    required(labels::AREA),
    required(labels::WINDOW_DIRECTION),
    required(labels::FURNISH),
    required(labels::FLOOR),
    blank_tolerant(labels::BUILDING_TYPE, Some("")),
];

pub fn spec(label: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|spec| spec.label == label)
}

pub fn is_declared(label: &str) -> bool {
    spec(label).is_some()
}

/// Extract a field under the policy declared in [`FIELDS`]. An undeclared
/// label is treated as missing; declared callers use [`labels`] constants.
pub fn extract_declared<'a>(row: &'a RawRow, label: &str) -> Result<Option<&'a str>, FieldError> {
    let spec = spec(label).ok_or_else(|| FieldError::Missing {
        field: label.to_string(),
    })?;
    extract(row, label, spec.allow_empty, spec.empty_value)
}

/// Pull one field out of a raw row.
///
/// With `allow_empty` false an empty value is an error; with it true an
/// empty value yields `empty_value` (absent by default). Supplying an
/// `empty_value` without `allow_empty` is a caller inconsistency: it is
/// logged and ignored, never treated as a data error.
pub fn extract<'a>(
    row: &'a RawRow,
    field: &str,
    allow_empty: bool,
    empty_value: Option<&'a str>,
) -> Result<Option<&'a str>, FieldError> {
    let value = row.get(field).ok_or_else(|| FieldError::Missing {
        field: field.to_string(),
    })?;

    if !allow_empty {
        if empty_value.is_some() {
            warn!(field, "empty_value supplied for a field that rejects empty values; ignored");
        }
        if value.is_empty() {
            return Err(FieldError::Empty {
                field: field.to_string(),
            });
        }
        return Ok(Some(value));
    }

    if value.is_empty() {
        Ok(empty_value)
    } else {
        Ok(Some(value))
    }
}

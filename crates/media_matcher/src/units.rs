//! Value conversions for numeric media features.
//!
//! Unit factors are the ones the `css-mediaquery` package applies, including
//! its print-unit constants for `pt` and `pc` and its `dpcm` divisor.

use shared::error::QueryError;

use crate::parser::MediaValue;

const PX_PER_EM: f64 = 16.0;
const PX_PER_IN: f64 = 96.0;
const CM_PER_IN: f64 = 2.54;
const PX_PER_PT: f64 = 72.0;
const PT_PER_PC: f64 = 12.0;

/// Converts a length to px. Units are case-sensitive; an unknown unit keeps
/// the bare number.
pub(crate) fn to_px(value: &MediaValue) -> Option<f64> {
    let (value, unit) = match value {
        MediaValue::Number(value) => (*value, ""),
        MediaValue::Dimension { value, unit } => (*value, unit.as_str()),
        _ => return None,
    };
    let px = match unit {
        "em" | "rem" => value * PX_PER_EM,
        "cm" => value * PX_PER_IN / CM_PER_IN,
        "mm" => value * PX_PER_IN / CM_PER_IN / 10.0,
        "in" => value * PX_PER_IN,
        "pt" => value * PX_PER_PT,
        "pc" => value * PX_PER_PT / PT_PER_PC,
        _ => value,
    };
    Some(px)
}

/// Converts a resolution to dots per inch.
pub(crate) fn to_dpi(value: &MediaValue) -> Option<f64> {
    let (value, unit) = match value {
        MediaValue::Number(value) => (*value, ""),
        MediaValue::Dimension { value, unit } => (*value, unit.as_str()),
        _ => return None,
    };
    let dpi = match unit {
        "dpcm" => value / CM_PER_IN,
        "dppx" => value * PX_PER_IN,
        _ => value,
    };
    Some(dpi)
}

/// A non-zero decimal or an `a/b` ratio of integers.
pub(crate) fn to_decimal(feature: &str, value: &MediaValue) -> Result<f64, QueryError> {
    match value {
        MediaValue::Number(decimal) if *decimal != 0.0 && decimal.is_finite() => Ok(*decimal),
        MediaValue::Ratio {
            numerator,
            denominator,
        } => Ok(numerator / denominator),
        other => Err(QueryError::InvalidValue {
            feature: feature.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Integer feature value; anything unreadable or zero counts as 1.
pub(crate) fn to_integer(value: &MediaValue) -> i64 {
    let number = match value {
        MediaValue::Number(value) | MediaValue::Dimension { value, .. } => value.trunc(),
        MediaValue::Ratio { numerator, .. } => *numerator,
        MediaValue::Ident(_) | MediaValue::Other(_) => 0.0,
    };
    match number as i64 {
        0 => 1,
        integer => integer,
    }
}

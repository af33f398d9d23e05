//! CSS media query matching against a flat [`MediaContext`].
//!
//! Semantics follow the `css-mediaquery` package used by React Native
//! `matchMedia` shims: a query list matches when any of its queries matches,
//! `not` inverts a whole query, and a feature absent from the context fails
//! every expression that tests it.

use shared::{
    domain::{MediaContext, Orientation},
    error::QueryError,
};

mod parser;
mod units;

pub use parser::{parse_query_list, MediaExpression, MediaQuery, MediaValue, RangeModifier};

/// Evaluates a media query string against a context.
pub trait MediaMatcher: Send + Sync {
    fn matches(&self, query: &str, context: &MediaContext) -> Result<bool, QueryError>;
}

/// Default matcher backed by [`match_query`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CssMediaMatcher;

impl MediaMatcher for CssMediaMatcher {
    fn matches(&self, query: &str, context: &MediaContext) -> Result<bool, QueryError> {
        match_query(query, context)
    }
}

pub fn match_query(query: &str, context: &MediaContext) -> Result<bool, QueryError> {
    for parsed in parse_query_list(query)? {
        if parsed.evaluate(context)? {
            return Ok(true);
        }
    }
    Ok(false)
}

impl MediaQuery {
    pub fn evaluate(&self, context: &MediaContext) -> Result<bool, QueryError> {
        let type_match =
            self.media_type == "all" || context.media_type.eq_ignore_ascii_case(&self.media_type);
        if (type_match && self.inverse) || !(type_match || self.inverse) {
            return Ok(false);
        }

        let mut expressions_match = true;
        for expression in &self.expressions {
            if !expression.evaluate(context)? {
                expressions_match = false;
                break;
            }
        }

        Ok(expressions_match != self.inverse)
    }
}

enum FeatureValue<'a> {
    Text(&'a str),
    Number(f64),
    Integer(i64),
}

impl MediaExpression {
    pub fn evaluate(&self, context: &MediaContext) -> Result<bool, QueryError> {
        let Some(actual) = feature_value(&self.feature, context) else {
            return Ok(false);
        };

        let (actual, expected) = match actual {
            FeatureValue::Text(actual) => {
                let expected = self
                    .value
                    .as_ref()
                    .ok_or_else(|| QueryError::MissingValue(self.feature.clone()))?;
                return Ok(expected
                    .as_text()
                    .is_some_and(|expected| actual.eq_ignore_ascii_case(expected)));
            }
            FeatureValue::Integer(actual) => {
                let expected = self.value.as_ref().map_or(1, units::to_integer);
                (actual as f64, expected as f64)
            }
            FeatureValue::Number(actual) => {
                let expected = match (self.feature.as_str(), self.value.as_ref()) {
                    (_, None) => None,
                    ("width" | "height" | "device-width" | "device-height", Some(value)) => {
                        units::to_px(value)
                    }
                    ("resolution", Some(value)) => units::to_dpi(value),
                    (_, Some(value)) => Some(units::to_decimal(&self.feature, value)?),
                };
                // An unreadable expected value never compares equal.
                let Some(expected) = expected else {
                    return Ok(false);
                };
                (actual, expected)
            }
        };

        Ok(match self.modifier {
            Some(RangeModifier::Min) => actual >= expected,
            Some(RangeModifier::Max) => actual <= expected,
            None => actual == expected,
        })
    }
}

/// Looks up a feature in the context. Absent and zero values read as `None`.
fn feature_value<'a>(feature: &str, context: &'a MediaContext) -> Option<FeatureValue<'a>> {
    let number = |v: Option<f64>| v.filter(|n| *n != 0.0 && !n.is_nan()).map(FeatureValue::Number);
    let integer = |v: Option<i64>| v.filter(|n| *n != 0).map(FeatureValue::Integer);

    match feature {
        "orientation" => context
            .orientation
            .map(|o: Orientation| FeatureValue::Text(o.as_media_value())),
        "scan" => context
            .scan
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(FeatureValue::Text),
        "width" => number(context.width),
        "height" => number(context.height),
        "device-width" => number(context.device_width),
        "device-height" => number(context.device_height),
        "aspect-ratio" => number(context.aspect_ratio),
        "device-aspect-ratio" => number(context.device_aspect_ratio),
        "device-pixel-ratio" => number(context.device_pixel_ratio),
        "resolution" => number(context.resolution),
        "color" => integer(context.color),
        "color-index" => integer(context.color_index),
        "monochrome" => integer(context.monochrome),
        "grid" => integer(context.grid),
        other => {
            tracing::trace!(feature = other, "unknown media feature never matches");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

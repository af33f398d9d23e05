use thiserror::Error;

/// Failure to parse or evaluate a media query string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid media query expression: \"{0}\"")]
    InvalidExpression(String),
    #[error("media feature \"{0}\" requires a value")]
    MissingValue(String),
    #[error("invalid value \"{value}\" for media feature \"{feature}\"")]
    InvalidValue { feature: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown orientation \"{0}\"; expected portrait or landscape")]
pub struct ParseOrientationError(pub String);

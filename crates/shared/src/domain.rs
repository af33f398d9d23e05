use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseOrientationError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(WatcherId);
id_newtype!(UpdateSeq);

/// Physical rotation state reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Lower-case value as the media-query `orientation` feature expects it.
    pub fn as_media_value(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => f.write_str("PORTRAIT"),
            Orientation::Landscape => f.write_str("LANDSCAPE"),
        }
    }
}

impl FromStr for Orientation {
    type Err = ParseOrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("portrait") {
            Ok(Orientation::Portrait)
        } else if trimmed.eq_ignore_ascii_case("landscape") {
            Ok(Orientation::Landscape)
        } else {
            Err(ParseOrientationError(trimmed.to_string()))
        }
    }
}

/// Size of the visible drawing surface in device-independent units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: f64,
    pub height: f64,
}

impl WindowSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Flat set of media features a query is evaluated against.
///
/// Features left as `None` are treated as absent: any expression that tests
/// them fails.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MediaContext {
    #[serde(rename = "type")]
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_aspect_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_pixel_ratio: Option<f64>,
    /// Resolution in dots per inch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monochrome: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan: Option<String>,
}

impl MediaContext {
    /// Context of a screen with the given orientation and viewport. The
    /// device dimensions mirror the viewport.
    pub fn screen(orientation: Orientation, size: WindowSize) -> Self {
        Self {
            media_type: "screen".to_string(),
            orientation: Some(orientation),
            width: Some(size.width),
            height: Some(size.height),
            device_width: Some(size.width),
            device_height: Some(size.height),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_parses_case_insensitively() {
        assert_eq!("LANDSCAPE".parse::<Orientation>().expect("parse"), Orientation::Landscape);
        assert_eq!(" portrait ".parse::<Orientation>().expect("parse"), Orientation::Portrait);
        assert!("upside-down".parse::<Orientation>().is_err());
    }

    #[test]
    fn orientation_serializes_like_the_device_api() {
        let raw = serde_json::to_string(&Orientation::Landscape).expect("serialize");
        assert_eq!(raw, "\"LANDSCAPE\"");
        assert_eq!(Orientation::Landscape.as_media_value(), "landscape");
    }

    #[test]
    fn screen_context_mirrors_viewport_into_device_features() {
        let ctx = MediaContext::screen(Orientation::Portrait, WindowSize::new(400.0, 800.0));
        assert_eq!(ctx.media_type, "screen");
        assert_eq!(ctx.device_width, Some(400.0));
        assert_eq!(ctx.device_height, Some(800.0));
        assert!(ctx.resolution.is_none());
    }
}

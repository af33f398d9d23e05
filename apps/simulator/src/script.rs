use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Context};
use device_integration::{SimulatedOrientationSource, SimulatedViewport};
use shared::domain::Orientation;

/// One scripted device event, written `rotate:<orientation>` or
/// `resize:<width>x<height>` on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceEvent {
    Rotate(Orientation),
    Resize { width: f64, height: f64 },
}

impl DeviceEvent {
    pub fn apply(&self, orientation: &SimulatedOrientationSource, viewport: &SimulatedViewport) {
        match *self {
            DeviceEvent::Rotate(target) => orientation.rotate_to(target),
            DeviceEvent::Resize { width, height } => viewport.resize(width, height),
        }
    }
}

impl FromStr for DeviceEvent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, arg) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("expected <kind>:<value>, got '{s}'"))?;
        match kind.trim().to_ascii_lowercase().as_str() {
            "rotate" => Ok(DeviceEvent::Rotate(arg.trim().parse()?)),
            "resize" => {
                let (width, height) = arg
                    .trim()
                    .split_once(['x', 'X'])
                    .ok_or_else(|| anyhow!("expected <width>x<height>, got '{arg}'"))?;
                let width: f64 = width
                    .parse()
                    .with_context(|| format!("invalid width '{width}'"))?;
                let height: f64 = height
                    .parse()
                    .with_context(|| format!("invalid height '{height}'"))?;
                if width < 0.0 || height < 0.0 {
                    bail!("window size cannot be negative: {width}x{height}");
                }
                Ok(DeviceEvent::Resize { width, height })
            }
            other => bail!("unknown event kind '{other}' (expected rotate or resize)"),
        }
    }
}

impl fmt::Display for DeviceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceEvent::Rotate(orientation) => write!(f, "rotate:{}", orientation.as_media_value()),
            DeviceEvent::Resize { width, height } => write!(f, "resize:{width}x{height}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rotate_events() {
        assert_eq!(
            "rotate:landscape".parse::<DeviceEvent>().unwrap(),
            DeviceEvent::Rotate(Orientation::Landscape)
        );
        assert_eq!(
            "ROTATE:Portrait".parse::<DeviceEvent>().unwrap(),
            DeviceEvent::Rotate(Orientation::Portrait)
        );
    }

    #[test]
    fn parses_resize_events() {
        assert_eq!(
            "resize:800x400".parse::<DeviceEvent>().unwrap(),
            DeviceEvent::Resize {
                width: 800.0,
                height: 400.0
            }
        );
        assert_eq!(
            "resize:1024.5X768".parse::<DeviceEvent>().unwrap(),
            DeviceEvent::Resize {
                width: 1024.5,
                height: 768.0
            }
        );
    }

    #[test]
    fn rejects_malformed_events() {
        for raw in [
            "rotate",
            "rotate:sideways",
            "resize:800",
            "resize:widex400",
            "resize:-1x10",
            "shake:1",
        ] {
            assert!(raw.parse::<DeviceEvent>().is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        let event = DeviceEvent::Resize {
            width: 320.0,
            height: 640.0,
        };
        assert_eq!(event.to_string(), "resize:320x640");
        assert_eq!(event.to_string().parse::<DeviceEvent>().unwrap(), event);
    }

    #[test]
    fn apply_drives_the_simulated_sources() {
        let orientation = SimulatedOrientationSource::new(Orientation::Portrait);
        let viewport = SimulatedViewport::new(400.0, 800.0);

        DeviceEvent::Rotate(Orientation::Landscape).apply(&orientation, &viewport);
        DeviceEvent::Resize {
            width: 800.0,
            height: 400.0,
        }
        .apply(&orientation, &viewport);

        assert_eq!(orientation.orientation(), Orientation::Landscape);
        let size = device_integration::ViewportSource::window_size(viewport.as_ref());
        assert_eq!((size.width, size.height), (800.0, 400.0));
    }
}

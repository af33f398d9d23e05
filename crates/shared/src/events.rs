use serde::{Deserialize, Serialize};

use crate::domain::{Orientation, WindowSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrientationInfo {
    pub orientation: Orientation,
}

/// Payload of an orientation-change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrientationChangeEvent {
    pub orientation_info: OrientationInfo,
}

impl OrientationChangeEvent {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation_info: OrientationInfo { orientation },
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation_info.orientation
    }
}

/// Dimension events a viewport source can dispatch. Only `change` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionsEventKind {
    Change,
}

/// Payload of a dimension-change notification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionsChangeEvent {
    pub window: WindowSize,
}

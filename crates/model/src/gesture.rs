//! Gesture payloads emitted by the recognizers.
//!
//! Every payload type has a `Default` that doubles as its pooled reset
//! state.

use serde::{Deserialize, Serialize};

use crate::geometry::{Direction, Point};

/// Lifecycle marker of a gesture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    #[default]
    Start,
    Move,
    End,
    Cancel,
}

impl GesturePhase {
    /// Whether this phase closes the session.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::End | Self::Cancel)
    }
}

/// Pan payload. Deltas are measured from the gesture origin; velocity is
/// in units per millisecond from the last two samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanValue {
    pub phase: GesturePhase,
    pub delta_x: f64,
    pub delta_y: f64,
    pub velocity_x: f64,
    pub velocity_y: f64,
    pub direction: Direction,
    pub distance: f64,
}

/// Pinch payload. `rotation` is in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinchValue {
    pub phase: GesturePhase,
    pub scale: f64,
    pub rotation: f64,
    pub center: Point,
}

impl Default for PinchValue {
    fn default() -> Self {
        Self {
            phase: GesturePhase::Start,
            scale: 1.0,
            rotation: 0.0,
            center: Point::ORIGIN,
        }
    }
}

/// Tap payload. `count` is the position of this tap in a chained run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TapValue {
    pub phase: GesturePhase,
    pub count: u32,
    pub x: f64,
    pub y: f64,
}

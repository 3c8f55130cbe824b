//! Per-pointer records kept by the tracker while a pointer is down.

use serde::{Deserialize, Serialize};

use pointerflow_common::clock::{elapsed_ms, Timestamp};

use crate::event::{PointerEvent, PointerId, PointerType};
use crate::geometry::Point;

/// Live state of one tracked pointer.
///
/// Instances are pooled: `reset` returns a record to its canonical empty
/// state and `begin` fills it from a start event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerInfo {
    pub id: PointerId,
    pub x: f64,
    pub y: f64,
    pub start_x: f64,
    pub start_y: f64,
    #[serde(rename = "type")]
    pub pointer_type: PointerType,
    pub button: i32,
    pub start_time: Timestamp,
    pub last_time: Timestamp,
}

impl PointerInfo {
    /// Clear every field.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Initialize from a start event.
    pub fn begin(&mut self, event: &PointerEvent) {
        self.id = event.id;
        self.x = event.x;
        self.y = event.y;
        self.start_x = event.x;
        self.start_y = event.y;
        self.pointer_type = event.pointer_type;
        self.button = event.button;
        self.start_time = event.timestamp;
        self.last_time = event.timestamp;
    }

    /// Record a new position.
    pub fn update(&mut self, event: &PointerEvent) {
        self.x = event.x;
        self.y = event.y;
        self.last_time = event.timestamp;
    }

    /// Horizontal displacement since start.
    pub fn delta_x(&self) -> f64 {
        self.x - self.start_x
    }

    /// Vertical displacement since start.
    pub fn delta_y(&self) -> f64 {
        self.y - self.start_y
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn start_position(&self) -> Point {
        Point::new(self.start_x, self.start_y)
    }

    /// Milliseconds since the pointer went down.
    pub fn duration(&self) -> f64 {
        elapsed_ms(self.start_time, self.last_time)
    }
}

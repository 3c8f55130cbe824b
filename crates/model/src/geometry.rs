//! Pure geometry helpers used by the recognizers.

use serde::{Deserialize, Serialize};

use pointerflow_common::config::DirectionMode;

/// A 2D point in caller-supplied coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        distance(self.x, self.y, other.x, other.y)
    }

    /// Angle in degrees of the vector from `self` to `other`.
    pub fn angle_to(&self, other: &Point) -> f64 {
        angle(self.x, self.y, other.x, other.y)
    }

    /// Point halfway between `a` and `b`.
    pub fn midpoint(a: &Point, b: &Point) -> Point {
        Point::lerp(a, b, 0.5)
    }

    /// Linear interpolation between two points.
    pub fn lerp(a: &Point, b: &Point, t: f64) -> Point {
        let t = t.clamp(0.0, 1.0);
        Point {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }
}

/// Dominant direction of a displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    None,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    /// Whether a pan in this direction may start under `mode`.
    pub fn allowed_by(self, mode: DirectionMode) -> bool {
        match mode {
            DirectionMode::All => true,
            DirectionMode::Horizontal => self.is_horizontal(),
            DirectionMode::Vertical => self.is_vertical(),
        }
    }
}

/// Classify a displacement. Ties between axes resolve to vertical.
pub fn direction(dx: f64, dy: f64) -> Direction {
    if dx == 0.0 && dy == 0.0 {
        Direction::None
    } else if dx.abs() > dy.abs() {
        if dx > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

/// Euclidean distance between two points.
pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
}

/// Angle in degrees of the vector `(x1, y1) -> (x2, y2)`, as `atan2` reports it.
pub fn angle(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (y2 - y1).atan2(x2 - x1).to_degrees()
}

/// Wrap an angle difference into `(-180, 180]`.
pub fn normalize_angle(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Mean position of a set of points. `None` for an empty set.
pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Point> {
    let (sum, count) = points
        .into_iter()
        .fold((Point::ORIGIN, 0usize), |(acc, n), p| {
            (Point::new(acc.x + p.x, acc.y + p.y), n + 1)
        });
    if count == 0 {
        return None;
    }
    Some(Point::new(sum.x / count as f64, sum.y / count as f64))
}

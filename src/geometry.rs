use egui::Pos2;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A position on the drawing surface, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamp into `[0, width] x [0, height]`.
    pub fn clamp_to(self, width: f32, height: f32) -> Self {
        Self {
            x: self.x.clamp(0.0, width.max(0.0)),
            y: self.y.clamp(0.0, height.max(0.0)),
        }
    }

    /// True if the point lies inside `[0, width] x [0, height]`.
    pub fn is_within(self, width: f32, height: f32) -> bool {
        (0.0..=width).contains(&self.x) && (0.0..=height).contains(&self.y)
    }

    /// Lenient reader: anything that is not a finite number becomes `0`.
    pub fn from_json(value: &Value) -> Self {
        Self {
            x: finite_or(value.get("x"), 0.0),
            y: finite_or(value.get("y"), 0.0),
        }
    }

    /// Writer matching [`Self::from_json`]: non-finite coordinates are written as `0`.
    pub fn to_json(self) -> Value {
        let finite = |v: f32| if v.is_finite() { v } else { 0.0 };
        json!({"x": finite(self.x), "y": finite(self.y)})
    }
}

impl From<Pos2> for Point {
    fn from(pos: Pos2) -> Self {
        Self::new(pos.x, pos.y)
    }
}

impl From<Point> for Pos2 {
    fn from(point: Point) -> Self {
        Pos2::new(point.x, point.y)
    }
}

/// Read a finite number out of an optional JSON value, falling back to `default`.
pub(crate) fn finite_or(value: Option<&Value>, default: f32) -> f32 {
    value
        .and_then(Value::as_f64)
        .map(|v| v as f32)
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

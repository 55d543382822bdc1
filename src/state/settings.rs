use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::replay::SpeedControl;
use crate::stroke::{DEFAULT_COLOUR, DEFAULT_WIDTH, PenStyle, PenTool};

/// Pen and playback settings persisted alongside the stroke history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct BoardSettings {
    /// Pen colour spec, `#000000` by default
    pub pen_colour: String,
    /// Pen thickness in pixels, `6` by default
    pub pen_width: f32,
    /// Eraser thickness in pixels
    pub eraser_width: f32,
    /// Active tool
    pub tool: PenTool,
    /// Cycle the hue on every segment instead of using `pen_colour`
    pub rainbow: bool,
    /// Rewrite playback speed multiplier, `[0.1, 10]`
    pub rewrite_speed: f32,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            pen_colour: DEFAULT_COLOUR.to_owned(),
            pen_width: DEFAULT_WIDTH,
            eraser_width: 20.0,
            tool: PenTool::Pen,
            rainbow: false,
            rewrite_speed: 1.0,
        }
    }
}

impl BoardSettings {
    /// The style a new stroke starts with.
    pub fn active_style(&self) -> PenStyle {
        match self.tool {
            PenTool::Pen => PenStyle::pen(self.pen_colour.clone(), self.pen_width),
            PenTool::Eraser => PenStyle::eraser(self.eraser_width),
        }
    }

    /// Read persisted settings; fields of the wrong type reset everything to defaults.
    pub fn from_json(value: &Value) -> Self {
        match serde_json::from_value::<Self>(value.clone()) {
            Ok(settings) => settings.sanitized(),
            Err(err) => {
                log::warn!("Discarding malformed settings: {}", err);
                Self::default()
            }
        }
    }

    /// Replace out-of-range values with their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.pen_colour.trim().is_empty() {
            self.pen_colour = defaults.pen_colour;
        }
        if !(self.pen_width.is_finite() && self.pen_width > 0.0) {
            self.pen_width = defaults.pen_width;
        }
        if !(self.eraser_width.is_finite() && self.eraser_width > 0.0) {
            self.eraser_width = defaults.eraser_width;
        }
        self.rewrite_speed = SpeedControl::clamp(self.rewrite_speed);
        self
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::geometry::{Point, finite_or};

pub const DEFAULT_COLOUR: &str = "#000000";
pub const DEFAULT_WIDTH: f32 = 6.0;

/// Which tool produced a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PenTool {
    #[default]
    Pen,
    Eraser,
}

impl PenTool {
    fn from_json(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("eraser") => Self::Eraser,
            _ => Self::Pen,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pen => "pen",
            Self::Eraser => "eraser",
        }
    }

    /// How segments drawn with this tool combine with existing pixels
    pub fn compositing(self) -> Compositing {
        match self {
            Self::Pen => Compositing::SourceOver,
            Self::Eraser => Compositing::DestinationOut,
        }
    }
}

/// Compositing mode used when a segment is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compositing {
    /// Paint colour over whatever is there
    SourceOver,
    /// Remove existing pixels along the segment
    DestinationOut,
}

/// Colour, width and tool applied to a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenStyle {
    pub colour: String,
    pub width: f32,
    pub tool: PenTool,
}

impl Default for PenStyle {
    fn default() -> Self {
        Self {
            colour: DEFAULT_COLOUR.to_owned(),
            width: DEFAULT_WIDTH,
            tool: PenTool::Pen,
        }
    }
}

impl PenStyle {
    pub fn new(colour: impl Into<String>, width: f32, tool: PenTool) -> Self {
        Self {
            colour: colour.into(),
            width,
            tool,
        }
    }

    pub fn pen(colour: impl Into<String>, width: f32) -> Self {
        Self::new(colour, width, PenTool::Pen)
    }

    pub fn eraser(width: f32) -> Self {
        Self::new(DEFAULT_COLOUR, width, PenTool::Eraser)
    }

    pub fn is_eraser(&self) -> bool {
        self.tool == PenTool::Eraser
    }

    /// Same style with another colour
    pub fn with_colour(&self, colour: impl Into<String>) -> Self {
        Self {
            colour: colour.into(),
            ..self.clone()
        }
    }

    /// Lenient reader, every missing or invalid field takes its default.
    pub fn from_json(value: &Value) -> Self {
        let colour = value
            .get("colour")
            .and_then(Value::as_str)
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_COLOUR)
            .to_owned();

        let width = finite_or(value.get("width"), DEFAULT_WIDTH);
        let width = if width > 0.0 { width } else { DEFAULT_WIDTH };

        Self {
            colour,
            width,
            tool: PenTool::from_json(value.get("tool")),
        }
    }

    pub fn to_json(&self) -> Value {
        let width = if self.width.is_finite() && self.width > 0.0 {
            self.width
        } else {
            DEFAULT_WIDTH
        };
        json!({"colour": self.colour, "width": width, "tool": self.tool.as_str()})
    }
}

/// One straight line command between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub style: PenStyle,
}

impl Segment {
    pub fn new(start: Point, end: Point, style: PenStyle) -> Self {
        Self { start, end, style }
    }

    /// Zero-length segment, renders as a dot.
    pub fn dot(at: Point, style: PenStyle) -> Self {
        Self::new(at, at, style)
    }

    pub fn compositing(&self) -> Compositing {
        self.style.tool.compositing()
    }

    pub fn from_json(value: &Value) -> Self {
        let null = Value::Null;
        Self {
            start: Point::from_json(value.get("start").unwrap_or(&null)),
            end: Point::from_json(value.get("end").unwrap_or(&null)),
            style: PenStyle::from_json(value.get("style").unwrap_or(&null)),
        }
    }

    /// Invalid numbers are written as the defaults [`Self::from_json`] would pick.
    pub fn to_json(&self) -> Value {
        json!({
            "start": self.start.to_json(),
            "end": self.end.to_json(),
            "style": self.style.to_json(),
        })
    }
}

/// Parse a single segment from a JSON string. Garbage yields a default segment.
pub fn deserialize_segment(json: &str) -> Segment {
    match serde_json::from_str::<Value>(json) {
        Ok(value) => Segment::from_json(&value),
        Err(err) => {
            log::debug!("Unparsable segment, using defaults: {}", err);
            Segment::from_json(&Value::Null)
        }
    }
}

pub fn serialize_segment(segment: &Segment) -> String {
    segment.to_json().to_string()
}

/// Everything drawn between one pointer-down and the matching pointer-up.
///
/// Never empty, and consecutive segments share their joint point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Stroke {
    segments: Vec<Segment>,
}

impl Stroke {
    /// Build a stroke, `None` if there are no segments or two neighbours don't share their joint.
    pub fn new(segments: Vec<Segment>) -> Option<Self> {
        let stroke = Self { segments };
        if stroke.is_empty() {
            None
        } else if !stroke.is_continuous() {
            log::warn!("Rejecting discontinuous stroke of {} segments", stroke.len());
            None
        } else {
            Some(stroke)
        }
    }

    /// Build a continuous stroke through `points` with a leading dot at the first point.
    pub fn from_points(points: &[Point], style: &PenStyle) -> Option<Self> {
        let first = *points.first()?;
        let mut segments = vec![Segment::dot(first, style.clone())];
        segments.extend(
            points
                .windows(2)
                .map(|pair| Segment::new(pair[0], pair[1], style.clone())),
        );
        Self::new(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false, kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Check the continuity invariant.
    pub fn is_continuous(&self) -> bool {
        self.segments.windows(2).all(|pair| pair[0].end == pair[1].start)
    }

    /// Lenient reader: a non-array becomes `None`, each element is read with defaults.
    ///
    /// A segment that doesn't start where the previous one ended is moved to start there.
    pub fn from_json(value: &Value) -> Option<Self> {
        let mut segments: Vec<Segment> = value
            .as_array()
            .map(|items| items.iter().map(Segment::from_json).collect())
            .unwrap_or_default();
        for i in 1..segments.len() {
            let joint = segments[i - 1].end;
            if segments[i].start != joint {
                log::debug!("Joining segment {} to the previous end point", i);
                segments[i].start = joint;
            }
        }
        Self::new(segments)
    }
}

/// Read an array of strokes. Anything that is not an array is an empty sequence,
/// and strokes that end up with no segments are dropped.
pub fn strokes_from_json(value: &Value) -> Vec<Stroke> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Stroke::from_json).collect())
        .unwrap_or_default()
}

pub fn strokes_to_json<'a>(strokes: impl IntoIterator<Item = &'a Stroke>) -> Value {
    Value::Array(
        strokes
            .into_iter()
            .map(|stroke| Value::Array(stroke.segments.iter().map(Segment::to_json).collect()))
            .collect(),
    )
}

use std::sync::Arc;

use parking_lot::Mutex;

use crate::geometry::Point;
use crate::stroke::{Compositing, PenStyle, Segment};

/// A drawing target that capture and replay render onto.
///
/// Implemented by the UI layer. Width and height may change between calls
/// when the container is resized.
pub trait Surface {
    /// Current width in pixels
    fn width(&self) -> f32;

    /// Current height in pixels
    fn height(&self) -> f32;

    /// Render one line command
    fn draw_segment(&mut self, segment: &Segment, compositing: Compositing);

    /// Show the pen-tip sprite at `point` on the overlay
    fn draw_pen_tip(&mut self, point: Point, style: &PenStyle);

    /// Hide the pen-tip sprite
    fn clear_pen_tip(&mut self);

    /// Wipe everything that was drawn
    fn clear(&mut self);
}

/// A surface shared between the controller, a running playback and the UI.
///
/// Locks are short and never held across a suspension point.
pub type SharedSurface<S> = Arc<Mutex<S>>;

pub fn shared<S: Surface>(surface: S) -> SharedSurface<S> {
    Arc::new(Mutex::new(surface))
}

/// A single call made on a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Segment(Segment, Compositing),
    PenTip(Point),
    ClearPenTip,
    Clear,
}

/// Headless surface that keeps a log of every call, handy for tests and tooling.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: f32,
    height: f32,
    commands: Vec<DrawCommand>,
    pen_tip: Option<Point>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
            pen_tip: None,
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Segments drawn so far, in call order.
    pub fn segments(&self) -> Vec<&Segment> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Segment(segment, _) => Some(segment),
                _ => None,
            })
            .collect()
    }

    /// Segments drawn since the last `clear()`.
    pub fn visible_segments(&self) -> Vec<&Segment> {
        let start = self
            .commands
            .iter()
            .rposition(|cmd| matches!(cmd, DrawCommand::Clear))
            .map_or(0, |i| i + 1);
        self.commands[start..]
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Segment(segment, _) => Some(segment),
                _ => None,
            })
            .collect()
    }

    pub fn pen_tip(&self) -> Option<Point> {
        self.pen_tip
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn draw_segment(&mut self, segment: &Segment, compositing: Compositing) {
        self.commands
            .push(DrawCommand::Segment(segment.clone(), compositing));
    }

    fn draw_pen_tip(&mut self, point: Point, _style: &PenStyle) {
        self.pen_tip = Some(point);
        self.commands.push(DrawCommand::PenTip(point));
    }

    fn clear_pen_tip(&mut self) {
        self.pen_tip = None;
        self.commands.push(DrawCommand::ClearPenTip);
    }

    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }
}

use crate::colour::RainbowCycle;
use crate::geometry::Point;
use crate::stroke::{PenStyle, Segment, Stroke};
use crate::surface::Surface;

/// Where the capture machine is within a gesture.
#[derive(Debug, Clone, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing {
        segments: Vec<Segment>,
        anchor: Point,
        style: PenStyle,
    },
}

/// Turns pointer down/move/up into segments and a finished [`Stroke`].
///
/// Every handler runs to completion synchronously and renders what it emits
/// straight onto the surface.
#[derive(Debug, Clone, Default)]
pub struct CaptureMachine {
    state: CaptureState,
    rainbow: Option<RainbowCycle>,
}

impl CaptureMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, CaptureState::Capturing { .. })
    }

    /// Turn rainbow cycling on or off. The hue carries over between gestures.
    pub fn set_rainbow(&mut self, enabled: bool) {
        match (enabled, self.rainbow) {
            (true, None) => self.rainbow = Some(RainbowCycle::default()),
            (false, Some(_)) => self.rainbow = None,
            _ => {}
        }
    }

    pub fn rainbow_enabled(&self) -> bool {
        self.rainbow.is_some()
    }

    /// Pointer went down. Returns whether a gesture started.
    ///
    /// Ignored while a gesture is already running or when `point` is outside the surface.
    pub fn begin<S: Surface + ?Sized>(&mut self, point: Point, style: PenStyle, surface: &mut S) -> bool {
        if self.is_capturing() {
            log::debug!("Ignoring pointer down, already capturing");
            return false;
        }
        if !point.is_within(surface.width(), surface.height()) {
            return false;
        }

        let dot = Segment::dot(point, self.segment_style(&style));
        surface.draw_segment(&dot, dot.compositing());

        self.state = CaptureState::Capturing {
            segments: vec![dot],
            anchor: point,
            style,
        };
        true
    }

    /// Pointer moved. The point is clamped to the surface's current size.
    pub fn extend<S: Surface + ?Sized>(&mut self, point: Point, surface: &mut S) -> Option<Segment> {
        let point = point.clamp_to(surface.width(), surface.height());

        let base = match &self.state {
            CaptureState::Capturing { style, .. } => style.clone(),
            CaptureState::Idle => return None,
        };
        let segment_style = self.segment_style(&base);

        let CaptureState::Capturing { segments, anchor, .. } = &mut self.state else {
            return None;
        };

        let segment = Segment::new(*anchor, point, segment_style);
        surface.draw_segment(&segment, segment.compositing());
        *anchor = point;
        segments.push(segment.clone());
        Some(segment)
    }

    /// Pointer released. Returns the finished stroke, if any.
    pub fn end(&mut self) -> Option<Stroke> {
        match std::mem::take(&mut self.state) {
            CaptureState::Capturing { segments, .. } => Stroke::new(segments),
            CaptureState::Idle => None,
        }
    }

    /// Pointer cancelled. Behaves like a release.
    pub fn cancel(&mut self) -> Option<Stroke> {
        self.end()
    }

    /// Style for the next emitted segment, stepping the rainbow hue when active.
    fn segment_style(&mut self, base: &PenStyle) -> PenStyle {
        match self.rainbow.as_mut() {
            Some(cycle) if !base.is_eraser() => base.with_colour(cycle.advance()),
            _ => base.clone(),
        }
    }
}

// src/renderer.rs
use eframe::egui::{self, Color32, Painter, Pos2, Rect, Shape, Vec2};

use crate::colour::colour_or_black;
use crate::geometry::Point;
use crate::stroke::{Compositing, PenStyle, Segment};
use crate::surface::Surface;

/// Pen-tip sprite state on the overlay
#[derive(Debug, Clone, Copy, PartialEq)]
struct PenTip {
    at: Point,
    colour: Color32,
    width: f32,
}

/// egui-backed raster canvas.
///
/// Segments are kept as egui shapes in surface coordinates and re-painted
/// every frame at the canvas origin. Destructive segments paint the
/// background colour over what is there.
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    size: Vec2,
    background: Color32,
    shapes: Vec<Shape>,
    pen_tip: Option<PenTip>,
}

impl CanvasSurface {
    pub fn new(size: Vec2, background: Color32) -> Self {
        Self {
            size,
            background,
            shapes: Vec::new(),
            pen_tip: None,
        }
    }

    /// Update the pixel dimensions, e.g. after the window was resized
    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn has_pen_tip(&self) -> bool {
        self.pen_tip.is_some()
    }

    /// Paint the canvas and the overlay into `rect`.
    pub fn paint(&self, painter: &Painter, rect: Rect) {
        painter.rect_filled(rect, 0.0, self.background);

        let offset = rect.min.to_vec2();
        let clipped = painter.with_clip_rect(rect);
        for shape in &self.shapes {
            let mut shape = shape.clone();
            shape.translate(offset);
            clipped.add(shape);
        }

        if let Some(tip) = self.pen_tip {
            for shape in pen_tip_shapes(tip) {
                let mut shape = shape;
                shape.translate(offset);
                clipped.add(shape);
            }
        }
    }

    fn segment_colour(&self, segment: &Segment, compositing: Compositing) -> Color32 {
        match compositing {
            Compositing::SourceOver => colour_or_black(&segment.style.colour),
            Compositing::DestinationOut => self.background,
        }
    }
}

/// A nib dot with a short shaft leaning up and to the right.
fn pen_tip_shapes(tip: PenTip) -> [Shape; 3] {
    let nib = Pos2::from(tip.at);
    let radius = (tip.width / 2.0).max(2.0);
    let shaft_end = nib + egui::vec2(18.0, -30.0);
    [
        Shape::line_segment([nib, shaft_end], egui::Stroke::new(6.0, Color32::from_gray(60))),
        Shape::circle_filled(shaft_end, 3.0, Color32::from_gray(60)),
        Shape::circle_filled(nib, radius, tip.colour),
    ]
}

impl Surface for CanvasSurface {
    fn width(&self) -> f32 {
        self.size.x
    }

    fn height(&self) -> f32 {
        self.size.y
    }

    fn draw_segment(&mut self, segment: &Segment, compositing: Compositing) {
        let colour = self.segment_colour(segment, compositing);
        let width = segment.style.width;
        let start = Pos2::from(segment.start);
        let end = Pos2::from(segment.end);

        // egui lines have butt caps, round the joints with dots
        if start != end {
            self.shapes
                .push(Shape::line_segment([start, end], egui::Stroke::new(width, colour)));
        }
        self.shapes.push(Shape::circle_filled(end, width / 2.0, colour));
    }

    fn draw_pen_tip(&mut self, point: Point, style: &PenStyle) {
        self.pen_tip = Some(PenTip {
            at: point,
            colour: colour_or_black(&style.colour),
            width: style.width,
        });
    }

    fn clear_pen_tip(&mut self) {
        self.pen_tip = None;
    }

    fn clear(&mut self) {
        self.shapes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> CanvasSurface {
        CanvasSurface::new(egui::vec2(100.0, 100.0), Color32::WHITE)
    }

    #[test]
    fn test_dot_and_line_shapes() {
        let mut canvas = canvas();
        let style = PenStyle::pen("#ff0000", 4.0);
        canvas.draw_segment(&Segment::dot(Point::new(1.0, 1.0), style.clone()), Compositing::SourceOver);
        canvas.draw_segment(
            &Segment::new(Point::new(1.0, 1.0), Point::new(9.0, 1.0), style),
            Compositing::SourceOver,
        );
        assert_eq!(canvas.shape_count(), 3);

        canvas.clear();
        assert_eq!(canvas.shape_count(), 0);
    }

    #[test]
    fn test_eraser_paints_background() {
        let canvas = canvas();
        let segment = Segment::dot(Point::ZERO, PenStyle::eraser(10.0));
        assert_eq!(
            canvas.segment_colour(&segment, Compositing::DestinationOut),
            Color32::WHITE
        );
    }

    #[test]
    fn test_pen_tip_overlay() {
        let mut canvas = canvas();
        canvas.draw_pen_tip(Point::new(3.0, 4.0), &PenStyle::default());
        assert!(canvas.has_pen_tip());
        canvas.clear();
        assert!(canvas.has_pen_tip());
        canvas.clear_pen_tip();
        assert!(!canvas.has_pen_tip());
    }

    #[test]
    fn test_paint_basics() {
        let mut canvas = canvas();
        canvas.draw_segment(&Segment::dot(Point::new(5.0, 5.0), PenStyle::default()), Compositing::SourceOver);
        let ctx = egui::Context::default();
        let layer_id = egui::LayerId::background();
        let rect = Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(100.0, 100.0));
        let painter = Painter::new(ctx, layer_id, rect);

        canvas.paint(&painter, rect);
    }
}

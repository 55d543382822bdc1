#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod capture;
pub mod colour;
pub mod controller;
pub mod geometry;
pub mod renderer;
pub mod replay;
pub mod state;
pub mod stroke;
pub mod surface;

pub use app::HandwritingApp;
pub use capture::{CaptureMachine, CaptureState};
pub use controller::BoardController;
pub use geometry::Point;
pub use renderer::CanvasSurface;
pub use replay::{CancellationToken, Clock, PlaybackHandle, PlaybackKind, PlaybackStatus, SpeedControl};
pub use state::{BoardSettings, KeyValueStorage, MemoryStorage, StrokeStore};
pub use stroke::{Compositing, PenStyle, PenTool, Segment, Stroke};
pub use surface::{RecordingSurface, Surface};

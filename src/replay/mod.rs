//! Instant and timed re-rendering of committed strokes.

mod cancel;
mod clock;
mod engine;

pub use cancel::{CancellationToken, PlaybackHandle, PlaybackKind, PlaybackStatus};
pub use clock::{Clock, RecordingClock, SystemClock};
pub use engine::{
    MAX_SPEED, MIN_SPEED, ReplayJob, ReplayTiming, SpeedControl, render_instant,
    render_strokes_preview, render_timed,
};

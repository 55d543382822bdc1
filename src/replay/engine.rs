use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use futures::future::{self, Either};

use super::cancel::{CancellationToken, PlaybackStatus};
use super::clock::Clock;
use crate::stroke::Stroke;
use crate::surface::{SharedSurface, Surface};

pub const MIN_SPEED: f32 = 0.1;
pub const MAX_SPEED: f32 = 10.0;

/// Baseline delays, before speed scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayTiming {
    /// Pause after every segment
    pub segment_delay: Duration,
    /// Pause between two strokes
    pub stroke_delay: Duration,
}

impl Default for ReplayTiming {
    fn default() -> Self {
        Self {
            segment_delay: Duration::from_millis(50),
            stroke_delay: Duration::from_millis(400),
        }
    }
}

/// Playback speed multiplier, shared so the UI can change it mid-playback.
#[derive(Debug, Clone)]
pub struct SpeedControl {
    bits: Arc<AtomicU32>,
}

impl Default for SpeedControl {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SpeedControl {
    pub fn new(speed: f32) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(Self::clamp(speed).to_bits())),
        }
    }

    /// Force a multiplier into `[0.1, 10]`; NaN becomes `1`.
    pub fn clamp(speed: f32) -> f32 {
        if speed.is_nan() {
            1.0
        } else {
            speed.clamp(MIN_SPEED, MAX_SPEED)
        }
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn set(&self, speed: f32) {
        self.bits.store(Self::clamp(speed).to_bits(), Ordering::Relaxed);
    }

    /// `base` divided by the current multiplier
    pub fn scale(&self, base: Duration) -> Duration {
        Duration::from_secs_f64(base.as_secs_f64() / f64::from(self.get()))
    }
}

/// Everything a playback needs, owned so the future can outlive the caller's borrow.
pub struct ReplayJob<S: Surface> {
    pub strokes: Arc<[Stroke]>,
    pub surface: SharedSurface<S>,
    pub clock: Arc<dyn Clock>,
    pub timing: ReplayTiming,
}

impl<S: Surface> Clone for ReplayJob<S> {
    fn clone(&self) -> Self {
        Self {
            strokes: self.strokes.clone(),
            surface: self.surface.clone(),
            clock: self.clock.clone(),
            timing: self.timing,
        }
    }
}

enum Pacing<'a> {
    Scaled(&'a SpeedControl),
    Fixed,
}

impl Pacing<'_> {
    fn delay(&self, base: Duration) -> Duration {
        match self {
            Self::Scaled(speed) => speed.scale(base),
            Self::Fixed => base,
        }
    }
}

/// Draw every segment of every stroke in commit order, without any delay.
pub fn render_instant<S: Surface + ?Sized>(strokes: &[Stroke], surface: &mut S) {
    for segment in strokes.iter().flat_map(Stroke::segments) {
        surface.draw_segment(segment, segment.compositing());
    }
}

/// Rewrite playback: pen-tip sprite, delays divided by the live speed multiplier.
///
/// On cancellation returns right away and leaves the surface as it is.
pub async fn render_timed<S: Surface>(
    job: &ReplayJob<S>,
    speed: &SpeedControl,
    token: &CancellationToken,
) -> PlaybackStatus {
    play(job, Pacing::Scaled(speed), true, token).await
}

/// Lighter preview: fixed pacing regardless of the speed control, no sprite.
pub async fn render_strokes_preview<S: Surface>(
    job: &ReplayJob<S>,
    token: &CancellationToken,
) -> PlaybackStatus {
    play(job, Pacing::Fixed, false, token).await
}

async fn play<S: Surface>(
    job: &ReplayJob<S>,
    pacing: Pacing<'_>,
    pen_tip: bool,
    token: &CancellationToken,
) -> PlaybackStatus {
    let status = walk(job, &pacing, pen_tip, token).await;
    if pen_tip {
        job.surface.lock().clear_pen_tip();
    }
    log::debug!("Playback finished: {:?}", status);
    status
}

async fn walk<S: Surface>(
    job: &ReplayJob<S>,
    pacing: &Pacing<'_>,
    pen_tip: bool,
    token: &CancellationToken,
) -> PlaybackStatus {
    for (index, stroke) in job.strokes.iter().enumerate() {
        if token.is_cancelled() {
            return PlaybackStatus::Cancelled;
        }
        if index > 0 && !pause(job, pacing.delay(job.timing.stroke_delay), token).await {
            return PlaybackStatus::Cancelled;
        }

        for segment in stroke.segments() {
            if token.is_cancelled() {
                return PlaybackStatus::Cancelled;
            }
            {
                let mut surface = job.surface.lock();
                surface.draw_segment(segment, segment.compositing());
                if pen_tip {
                    if segment.style.is_eraser() {
                        surface.clear_pen_tip();
                    } else {
                        surface.draw_pen_tip(segment.end, &segment.style);
                    }
                }
            }
            if !pause(job, pacing.delay(job.timing.segment_delay), token).await {
                return PlaybackStatus::Cancelled;
            }
        }
    }
    PlaybackStatus::Completed
}

/// Suspend for `delay` or until cancelled. Returns false if cancelled.
async fn pause<S: Surface>(job: &ReplayJob<S>, delay: Duration, token: &CancellationToken) -> bool {
    if token.is_cancelled() {
        return false;
    }
    let cancelled = std::pin::pin!(token.cancelled());
    match future::select(job.clock.sleep(delay), cancelled).await {
        Either::Left(((), _)) => !token.is_cancelled(),
        Either::Right(((), _)) => false,
    }
}

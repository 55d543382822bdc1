use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use futures::FutureExt as _;
use futures::future::LocalBoxFuture;

use crate::capture::CaptureMachine;
use crate::geometry::Point;
use crate::replay::{
    Clock, PlaybackHandle, PlaybackKind, PlaybackStatus, ReplayJob, ReplayTiming, SpeedControl,
    render_instant, render_strokes_preview, render_timed,
};
use crate::state::{BoardSettings, StrokeStore};
use crate::stroke::{PenStyle, Stroke};
use crate::surface::{SharedSurface, Surface};

struct ActivePlayback {
    handle: PlaybackHandle,
    future: LocalBoxFuture<'static, PlaybackStatus>,
}

/// Owns the stroke history, the capture machine and the running playback for one surface.
///
/// The UI layer calls these methods from its event handlers and calls [`Self::tick`]
/// whenever the waker handed to [`Self::set_waker`] fires.
pub struct BoardController<S: Surface + 'static> {
    surface: SharedSurface<S>,
    store: StrokeStore,
    capture: CaptureMachine,
    clock: Arc<dyn Clock>,
    timing: ReplayTiming,
    speed: SpeedControl,
    active: Option<ActivePlayback>,
    waker: Waker,
}

impl<S: Surface + 'static> std::fmt::Debug for BoardController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardController")
            .field("store", &self.store)
            .field("capturing", &self.capture.is_capturing())
            .field("speed", &self.speed.get())
            .field("active", &self.active.as_ref().map(|a| a.handle.kind()))
            .finish()
    }
}

impl<S: Surface + 'static> BoardController<S> {
    /// Load persisted strokes and draw them.
    pub fn init(surface: SharedSurface<S>, mut store: StrokeStore, clock: Arc<dyn Clock>) -> Self {
        store.load();
        let settings = store.settings().clone();

        let mut capture = CaptureMachine::new();
        capture.set_rainbow(settings.rainbow);

        let controller = Self {
            surface,
            store,
            capture,
            clock,
            timing: ReplayTiming::default(),
            speed: SpeedControl::new(settings.rewrite_speed),
            active: None,
            waker: futures::task::noop_waker(),
        };
        controller.redraw();
        log::info!("Board ready with {} strokes", controller.store.committed().len());
        controller
    }

    /// Use other baseline delays for playback
    pub fn with_timing(mut self, timing: ReplayTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Waker passed to the running playback, woken when its next step is due.
    pub fn set_waker(&mut self, waker: Waker) {
        self.waker = waker;
    }

    /// Stop any playback, commit a stroke in progress and flush to storage.
    pub fn dispose(mut self) -> StrokeStore {
        self.stop_playback();
        if let Some(stroke) = self.capture.end() {
            self.store.commit(stroke);
        }
        self.store.persist();
        std::mem::replace(&mut self.store, StrokeStore::detached())
    }

    pub fn surface(&self) -> &SharedSurface<S> {
        &self.surface
    }

    pub fn store(&self) -> &StrokeStore {
        &self.store
    }

    pub fn committed(&self) -> &[Stroke] {
        self.store.committed()
    }

    pub fn settings(&self) -> &BoardSettings {
        self.store.settings()
    }

    /// Apply new settings and persist them.
    pub fn set_settings(&mut self, settings: BoardSettings) {
        self.store.set_settings(settings);
        let settings = self.store.settings();
        self.capture.set_rainbow(settings.rainbow);
        self.speed.set(settings.rewrite_speed);
    }

    pub fn speed(&self) -> &SpeedControl {
        &self.speed
    }

    /// Change the rewrite speed; a running rewrite picks it up at its next step.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed.set(speed);
        let mut settings = self.store.settings().clone();
        settings.rewrite_speed = self.speed.get();
        self.store.set_settings(settings);
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_capturing()
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_kind(&self) -> Option<PlaybackKind> {
        self.active.as_ref().map(|a| a.handle.kind())
    }

    /// Pointer down with the style from the current settings.
    pub fn begin_stroke(&mut self, point: Point) -> bool {
        let style = self.store.settings().active_style();
        self.begin_stroke_with(point, style)
    }

    /// Pointer down with an explicit style. Ignored while a playback is running.
    pub fn begin_stroke_with(&mut self, point: Point, style: PenStyle) -> bool {
        if self.is_playing() {
            log::debug!("Ignoring pointer down during playback");
            return false;
        }
        self.capture.begin(point, style, &mut *self.surface.lock())
    }

    pub fn extend_stroke(&mut self, point: Point) {
        self.capture.extend(point, &mut *self.surface.lock());
    }

    /// Pointer up. Returns whether a stroke was committed.
    pub fn end_stroke(&mut self) -> bool {
        match self.capture.end() {
            Some(stroke) => self.store.commit(stroke),
            None => false,
        }
    }

    /// Pointer cancel, handled like a release.
    pub fn cancel_stroke(&mut self) -> bool {
        match self.capture.cancel() {
            Some(stroke) => self.store.commit(stroke),
            None => false,
        }
    }

    /// Ignored while a stroke is being drawn.
    pub fn undo(&mut self) -> bool {
        if self.is_capturing() {
            log::debug!("Ignoring undo during capture");
            return false;
        }
        self.stop_playback();
        let undone = self.store.undo();
        if undone {
            self.redraw();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        if self.is_capturing() {
            log::debug!("Ignoring redo during capture");
            return false;
        }
        self.stop_playback();
        let redone = self.store.redo();
        if redone {
            self.redraw();
        }
        redone
    }

    /// Clear all strokes and the surface.
    pub fn reset(&mut self) {
        self.stop_playback();
        self.capture.end();
        self.store.reset();
        self.redraw();
    }

    /// Clear the surface and draw every committed stroke instantly.
    pub fn redraw(&self) {
        let mut surface = self.surface.lock();
        surface.clear();
        surface.clear_pen_tip();
        render_instant(self.store.committed(), &mut *surface);
    }

    /// Start the speed-controlled rewrite, replacing any running playback.
    pub fn start_rewrite(&mut self, speed: f32) -> PlaybackHandle {
        self.set_speed(speed);
        self.start(PlaybackKind::Rewrite)
    }

    pub fn cancel_rewrite(&mut self) {
        if self.active_kind() == Some(PlaybackKind::Rewrite) {
            self.stop_playback();
        }
    }

    /// Start the fixed-pace preview, replacing any running playback.
    pub fn start_replay(&mut self) -> PlaybackHandle {
        self.start(PlaybackKind::Replay)
    }

    pub fn cancel_replay(&mut self) {
        if self.active_kind() == Some(PlaybackKind::Replay) {
            self.stop_playback();
        }
    }

    /// Advance the running playback. Returns true while one is still running.
    ///
    /// When it finishes, for whatever reason, the surface is redrawn instantly.
    pub fn tick(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        let mut cx = Context::from_waker(&self.waker);
        match active.future.poll_unpin(&mut cx) {
            Poll::Pending => true,
            Poll::Ready(status) => {
                log::info!("{:?} playback ended: {:?}", active.handle.kind(), status);
                self.active = None;
                self.redraw();
                false
            }
        }
    }

    fn start(&mut self, kind: PlaybackKind) -> PlaybackHandle {
        self.stop_playback();
        // Capture and playback never share the surface
        if let Some(stroke) = self.capture.end() {
            self.store.commit(stroke);
        }

        {
            let mut surface = self.surface.lock();
            surface.clear();
            surface.clear_pen_tip();
        }

        let handle = PlaybackHandle::new(kind);
        let job = ReplayJob {
            strokes: Arc::from(self.store.committed()),
            surface: self.surface.clone(),
            clock: self.clock.clone(),
            timing: self.timing,
        };
        let speed = self.speed.clone();
        let finished = handle.clone();
        let token = handle.token().clone();

        let future = async move {
            let status = match kind {
                PlaybackKind::Rewrite => render_timed(&job, &speed, &token).await,
                PlaybackKind::Replay => render_strokes_preview(&job, &token).await,
            };
            finished.finish(status);
            status
        }
        .boxed_local();

        log::info!("Starting {:?} of {} strokes", kind, self.store.committed().len());
        self.active = Some(ActivePlayback {
            handle: handle.clone(),
            future,
        });
        // Draw the first segment right away
        self.tick();
        handle
    }

    /// Cancel the running playback, let it observe the cancellation, then redraw.
    fn stop_playback(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        active.handle.cancel();

        let mut cx = Context::from_waker(&self.waker);
        if active.future.poll_unpin(&mut cx).is_pending() {
            log::warn!("Playback did not stop on cancellation, dropping it");
            active.handle.finish(PlaybackStatus::Cancelled);
        }
        self.redraw();
    }
}

impl<S: Surface + 'static> Drop for BoardController<S> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.handle.cancel();
            active.handle.finish(PlaybackStatus::Cancelled);
        }
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use eframe_rewrite::replay::{Clock, RecordingClock, ReplayTiming, SystemClock};
use eframe_rewrite::surface::{self, SharedSurface};
use eframe_rewrite::{
    BoardController, BoardSettings, MemoryStorage, PenStyle, PenTool, PlaybackKind,
    PlaybackStatus, Point, RecordingSurface, StrokeStore,
};
use futures::FutureExt as _;
use futures::future::LocalBoxFuture;
use futures::task::ArcWake;
use parking_lot::Mutex;

/// A clock that never lets time pass, so a playback stays in its first pause
struct FrozenClock;

impl Clock for FrozenClock {
    fn sleep(&self, _duration: Duration) -> LocalBoxFuture<'static, ()> {
        futures::future::pending().boxed_local()
    }
}

/// Remembers that it was woken
struct WakeFlag(AtomicBool);

impl ArcWake for WakeFlag {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.store(true, Ordering::SeqCst);
    }
}

fn board(clock: Arc<dyn Clock>) -> BoardController<RecordingSurface> {
    let surface = surface::shared(RecordingSurface::new(300.0, 200.0));
    BoardController::init(surface, StrokeStore::detached(), clock)
}

// Draw a short horizontal stroke starting at (x, y)
fn draw(board: &mut BoardController<RecordingSurface>, x: f32, y: f32) {
    assert!(board.begin_stroke(Point::new(x, y)));
    board.extend_stroke(Point::new(x + 5.0, y));
    board.extend_stroke(Point::new(x + 10.0, y));
    assert!(board.end_stroke());
}

fn visible(surface: &SharedSurface<RecordingSurface>) -> usize {
    surface.lock().visible_segments().len()
}

#[test]
fn test_capture_commits_continuous_stroke() {
    let mut board = board(Arc::new(RecordingClock::new()));
    draw(&mut board, 10.0, 10.0);

    let strokes = board.committed();
    assert_eq!(strokes.len(), 1);
    assert_eq!(strokes[0].len(), 3);
    assert!(strokes[0].is_continuous());
    assert_eq!(visible(board.surface()), 3);
}

#[test]
fn test_undo_redo_reset_redraw_the_surface() {
    let mut board = board(Arc::new(RecordingClock::new()));
    draw(&mut board, 10.0, 10.0);
    draw(&mut board, 10.0, 50.0);
    assert_eq!(visible(board.surface()), 6);

    assert!(board.undo());
    assert_eq!(visible(board.surface()), 3);
    assert!(board.redo());
    assert_eq!(visible(board.surface()), 6);
    assert!(!board.redo());

    board.reset();
    assert_eq!(visible(board.surface()), 0);
    assert!(!board.undo());
}

#[test]
fn test_init_draws_persisted_strokes() {
    let storage = Arc::new(Mutex::new(MemoryStorage::new()));
    {
        let surface = surface::shared(RecordingSurface::new(300.0, 200.0));
        let mut board = BoardController::init(
            surface,
            StrokeStore::new(Box::new(storage.clone())),
            Arc::new(RecordingClock::new()),
        );
        draw(&mut board, 1.0, 1.0);
        draw(&mut board, 1.0, 20.0);
        board.undo();
    }

    let surface = surface::shared(RecordingSurface::new(300.0, 200.0));
    let board = BoardController::init(
        surface.clone(),
        StrokeStore::new(Box::new(storage)),
        Arc::new(RecordingClock::new()),
    );
    assert_eq!(board.committed().len(), 1);
    assert_eq!(board.store().undone_len(), 1);
    assert_eq!(visible(&surface), 3);
}

#[test]
fn test_rewrite_with_instant_clock_completes() {
    let clock = RecordingClock::new();
    let mut board = board(Arc::new(clock.clone()));
    draw(&mut board, 10.0, 10.0);
    draw(&mut board, 10.0, 50.0);

    let handle = board.start_rewrite(2.0);
    assert_eq!(handle.status(), PlaybackStatus::Completed);
    assert!(!board.is_playing());
    assert_eq!(visible(board.surface()), 6);
    // 6 segments at 25ms and one stroke pause at 200ms
    assert_eq!(clock.total(), Duration::from_millis(6 * 25 + 200));
}

#[test]
fn test_capture_is_disabled_during_playback() {
    let mut board = board(Arc::new(FrozenClock));
    draw(&mut board, 10.0, 10.0);

    let handle = board.start_rewrite(1.0);
    assert!(board.is_playing());
    assert_eq!(handle.status(), PlaybackStatus::Running);
    // Only the first segment has been replayed so far
    assert_eq!(visible(board.surface()), 1);
    assert!(board.tick());

    assert!(!board.begin_stroke(Point::new(50.0, 50.0)));
    assert!(!board.is_capturing());
}

#[test]
fn test_cancel_rewrite_restores_full_drawing() {
    let mut board = board(Arc::new(FrozenClock));
    draw(&mut board, 10.0, 10.0);
    draw(&mut board, 10.0, 50.0);

    let handle = board.start_rewrite(1.0);
    board.cancel_rewrite();
    assert_eq!(handle.status(), PlaybackStatus::Cancelled);
    assert!(!board.is_playing());
    assert_eq!(visible(board.surface()), 6);
    assert_eq!(board.surface().lock().pen_tip(), None);

    // Second cancel, and cancelling through the finished handle, change nothing
    board.cancel_rewrite();
    handle.cancel();
    assert_eq!(handle.status(), PlaybackStatus::Cancelled);
    assert_eq!(visible(board.surface()), 6);
}

#[test]
fn test_cancelling_finished_handle_is_a_no_op() {
    let mut board = board(Arc::new(RecordingClock::new()));
    draw(&mut board, 10.0, 10.0);

    let handle = board.start_replay();
    assert_eq!(handle.status(), PlaybackStatus::Completed);
    handle.cancel();
    handle.cancel();
    board.cancel_replay();
    assert_eq!(handle.status(), PlaybackStatus::Completed);
    assert!(!board.tick());
}

#[test]
fn test_handle_cancel_is_observed_on_next_tick() {
    let mut board = board(Arc::new(FrozenClock));
    draw(&mut board, 10.0, 10.0);

    let handle = board.start_replay();
    assert_eq!(board.active_kind(), Some(PlaybackKind::Replay));
    handle.cancel();
    assert!(!board.tick());
    assert_eq!(handle.status(), PlaybackStatus::Cancelled);
    assert_eq!(visible(board.surface()), 3);
}

#[test]
fn test_only_one_playback_at_a_time() {
    let mut board = board(Arc::new(FrozenClock));
    draw(&mut board, 10.0, 10.0);

    let rewrite = board.start_rewrite(1.0);
    // Cancelling the other kind leaves the rewrite alone
    board.cancel_replay();
    assert_eq!(rewrite.status(), PlaybackStatus::Running);

    let replay = board.start_replay();
    assert_eq!(rewrite.status(), PlaybackStatus::Cancelled);
    assert_eq!(replay.status(), PlaybackStatus::Running);
    assert_eq!(board.active_kind(), Some(PlaybackKind::Replay));

    let again = board.start_replay();
    assert_eq!(replay.status(), PlaybackStatus::Cancelled);
    assert_eq!(again.status(), PlaybackStatus::Running);
}

#[test]
fn test_undo_stops_playback() {
    let mut board = board(Arc::new(FrozenClock));
    draw(&mut board, 10.0, 10.0);
    draw(&mut board, 10.0, 50.0);

    let handle = board.start_rewrite(1.0);
    assert!(board.undo());
    assert_eq!(handle.status(), PlaybackStatus::Cancelled);
    assert!(!board.is_playing());
    assert_eq!(visible(board.surface()), 3);
}

#[test]
fn test_speed_changes_are_clamped_and_persisted() {
    let storage = Arc::new(Mutex::new(MemoryStorage::new()));
    let surface = surface::shared(RecordingSurface::new(300.0, 200.0));
    let mut board = BoardController::init(
        surface,
        StrokeStore::new(Box::new(storage.clone())),
        Arc::new(RecordingClock::new()),
    );

    board.set_speed(-1.0);
    assert_eq!(board.speed().get(), 0.1);
    board.set_speed(25.0);
    assert_eq!(board.settings().rewrite_speed, 10.0);

    let mut reloaded = StrokeStore::new(Box::new(storage));
    reloaded.load();
    assert_eq!(reloaded.settings().rewrite_speed, 10.0);
}

#[test]
fn test_settings_drive_the_active_style() {
    let mut board = board(Arc::new(RecordingClock::new()));
    let mut settings = BoardSettings::default();
    settings.tool = PenTool::Eraser;
    settings.eraser_width = 15.0;
    board.set_settings(settings);

    draw(&mut board, 10.0, 10.0);
    let style = &board.committed()[0].segments()[0].style;
    assert_eq!(style, &PenStyle::eraser(15.0));

    let mut settings = board.settings().clone();
    settings.tool = PenTool::Pen;
    settings.rainbow = true;
    board.set_settings(settings);
    draw(&mut board, 10.0, 40.0);
    let colours: Vec<&str> = board.committed()[1]
        .segments()
        .iter()
        .map(|s| s.style.colour.as_str())
        .collect();
    assert_eq!(colours, ["hsl(1, 100%, 50%)", "hsl(2, 100%, 50%)", "hsl(3, 100%, 50%)"]);
}

#[test]
fn test_dispose_commits_stroke_in_progress() {
    let mut board = board(Arc::new(FrozenClock));
    assert!(board.begin_stroke_with(Point::new(1.0, 1.0), PenStyle::pen("#00ff00", 2.0)));
    board.extend_stroke(Point::new(2.0, 2.0));

    let store = board.dispose();
    assert_eq!(store.committed().len(), 1);
    assert_eq!(store.committed()[0].len(), 2);
}

#[test]
fn test_undo_and_redo_wait_for_the_stroke_in_progress() {
    let mut board = board(Arc::new(RecordingClock::new()));
    draw(&mut board, 10.0, 10.0);
    draw(&mut board, 10.0, 50.0);
    assert!(board.undo());

    assert!(board.begin_stroke(Point::new(10.0, 90.0)));
    board.extend_stroke(Point::new(20.0, 90.0));
    assert!(!board.undo());
    assert!(!board.redo());
    // The ink of the stroke in progress is still on the surface
    assert_eq!(visible(board.surface()), 5);
    assert_eq!(board.store().undone_len(), 1);

    assert!(board.end_stroke());
    assert_eq!(board.committed().len(), 2);
    assert!(board.undo());
    assert_eq!(board.committed().len(), 1);
    assert_eq!(board.store().undone_len(), 1);
}

#[test]
fn test_cancel_stroke_commits_what_was_drawn() {
    let mut board = board(Arc::new(RecordingClock::new()));
    assert!(!board.cancel_stroke());

    assert!(board.begin_stroke(Point::new(5.0, 5.0)));
    board.extend_stroke(Point::new(8.0, 9.0));
    assert!(board.cancel_stroke());
    assert!(!board.is_capturing());
    assert_eq!(board.committed().len(), 1);
    assert_eq!(board.committed()[0].len(), 2);

    // Moves after the cancel draw nothing
    board.extend_stroke(Point::new(50.0, 50.0));
    assert_eq!(visible(board.surface()), 2);
    assert!(!board.cancel_stroke());
}

#[test]
fn test_system_clock_playback_wakes_the_board() {
    let flag = Arc::new(WakeFlag(AtomicBool::new(false)));
    let mut board = board(Arc::new(SystemClock)).with_timing(ReplayTiming {
        segment_delay: Duration::from_millis(5),
        stroke_delay: Duration::from_millis(10),
    });
    board.set_waker(futures::task::waker(flag.clone()));
    draw(&mut board, 10.0, 10.0);
    draw(&mut board, 10.0, 50.0);

    let handle = board.start_rewrite(1.0);
    let deadline = Instant::now() + Duration::from_secs(5);
    while board.is_playing() {
        assert!(Instant::now() < deadline, "playback was never woken");
        if flag.0.swap(false, Ordering::SeqCst) {
            board.tick();
        } else {
            std::thread::sleep(Duration::from_millis(1));
        }
    }
    assert_eq!(handle.status(), PlaybackStatus::Completed);
    assert_eq!(visible(board.surface()), 6);
}

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt as _;
use futures::future::LocalBoxFuture;
use parking_lot::Mutex;

/// Source of the suspensions between replayed segments.
pub trait Clock {
    /// A future that resolves once `duration` has passed
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Wall-clock delays backed by a timer that wakes the polling task when due.
///
/// Native builds use the `futures-timer` helper thread, the web build uses `setTimeout`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        futures_timer::Delay::new(duration).boxed_local()
    }
}

#[cfg(target_arch = "wasm32")]
impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        gloo_timers::future::TimeoutFuture::new(millis).boxed_local()
    }
}

/// A clock whose sleeps resolve immediately and are only written down.
///
/// Lets playback run to completion in one poll while the requested
/// delays can still be inspected.
#[derive(Debug, Default, Clone)]
pub struct RecordingClock {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every requested delay, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    /// Sum of all requested delays
    pub fn total(&self) -> Duration {
        self.sleeps.lock().iter().sum()
    }
}

impl Clock for RecordingClock {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        self.sleeps.lock().push(duration);
        futures::future::ready(()).boxed_local()
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn test_system_clock_wakes_the_executor() {
        let started = Instant::now();
        futures::executor::block_on(SystemClock.sleep(Duration::from_millis(30)));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_recording_clock_resolves_immediately() {
        let clock = RecordingClock::new();
        assert!(clock.sleep(Duration::from_secs(60)).now_or_never().is_some());
        clock.sleep(Duration::from_millis(5)).now_or_never();
        assert_eq!(clock.total(), Duration::from_millis(60_005));
    }
}

use std::sync::Arc;

use parking_lot::Mutex;
pub use tokio_util::sync::CancellationToken;

/// Which playback flavour a handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackKind {
    /// Speed-controlled playback with the pen-tip sprite
    Rewrite,
    /// Fixed-pace preview without the sprite
    Replay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Running,
    Completed,
    Cancelled,
}

/// Lets the caller observe and cancel a playback it started.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    kind: PlaybackKind,
    token: CancellationToken,
    status: Arc<Mutex<PlaybackStatus>>,
}

impl PlaybackHandle {
    pub fn new(kind: PlaybackKind) -> Self {
        Self {
            kind,
            token: CancellationToken::new(),
            status: Arc::new(Mutex::new(PlaybackStatus::Running)),
        }
    }

    pub fn kind(&self) -> PlaybackKind {
        self.kind
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn status(&self) -> PlaybackStatus {
        *self.status.lock()
    }

    pub fn is_finished(&self) -> bool {
        self.status() != PlaybackStatus::Running
    }

    /// Ask the playback to stop. Has no effect once it has finished.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Record the outcome. Only the first call after start counts.
    pub(crate) fn finish(&self, outcome: PlaybackStatus) {
        let mut status = self.status.lock();
        if *status == PlaybackStatus::Running {
            *status = outcome;
        }
    }
}

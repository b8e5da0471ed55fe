//! Cooperative pause and cancellation.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct State {
    paused: bool,
    cancelled: bool,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    changed: Condvar,
}

/// Shared pause/cancel flag checked by long-running work between units.
///
/// Clones share state: hand one clone to the worker and keep another to
/// control it. [`checkpoint`](Self::checkpoint) blocks while paused and
/// fails with [`Error::Cancelled`] once cancelled. Cancellation is final.
///
/// ```
/// use voxbook::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(token.checkpoint().is_ok());
/// token.cancel();
/// assert!(token.checkpoint().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.lock().paused = true;
        self.inner.changed.notify_all();
    }

    pub fn resume(&self) {
        self.lock().paused = false;
        self.inner.changed.notify_all();
    }

    pub fn cancel(&self) {
        self.lock().cancelled = true;
        self.inner.changed.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// Wait while paused, then report whether work may continue.
    pub fn checkpoint(&self) -> Result<()> {
        let mut state = self.lock();
        while state.paused && !state.cancelled {
            state = self
                .inner
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.cancelled {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Checkpoint on an optional token.
pub(crate) fn checkpoint(token: Option<&CancellationToken>) -> Result<()> {
    token.map_or(Ok(()), CancellationToken::checkpoint)
}

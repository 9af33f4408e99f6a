//! Cooperative cancellation for deadline-bounded searches.
//!
//! A [`CancelToken`] is shared between the search threads and a [`Watchdog`]
//! timer. The watchdog sets the token once, a safety margin before the hard
//! deadline; searches poll it at iteration boundaries and never block on it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

/// Shared stop flag.
///
/// Cloning yields another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request every holder of this token to stop.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Timer thread that cancels a token shortly before a deadline.
///
/// Disarming (explicitly or by dropping) wakes the timer and joins it without
/// touching the token.
#[derive(Debug)]
pub struct Watchdog {
    wake: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Watchdog {
    /// Instant at which a search with this deadline must stop.
    pub fn stop_at(deadline: Instant, safety_margin: Duration) -> Instant {
        deadline
            .checked_sub(safety_margin)
            .unwrap_or_else(Instant::now)
    }

    /// Start a timer that cancels `token` at `deadline - safety_margin`.
    pub fn arm(deadline: Instant, safety_margin: Duration, token: CancelToken) -> Self {
        let stop_at = Self::stop_at(deadline, safety_margin);
        let (wake, sleeper) = mpsc::channel::<()>();
        let timer_token = token.clone();

        let spawned = thread::Builder::new()
            .name("search-watchdog".into())
            .spawn(move || {
                let wait = stop_at.saturating_duration_since(Instant::now());
                match sleeper.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {
                        debug!(wait_ms = wait.as_millis() as u64, "Watchdog stopping search");
                        timer_token.cancel();
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        trace!("Watchdog disarmed before deadline");
                    }
                }
            });

        match spawned {
            Ok(handle) => Self {
                wake: Some(wake),
                handle: Some(handle),
            },
            Err(e) => {
                // Without a timer the only safe choice is to stop right away;
                // both engines still return a legal move.
                warn!(error = %e, "Failed to spawn watchdog thread, cancelling search");
                token.cancel();
                Self {
                    wake: None,
                    handle: None,
                }
            }
        }
    }

    /// Stop the timer early without cancelling the token.
    pub fn disarm(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(wake) = self.wake.take() {
            let _ = wake.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.shutdown();
    }
}

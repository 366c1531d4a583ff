//! Cancelable retry timers for Confgate.
//!
//! The authentication layer keeps at most one "wait for owner" timer alive
//! at a time. This crate provides the seam it arms timers through
//! ([`RetryScheduler`]) and the Tokio-backed implementation used at
//! runtime ([`TokioRetryScheduler`]).
//!
//! # Integration
//!
//! A fired timer doesn't run anything itself: it sends its
//! [`RetryHandle`] back on a channel. The owner of the state machine
//! selects on that channel next to its event channel, so the retry action
//! runs on the same task as every other transition:
//!
//! ```ignore
//! let (scheduler, mut fired_rx) = TokioRetryScheduler::channel(RetryConfig::default());
//! loop {
//!     tokio::select! {
//!         Some(event) = events_rx.recv() => { /* dispatch */ }
//!         Some(handle) = fired_rx.recv() => { /* dispatch RetryTimerFired(handle) */ }
//!     }
//! }
//! ```

mod error;

use std::collections::HashMap;
use std::time::Duration;

use confgate_protocol::RetryHandle;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

pub use error::RetryError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the Tokio-backed scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Random extra delay (0–max ms) added to every timer so clients
    /// waiting on the same room don't retry in lockstep.
    /// Default: 0, i.e. timers fire exactly after the requested delay.
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { jitter_ms: 0 }
    }
}

impl RetryConfig {
    /// Maximum supported jitter.
    pub const MAX_JITTER_MS: u64 = 60_000;

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TokioRetryScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.jitter_ms > Self::MAX_JITTER_MS {
            warn!(
                jitter_ms = self.jitter_ms,
                max = Self::MAX_JITTER_MS,
                "jitter_ms exceeds maximum, clamping"
            );
            self.jitter_ms = Self::MAX_JITTER_MS;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Scheduler seam
// ---------------------------------------------------------------------------

/// Arms and disarms deferred retry callbacks.
///
/// Implementations deliver a fire by getting `handle` back to whoever owns
/// the state machine. They do not need to guarantee that a cancelled timer
/// never fires: the state machine ignores fires for handles it no longer
/// holds. They do need to make [`cancel`](Self::cancel) idempotent.
pub trait RetryScheduler: Send + 'static {
    /// Arms a timer that fires `handle` after `delay`.
    fn schedule(
        &mut self,
        handle: RetryHandle,
        delay: Duration,
    ) -> Result<(), RetryError>;

    /// Disarms the timer for `handle`. A no-op for unknown, fired, or
    /// already cancelled handles.
    fn cancel(&mut self, handle: RetryHandle);
}

// ---------------------------------------------------------------------------
// Tokio scheduler
// ---------------------------------------------------------------------------

/// Runs each timer as a Tokio task that sleeps and then sends its handle.
pub struct TokioRetryScheduler {
    config: RetryConfig,
    fired: mpsc::UnboundedSender<RetryHandle>,
    timers: HashMap<RetryHandle, JoinHandle<()>>,
}

impl TokioRetryScheduler {
    /// Creates a scheduler that reports fires on `fired`.
    pub fn new(
        config: RetryConfig,
        fired: mpsc::UnboundedSender<RetryHandle>,
    ) -> Self {
        Self {
            config: config.validated(),
            fired,
            timers: HashMap::new(),
        }
    }

    /// Creates a scheduler together with the receiving end of its fire
    /// channel.
    pub fn channel(
        config: RetryConfig,
    ) -> (Self, mpsc::UnboundedReceiver<RetryHandle>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(config, tx), rx)
    }

    /// Number of timers that are armed and have not fired yet.
    pub fn pending(&self) -> usize {
        self.timers.values().filter(|t| !t.is_finished()).count()
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.config.jitter_ms == 0 {
            return delay;
        }
        let ms = rand::rng().random_range(0..=self.config.jitter_ms);
        delay.saturating_add(Duration::from_millis(ms))
    }
}

impl RetryScheduler for TokioRetryScheduler {
    fn schedule(
        &mut self,
        handle: RetryHandle,
        delay: Duration,
    ) -> Result<(), RetryError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| RetryError::NoRuntime(handle))?;

        // Fired timers are never cancelled explicitly, drop their entries
        // here so the map doesn't grow with every cycle.
        self.timers.retain(|_, t| !t.is_finished());

        let delay = self.jittered(delay);
        let fired = self.fired.clone();
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            trace!(%handle, "retry timer fired");
            if fired.send(handle).is_err() {
                debug!(%handle, "retry fire dropped, receiver gone");
            }
        });

        if let Some(previous) = self.timers.insert(handle, task) {
            previous.abort();
        }
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        debug!(%handle, delay_ms, "retry timer armed");
        Ok(())
    }

    fn cancel(&mut self, handle: RetryHandle) {
        if let Some(task) = self.timers.remove(&handle) {
            task.abort();
            debug!(%handle, "retry timer cancelled");
        }
    }
}

impl Drop for TokioRetryScheduler {
    fn drop(&mut self) {
        for (_, task) in self.timers.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_no_jitter() {
        assert_eq!(RetryConfig::default().jitter_ms, 0);
    }

    #[test]
    fn test_validated_clamps_jitter() {
        let cfg = RetryConfig { jitter_ms: 10 * RetryConfig::MAX_JITTER_MS }
            .validated();
        assert_eq!(cfg.jitter_ms, RetryConfig::MAX_JITTER_MS);
    }

    #[test]
    fn test_schedule_without_runtime_returns_error() {
        let (mut s, _rx) = TokioRetryScheduler::channel(RetryConfig::default());

        let result = s.schedule(RetryHandle(1), Duration::from_secs(1));

        assert!(matches!(result, Err(RetryError::NoRuntime(RetryHandle(1)))));
        assert_eq!(s.pending(), 0);
    }
}

//! Reconnection supervisor.
//!
//! ```text
//!            connected                 unexpected close
//!   Idle ───────────────▶ Active ─────────────────────────▶ RetryScheduled
//!    ▲                      ▲                                  │   │
//!    │                      └──────── retry succeeded ─────────┘   │ retry failed
//!    │                                                             │ (re-arm)
//!    └──────────────── disconnect() from any state ◀───────────────┘
//! ```
//!
//! At most one retry timer is armed at a time. Each arm bumps an epoch; a
//! timer whose epoch is no longer current when it fires does nothing.

use std::sync::Arc;
use std::time::Duration;

use mmsp_core::ConnectionConfig;
use tokio::task::JoinHandle;
use tracing::debug;

/// Fixed delay between reconnection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Where the supervisor is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SupervisorState {
    /// No connection to maintain.
    #[default]
    Idle,
    /// A connection is up and will be restored if it drops.
    Active,
    /// The connection dropped; a retry timer is armed.
    RetryScheduled,
}

/// Tracks whether a dropped connection should be restored, and owns the
/// retry timer.
#[derive(Debug)]
pub struct ReconnectSupervisor {
    state: SupervisorState,
    delay: Duration,
    target: Option<Arc<ConnectionConfig>>,
    timer: Option<JoinHandle<()>>,
    epoch: u64,
    failed_retries: u32,
}

impl ReconnectSupervisor {
    /// Idle supervisor retrying every `delay`.
    pub fn new(delay: Duration) -> Self {
        Self {
            state: SupervisorState::Idle,
            delay,
            target: None,
            timer: None,
            epoch: 0,
            failed_retries: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Retry delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Endpoint being maintained.
    pub fn target(&self) -> Option<&Arc<ConnectionConfig>> {
        self.target.as_ref()
    }

    /// Consecutive retries that failed since the last successful connect.
    pub fn failed_retries(&self) -> u32 {
        self.failed_retries
    }

    /// Whether a retry timer is armed.
    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// A connection to `config` is up.
    pub fn on_connected(&mut self, config: Arc<ConnectionConfig>) {
        self.cancel_timer();
        self.target = Some(config);
        self.state = SupervisorState::Active;
        self.failed_retries = 0;
    }

    /// The connection dropped without `disconnect()`. Returns `true` when a
    /// retry should be armed.
    pub fn on_unexpected_close(&mut self) -> bool {
        if self.state != SupervisorState::Active {
            return false;
        }
        self.state = SupervisorState::RetryScheduled;
        true
    }

    /// A retry attempt failed. Returns `true` when another retry should be
    /// armed.
    pub fn on_retry_failed(&mut self) -> bool {
        if self.state != SupervisorState::RetryScheduled {
            return false;
        }
        self.failed_retries = self.failed_retries.saturating_add(1);
        true
    }

    /// Arm the retry timer built by `spawn_timer`, which receives the epoch
    /// it must present to [`claim`](Self::claim). Replaces (and aborts) any
    /// previously armed timer.
    pub fn arm(&mut self, spawn_timer: impl FnOnce(u64) -> JoinHandle<()>) {
        self.epoch += 1;
        let timer = spawn_timer(self.epoch);
        if let Some(previous) = self.timer.replace(timer) {
            previous.abort();
        }
        debug!(epoch = self.epoch, delay_ms = self.delay.as_millis() as u64, "retry armed");
    }

    /// Called by a timer when it fires. Returns the endpoint to reconnect to
    /// if the timer is still current and a retry is still wanted.
    pub fn claim(&mut self, epoch: u64) -> Option<Arc<ConnectionConfig>> {
        if epoch != self.epoch || self.state != SupervisorState::RetryScheduled {
            return None;
        }
        // The firing task is the timer itself: forget it rather than abort.
        let _ = self.timer.take();
        self.target.clone()
    }

    /// Stop supervising: cancel any armed timer and forget the target.
    pub fn stop(&mut self) {
        self.cancel_timer();
        self.state = SupervisorState::Idle;
        self.target = None;
        self.failed_retries = 0;
    }

    fn cancel_timer(&mut self) {
        self.epoch += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
            debug!("retry timer cancelled");
        }
    }
}

impl Default for ReconnectSupervisor {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_DELAY)
    }
}

impl Drop for ReconnectSupervisor {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

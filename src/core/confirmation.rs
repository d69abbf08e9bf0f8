// Temporal confirmation - turns a flickering per-frame signal into a stable verdict

use crate::models::monitor::{GripState, Verdict};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A grip must be held longer than this to be confirmed
pub const CONFIRMATION_THRESHOLD_MS: u64 = 850;

impl GripState {
    /// Apply one frame's momentary signal.
    ///
    /// Any frame with `momentary == false` resets the episode; there is no
    /// tolerance for brief dropouts.
    pub fn advance(self, momentary: bool, now_ms: u64) -> GripState {
        match (self.is_currently_gripping, momentary) {
            (_, false) => GripState::default(),
            (false, true) => GripState {
                is_currently_gripping: true,
                grip_started_at: Some(now_ms),
                elapsed_ms: 0,
            },
            (true, true) => {
                let started = self.grip_started_at.unwrap_or(now_ms);
                GripState {
                    elapsed_ms: now_ms.saturating_sub(started),
                    ..self
                }
            }
        }
    }

    pub fn verdict(&self) -> Verdict {
        if !self.is_currently_gripping {
            Verdict::Idle
        } else if self.elapsed_ms > CONFIRMATION_THRESHOLD_MS {
            Verdict::Confirmed
        } else {
            Verdict::Analyzing
        }
    }
}

/// Owns the single `GripState` of a monitored stream
#[derive(Debug, Clone, Default)]
pub struct ConfirmationTracker {
    state: GripState,
}

impl ConfirmationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, momentary: bool, now_ms: u64) -> Verdict {
        self.state = self.state.advance(momentary, now_ms);
        self.state.verdict()
    }

    pub fn state(&self) -> GripState {
        self.state
    }

    pub fn verdict(&self) -> Verdict {
        self.state.verdict()
    }

    pub fn reset(&mut self) {
        self.state = GripState::default();
    }
}

// ==============================================================================
// Clock
// ==============================================================================

/// Monotonic millisecond source, read once per frame
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Milliseconds since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock for replays and tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Moves forward to `now_ms`; earlier values are ignored.
    pub fn set(&self, now_ms: u64) {
        self.now.fetch_max(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

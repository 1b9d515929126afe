//! Turn boundary detection.
//!
//! Decides when a caller has finished speaking, under one of two policies:
//!
//! - **Explicit stop**: the telephony provider's stop frame is the boundary.
//!   Simple, but conflates "utterance done" with "call media paused", so it
//!   cannot drive continuous multi-turn calls on providers that only send
//!   stop at stream end.
//! - **Silence timeout**: a recurring check fires the boundary once audio has
//!   been appended and the gap since the last chunk exceeds a fixed
//!   threshold. Tolerates continuous streaming, at the cost of a fixed
//!   threshold delay before every response. The threshold and poll interval
//!   are configuration, never computed adaptively.
//!
//! The detector is pure state over [`Instant`]s; the recurring check itself
//! is driven by the session's select loop, and dies with it.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::{TurnConfig, TurnPolicyKind};

/// Turn segmentation policy, with its tuning resolved to durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPolicy {
    /// The provider's explicit stop frame ends the turn
    ExplicitStop,
    /// A silence gap of at least `silence` ends the turn
    SilenceTimeout {
        /// Minimum gap since the last audio chunk
        silence: Duration,
    },
}

impl TurnPolicy {
    /// Resolve configuration into a policy.
    pub fn from_config(config: &TurnConfig) -> Self {
        match config.policy {
            TurnPolicyKind::ExplicitStop => Self::ExplicitStop,
            TurnPolicyKind::SilenceTimeout => Self::SilenceTimeout {
                silence: Duration::from_millis(config.silence_ms),
            },
        }
    }
}

/// Per-session turn boundary state: last audio arrival plus whether any audio
/// has been appended since the last flush.
#[derive(Debug)]
pub struct TurnDetector {
    policy: TurnPolicy,
    /// Arrival time of the most recent audio chunk; monotonically
    /// non-decreasing for the lifetime of the session
    last_audio: Option<Instant>,
    /// Audio appended since the last boundary
    unflushed: bool,
}

impl TurnDetector {
    pub fn new(policy: TurnPolicy) -> Self {
        Self {
            policy,
            last_audio: None,
            unflushed: false,
        }
    }

    pub fn policy(&self) -> TurnPolicy {
        self.policy
    }

    /// Whether audio is waiting to be flushed at the next boundary.
    pub fn has_unflushed_audio(&self) -> bool {
        self.unflushed
    }

    /// Record an audio chunk arrival. `appended` is whether the chunk made it
    /// onto the AI leg; chunks dropped before readiness advance the arrival
    /// clock but do not arm a boundary (there is nothing to commit).
    pub fn record_audio(&mut self, now: Instant, appended: bool) {
        match self.last_audio {
            Some(last) if last > now => {}
            _ => self.last_audio = Some(now),
        }
        if appended {
            self.unflushed = true;
        }
    }

    /// Recurring silence check. Returns `true` exactly when a boundary
    /// fires: unflushed audio exists and the gap since the last arrival
    /// meets the threshold. A poll with nothing unflushed is a no-op, so a
    /// single gap yields a single boundary no matter how many polls see it.
    pub fn poll(&mut self, now: Instant) -> bool {
        let TurnPolicy::SilenceTimeout { silence } = self.policy else {
            return false;
        };
        if !self.unflushed {
            return false;
        }
        let Some(last) = self.last_audio else {
            return false;
        };
        if now.duration_since(last) >= silence {
            // Leave the timestamp untouched; it only advances on new audio
            self.unflushed = false;
            true
        } else {
            false
        }
    }

    /// Explicit stop frame from the provider. Returns `true` (boundary) only
    /// under the explicit-stop policy; under silence timeout a stop frame
    /// means the stream ended, and no response is forced.
    pub fn on_stop(&mut self) -> bool {
        match self.policy {
            TurnPolicy::ExplicitStop => {
                self.unflushed = false;
                true
            }
            TurnPolicy::SilenceTimeout { .. } => false,
        }
    }
}

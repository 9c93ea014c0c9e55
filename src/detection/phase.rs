// src/detection/phase.rs
//! Phase states and transition events

use crate::detection::result::SessionResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Detector progress through one test session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseState {
    AwaitingStability,
    Ready,
    MotionInitiated,
    ExtremumTracking,
    Returning,
    Completed,
}

impl PhaseState {
    /// Position in the forward ordering of phases
    pub fn ordinal(&self) -> u8 {
        match self {
            PhaseState::AwaitingStability => 0,
            PhaseState::Ready => 1,
            PhaseState::MotionInitiated => 2,
            PhaseState::ExtremumTracking => 3,
            PhaseState::Returning => 4,
            PhaseState::Completed => 5,
        }
    }

    /// Successor phase, `None` from the terminal phase
    pub fn next(&self) -> Option<PhaseState> {
        match self {
            PhaseState::AwaitingStability => Some(PhaseState::Ready),
            PhaseState::Ready => Some(PhaseState::MotionInitiated),
            PhaseState::MotionInitiated => Some(PhaseState::ExtremumTracking),
            PhaseState::ExtremumTracking => Some(PhaseState::Returning),
            PhaseState::Returning => Some(PhaseState::Completed),
            PhaseState::Completed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PhaseState::Completed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PhaseState::AwaitingStability => "Awaiting Stability",
            PhaseState::Ready => "Ready",
            PhaseState::MotionInitiated => "Motion Initiated",
            PhaseState::ExtremumTracking => "Extremum Tracking",
            PhaseState::Returning => "Returning",
            PhaseState::Completed => "Completed",
        }
    }
}

impl Default for PhaseState {
    fn default() -> Self {
        PhaseState::AwaitingStability
    }
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a session went back to `AwaitingStability`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetReason {
    /// Extremum never exceeded zero before the subject returned
    InvalidSession,
    /// A phase lasted longer than the configured frame limit
    PhaseTimeout,
    /// Explicit request from the operator
    Operator,
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetReason::InvalidSession => write!(f, "invalid session"),
            ResetReason::PhaseTimeout => write!(f, "phase timeout"),
            ResetReason::Operator => write!(f, "operator request"),
        }
    }
}

/// Event surfaced by `observe()`, at most one per frame
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseTransitionEvent {
    /// Forward step between two non-terminal phases
    Advanced {
        from: PhaseState,
        to: PhaseState,
        frame_index: u64,
    },
    /// Session reached `Completed`
    Completed {
        from: PhaseState,
        result: SessionResult,
    },
    /// Session went back to `AwaitingStability`
    Reset {
        from: PhaseState,
        reason: ResetReason,
        frame_index: u64,
    },
}

impl PhaseTransitionEvent {
    /// Phase the detector is in after this event
    pub fn target(&self) -> PhaseState {
        match self {
            PhaseTransitionEvent::Advanced { to, .. } => *to,
            PhaseTransitionEvent::Completed { .. } => PhaseState::Completed,
            PhaseTransitionEvent::Reset { .. } => PhaseState::AwaitingStability,
        }
    }

    pub fn source(&self) -> PhaseState {
        match self {
            PhaseTransitionEvent::Advanced { from, .. }
            | PhaseTransitionEvent::Completed { from, .. }
            | PhaseTransitionEvent::Reset { from, .. } => *from,
        }
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, PhaseTransitionEvent::Reset { .. })
    }
}

// Data models for phone-grip verdicts, per-frame reports and session statistics

use crate::models::landmarks::HandLandmarkSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Verdict
// ==============================================================================

/// Debounced per-frame outcome of the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Idle,
    Analyzing,
    Confirmed,
}

impl Verdict {
    pub fn to_string(&self) -> &'static str {
        match self {
            Verdict::Idle => "idle",
            Verdict::Analyzing => "analyzing",
            Verdict::Confirmed => "confirmed",
        }
    }
}

/// Which arms are raised into a phone-viewing posture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmPosture {
    None,
    LeftArm,
    RightArm,
    Both,
}

impl ArmPosture {
    pub fn from_arms(left: bool, right: bool) -> Self {
        match (left, right) {
            (true, true) => ArmPosture::Both,
            (true, false) => ArmPosture::LeftArm,
            (false, true) => ArmPosture::RightArm,
            (false, false) => ArmPosture::None,
        }
    }

    pub fn left(&self) -> bool {
        matches!(self, ArmPosture::LeftArm | ArmPosture::Both)
    }

    pub fn right(&self) -> bool {
        matches!(self, ArmPosture::RightArm | ArmPosture::Both)
    }

    pub fn any(&self) -> bool {
        !matches!(self, ArmPosture::None)
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            ArmPosture::None => "none",
            ArmPosture::LeftArm => "left_arm",
            ArmPosture::RightArm => "right_arm",
            ArmPosture::Both => "both",
        }
    }
}

// ==============================================================================
// Grip State (owned by the confirmation tracker)
// ==============================================================================

/// Timer state for the current gripping episode.
///
/// `elapsed_ms` only means something while `is_currently_gripping` is set;
/// both it and `grip_started_at` are cleared as soon as the momentary signal drops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GripState {
    pub is_currently_gripping: bool,
    pub grip_started_at: Option<u64>, // Monotonic clock, milliseconds
    pub elapsed_ms: u64,
}

// ==============================================================================
// Frame Report
// ==============================================================================

/// Everything a renderer needs for one evaluated frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub timestamp_ms: u64,
    pub verdict: Verdict,
    pub posture: ArmPosture,
    pub gripping_hands: Vec<HandLandmarkSet>,
    pub elapsed_ms: u64,
    pub body_detected: bool,
}

/// Result of driving the orchestrator with one captured frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Evaluated(FrameReport),
    /// The provider or camera failed; the tracker was not advanced.
    Skipped(String),
}

impl FrameOutcome {
    pub fn report(&self) -> Option<&FrameReport> {
        match self {
            FrameOutcome::Evaluated(report) => Some(report),
            FrameOutcome::Skipped(_) => None,
        }
    }
}

/// Overlay banner, drawn by an external renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub background: [u8; 3], // RGB
    pub text_color: [u8; 3], // RGB
    pub message: String,
}

// ==============================================================================
// Statistics
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub session_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub frames_evaluated: u64,
    pub frames_skipped: u64,
    pub frames_with_body: u64,
    pub frames_with_posture: u64,
    pub confirmations: u32, // Episodes that reached `confirmed`
    pub longest_grip_ms: u64,
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Monitor not initialized")]
    NotInitialized,

    #[error("Monitor already running")]
    AlreadyRunning,

    #[error("Landmark provider failed: {0}")]
    ProviderFailed(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid landmarks: {0}")]
    InvalidLandmarks(String),

    #[error("Recording error: {0}")]
    Recording(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type MonitorResult<T> = Result<T, MonitorError>;

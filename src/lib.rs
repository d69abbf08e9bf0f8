pub mod core;
pub mod models;
pub mod platform;

pub use crate::core::config::MonitorConfig;
pub use crate::core::confirmation::{
    Clock, ConfirmationTracker, ManualClock, MonotonicClock, CONFIRMATION_THRESHOLD_MS,
};
pub use crate::core::grip::classify_grip;
pub use crate::core::orchestrator::FrameOrchestrator;
pub use crate::core::posture::classify_posture;
pub use crate::core::session::{run_capture_loop, MonitorSession};
pub use crate::models::monitor::{
    ArmPosture, Banner, FrameOutcome, FrameReport, GripState, MonitorError, MonitorResult,
    SessionStatistics, Verdict,
};

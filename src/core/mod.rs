pub mod config;

// Per-frame classification
pub mod posture;
pub mod grip;
pub mod confirmation;
pub mod orchestrator;
pub mod overlay;

// Background monitoring
pub mod session;

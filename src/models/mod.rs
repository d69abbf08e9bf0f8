// Data models for camera capture, landmarks, verdicts and monitor errors

pub mod capture;
pub mod landmarks;
pub mod monitor;

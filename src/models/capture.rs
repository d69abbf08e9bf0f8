// Data structures for webcam capture

use serde::{Deserialize, Serialize};

/// A video device that can be opened for capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    pub index: u32,
    pub name: String,
    pub path: Option<String>, // e.g. /dev/video0
}

impl CameraDevice {
    pub fn default_camera() -> Self {
        Self {
            index: 0,
            name: "Default camera (0)".to_string(),
            path: None,
        }
    }
}

/// A captured frame from the camera
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub timestamp_ms: u64, // Monotonic capture time
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub format: PixelFormat,
}

impl RawFrame {
    /// Frame with no pixel data, for providers that ignore the image
    pub fn empty(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            width: 0,
            height: 0,
            data: Vec::new(),
            format: PixelFormat::RGB8,
        }
    }
}

/// Pixel format of captured frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    RGB8,
    BGR8,
    RGBA8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::RGB8 | PixelFormat::BGR8 => 3,
            PixelFormat::RGBA8 => 4,
        }
    }
}

/// Error types for camera capture operations
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Camera not found: {0}")]
    DeviceNotFound(u32),

    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("Camera returned an empty frame")]
    EmptyFrame,

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

pub type CaptureResult<T> = Result<T, CaptureError>;

// Webcam discovery and frame sources
// Capture backends live outside this crate; they plug in through `FrameSource`.

use crate::models::capture::{CameraDevice, CaptureError, CaptureResult, PixelFormat, RawFrame};
use async_trait::async_trait;
use image::{ImageBuffer, Rgb, Rgba};
use std::path::Path;
use tracing::debug;

/// Platform-agnostic camera trait
#[async_trait]
pub trait FrameSource: Send {
    /// Grab the next frame. Errors skip the frame; they do not end the session.
    async fn read_frame(&mut self) -> CaptureResult<RawFrame>;

    /// The device this source reads from
    fn device(&self) -> &CameraDevice;
}

/// List V4L2-style devices (`video<N>`) under `dev_dir`, sorted by index.
///
/// Falls back to a single default camera 0 when nothing is found, so a
/// selector always has an entry.
pub fn scan_cameras(dev_dir: &Path) -> Vec<CameraDevice> {
    let mut devices: Vec<CameraDevice> = match std::fs::read_dir(dev_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let index = name.strip_prefix("video")?.parse::<u32>().ok()?;
                let path = entry.path().display().to_string();
                Some(CameraDevice {
                    index,
                    name: format!("Camera {} ({})", index, path),
                    path: Some(path),
                })
            })
            .collect(),
        Err(e) => {
            debug!("Could not read {}: {}", dev_dir.display(), e);
            Vec::new()
        }
    };

    if devices.is_empty() {
        return vec![CameraDevice::default_camera()];
    }

    devices.sort_by_key(|device| device.index);
    devices
}

/// Flip a frame horizontally so a front camera behaves like a mirror
pub fn mirror_frame(frame: &RawFrame) -> CaptureResult<RawFrame> {
    let expected = frame.width as usize * frame.height as usize * frame.format.bytes_per_pixel();
    if frame.data.len() != expected {
        return Err(CaptureError::InvalidFrame(format!(
            "{}x{} {:?} frame needs {} bytes, got {}",
            frame.width,
            frame.height,
            frame.format,
            expected,
            frame.data.len()
        )));
    }

    let data = match frame.format {
        // Channel order does not matter for a horizontal flip
        PixelFormat::RGB8 | PixelFormat::BGR8 => {
            let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                ImageBuffer::from_raw(frame.width, frame.height, frame.data.clone())
                    .ok_or(CaptureError::EmptyFrame)?;
            image::imageops::flip_horizontal(&buffer).into_raw()
        }
        PixelFormat::RGBA8 => {
            let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                ImageBuffer::from_raw(frame.width, frame.height, frame.data.clone())
                    .ok_or(CaptureError::EmptyFrame)?;
            image::imageops::flip_horizontal(&buffer).into_raw()
        }
    };

    Ok(RawFrame {
        data,
        ..frame.clone()
    })
}

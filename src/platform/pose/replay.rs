// Landmark recordings - JSON Lines captures of provider output that can be
// played back through the monitor without a camera or ML backend

use super::mediapipe_bridge::{LandmarkProvider, ProviderOptions, ProviderPayload};
use crate::models::capture::RawFrame;
use crate::models::landmarks::LandmarkObservation;
use crate::models::monitor::{MonitorError, MonitorResult};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

/// One line of a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub timestamp_ms: u64,
    /// Capture or provider failure on this frame
    #[serde(default)]
    pub dropped: bool,
    #[serde(flatten)]
    pub payload: ProviderPayload,
}

/// Parse a JSON Lines recording; blank lines and `#` comments are skipped
pub fn parse_recording<R: BufRead>(reader: R) -> MonitorResult<Vec<RecordedFrame>> {
    let mut frames = Vec::new();
    let mut last_timestamp = 0;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let frame: RecordedFrame = serde_json::from_str(trimmed)
            .map_err(|e| MonitorError::Recording(format!("line {}: {}", line_no + 1, e)))?;

        if frame.timestamp_ms < last_timestamp {
            return Err(MonitorError::Recording(format!(
                "line {}: timestamp {} goes backwards (previous {})",
                line_no + 1,
                frame.timestamp_ms,
                last_timestamp
            )));
        }
        last_timestamp = frame.timestamp_ms;
        frames.push(frame);
    }

    Ok(frames)
}

pub fn load_recording(path: &Path) -> MonitorResult<Vec<RecordedFrame>> {
    let file = std::fs::File::open(path)?;
    parse_recording(std::io::BufReader::new(file))
}

/// Serves recorded observations one per `infer` call, ignoring the frame pixels
pub struct ReplayProvider {
    frames: VecDeque<RecordedFrame>,
    options: ProviderOptions,
    open: bool,
}

impl ReplayProvider {
    pub fn new(frames: Vec<RecordedFrame>, options: &ProviderOptions) -> MonitorResult<Self> {
        options.validate()?;
        Ok(Self {
            frames: frames.into(),
            options: options.clone(),
            open: true,
        })
    }

    /// Factory that restarts the same recording on every (re)build
    pub fn factory(frames: Arc<Vec<RecordedFrame>>) -> super::ProviderFactory {
        Box::new(move |options: &ProviderOptions| -> MonitorResult<Box<dyn LandmarkProvider>> {
            Ok(Box::new(ReplayProvider::new(frames.as_ref().clone(), options)?))
        })
    }

    /// Capture time of the next frame, if any remain
    pub fn peek_timestamp(&self) -> Option<u64> {
        self.frames.front().map(|frame| frame.timestamp_ms)
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkProvider for ReplayProvider {
    fn infer(&mut self, _frame: &RawFrame) -> MonitorResult<LandmarkObservation> {
        if !self.open {
            return Err(MonitorError::NotInitialized);
        }

        let frame = self
            .frames
            .pop_front()
            .ok_or_else(|| MonitorError::ProviderFailed("recording exhausted".to_string()))?;

        if frame.dropped {
            return Err(MonitorError::ProviderFailed(format!(
                "frame at {} ms was dropped",
                frame.timestamp_ms
            )));
        }

        frame.payload.into_observation(self.options.max_num_hands)
    }

    fn close(&mut self) {
        self.open = false;
        self.frames.clear();
    }

    fn is_initialized(&self) -> bool {
        self.open
    }

    fn options(&self) -> &ProviderOptions {
        &self.options
    }

    fn describe(&self) -> String {
        format!("Replay provider ({} frames remaining)", self.frames.len())
    }
}

// Overlay banner selection for an external renderer

use crate::models::monitor::{Banner, FrameReport, Verdict};

const ORANGE: [u8; 3] = [255, 165, 0];
const YELLOW: [u8; 3] = [255, 255, 0];
const RED: [u8; 3] = [255, 0, 0];
const WHITE: [u8; 3] = [255, 255, 255];
const BLACK: [u8; 3] = [0, 0, 0];

/// One more loading dot every 200 ms, cycling through 0-3
const DOT_PERIOD_MS: u64 = 200;

impl FrameReport {
    /// Banner for this frame, or `None` when nothing suspicious is happening
    pub fn banner(&self) -> Option<Banner> {
        match self.verdict {
            Verdict::Confirmed => Some(Banner {
                background: RED,
                text_color: WHITE,
                message: "PHONE IN HAND CONFIRMED!".to_string(),
            }),
            Verdict::Analyzing => {
                let dots = ".".repeat(((self.elapsed_ms / DOT_PERIOD_MS) % 4) as usize);
                Some(Banner {
                    background: YELLOW,
                    text_color: BLACK,
                    message: format!("ANALYZING GRIP{}", dots),
                })
            }
            Verdict::Idle if self.posture.any() => Some(Banner {
                background: ORANGE,
                text_color: WHITE,
                message: "SUSPICIOUS POSTURE...".to_string(),
            }),
            Verdict::Idle => None,
        }
    }
}

// Grip classification - decides whether a hand is wrapped around an object

use crate::models::landmarks::{Finger, HandJoint, HandLandmarkSet};
use serde::{Deserialize, Serialize};

/// Tip-to-knuckle distance below which a finger counts as wrapped around something.
/// An open hand sits around 0.15+ in normalized coordinates.
pub const CURL_DISTANCE: f32 = 0.12;

/// Intermediate signals behind a grip decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GripDetails {
    pub curled_fingers: u8, // 0-4, thumb excluded
    pub thumb_extended: bool,
}

impl GripDetails {
    /// Two curled fingers are trusted on their own; a single one needs the
    /// thumb braced upward, so a flat palm facing the camera never passes.
    pub fn is_grip(&self) -> bool {
        self.curled_fingers >= 2 || (self.curled_fingers >= 1 && self.thumb_extended)
    }
}

pub fn grip_details(hand: &HandLandmarkSet) -> GripDetails {
    let curled_fingers = Finger::ALL
        .into_iter()
        .filter(|&finger| finger_is_curled(hand, finger))
        .count() as u8;

    let thumb_extended = hand.get(HandJoint::ThumbTip).y < hand.get(HandJoint::ThumbMcp).y;

    GripDetails {
        curled_fingers,
        thumb_extended,
    }
}

pub fn classify_grip(hand: &HandLandmarkSet) -> bool {
    grip_details(hand).is_grip()
}

fn finger_is_curled(hand: &HandLandmarkSet, finger: Finger) -> bool {
    let tip = hand.get(finger.tip());
    let pip = hand.get(finger.pip());
    let mcp = hand.get(finger.mcp());

    let folded_down = tip.y > pip.y;
    let curled_around = tip.distance_xy(mcp) < CURL_DISTANCE;

    folded_down || curled_around
}

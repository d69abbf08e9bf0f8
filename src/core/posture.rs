// Posture classification - detects an arm raised to look at a held object

use crate::models::landmarks::{BodyJoint, BodyLandmarkSet};
use crate::models::monitor::ArmPosture;

/// Minimum visibility for shoulder, elbow and wrist of an arm
pub const VISIBILITY_THRESHOLD: f32 = 0.5;

/// Maximum vertical wrist-to-nose distance (head/chest band)
pub const MAX_WRIST_NOSE_DY: f32 = 0.55;

/// Maximum horizontal wrist-to-nose distance (near the body centerline)
pub const MAX_WRIST_NOSE_DX: f32 = 0.45;

#[derive(Debug, Clone, Copy)]
struct Arm {
    shoulder: BodyJoint,
    elbow: BodyJoint,
    wrist: BodyJoint,
}

const LEFT_ARM: Arm = Arm {
    shoulder: BodyJoint::LeftShoulder,
    elbow: BodyJoint::LeftElbow,
    wrist: BodyJoint::LeftWrist,
};

const RIGHT_ARM: Arm = Arm {
    shoulder: BodyJoint::RightShoulder,
    elbow: BodyJoint::RightElbow,
    wrist: BodyJoint::RightWrist,
};

/// Report which arms are held in a phone-viewing posture.
///
/// An arm whose shoulder, elbow or wrist is not visible is treated as not
/// raised. Coordinates use image convention, so a smaller `y` is higher up.
pub fn classify_posture(body: &BodyLandmarkSet) -> ArmPosture {
    ArmPosture::from_arms(arm_is_viewing(body, LEFT_ARM), arm_is_viewing(body, RIGHT_ARM))
}

fn arm_is_viewing(body: &BodyLandmarkSet, arm: Arm) -> bool {
    let shoulder = body.get(arm.shoulder);
    let elbow = body.get(arm.elbow);
    let wrist = body.get(arm.wrist);

    if !(wrist.is_visible(VISIBILITY_THRESHOLD)
        && elbow.is_visible(VISIBILITY_THRESHOLD)
        && shoulder.is_visible(VISIBILITY_THRESHOLD))
    {
        return false;
    }

    // Forearm angled up from a dropped upper arm; rules out reaching overhead
    if !(wrist.y < elbow.y && elbow.y > shoulder.y) {
        return false;
    }

    let nose = body.get(BodyJoint::Nose);
    (wrist.y - nose.y).abs() < MAX_WRIST_NOSE_DY && (wrist.x - nose.x).abs() < MAX_WRIST_NOSE_DX
}

// Data models for body and hand landmarks consumed by the phone monitor

use crate::models::monitor::{MonitorError, MonitorResult};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Shared: Landmark
// ==============================================================================

/// A single keypoint reported by the landmark provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32, // Normalized [0, 1], origin at the left edge
    pub y: f32, // Normalized [0, 1], grows downward
    #[serde(default)]
    pub z: f32, // Provider depth, unused by the classifiers
    /// Confidence [0, 1]. A recording without it reads as not visible.
    #[serde(default)]
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility,
        }
    }

    /// Strictly above the threshold; a score equal to it is not visible.
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility > threshold
    }

    /// Euclidean distance in the normalized image plane
    pub fn distance_xy(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ==============================================================================
// Body joints
// ==============================================================================

/// Body joints the posture classifier reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyJoint {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
}

impl BodyJoint {
    pub const COUNT: usize = 7;

    pub const ALL: [BodyJoint; Self::COUNT] = [
        BodyJoint::Nose,
        BodyJoint::LeftShoulder,
        BodyJoint::RightShoulder,
        BodyJoint::LeftElbow,
        BodyJoint::RightElbow,
        BodyJoint::LeftWrist,
        BodyJoint::RightWrist,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    /// Index of this joint in the MediaPipe Pose 33-landmark layout
    pub fn mediapipe_index(self) -> usize {
        match self {
            BodyJoint::Nose => 0,
            BodyJoint::LeftShoulder => 11,
            BodyJoint::RightShoulder => 12,
            BodyJoint::LeftElbow => 13,
            BodyJoint::RightElbow => 14,
            BodyJoint::LeftWrist => 15,
            BodyJoint::RightWrist => 16,
        }
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            BodyJoint::Nose => "nose",
            BodyJoint::LeftShoulder => "left_shoulder",
            BodyJoint::RightShoulder => "right_shoulder",
            BodyJoint::LeftElbow => "left_elbow",
            BodyJoint::RightElbow => "right_elbow",
            BodyJoint::LeftWrist => "left_wrist",
            BodyJoint::RightWrist => "right_wrist",
        }
    }
}

/// Body pose for a single person, one landmark per `BodyJoint`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyLandmarkSet {
    landmarks: [Landmark; BodyJoint::COUNT],
}

impl BodyLandmarkSet {
    /// Every joint starts at the same landmark; use `with` to place joints.
    pub fn uniform(landmark: Landmark) -> Self {
        Self {
            landmarks: [landmark; BodyJoint::COUNT],
        }
    }

    pub fn with(mut self, joint: BodyJoint, landmark: Landmark) -> Self {
        self.set(joint, landmark);
        self
    }

    pub fn set(&mut self, joint: BodyJoint, landmark: Landmark) {
        self.landmarks[joint.slot()] = landmark;
    }

    pub fn get(&self, joint: BodyJoint) -> &Landmark {
        &self.landmarks[joint.slot()]
    }

    /// Adapter from the provider's MediaPipe-ordered keypoint list
    pub fn from_mediapipe(keypoints: &[Landmark]) -> MonitorResult<Self> {
        let mut set = Self::uniform(Landmark::new(0.0, 0.0, 0.0));
        for joint in BodyJoint::ALL {
            let landmark = keypoints.get(joint.mediapipe_index()).ok_or_else(|| {
                MonitorError::InvalidLandmarks(format!(
                    "body pose has {} keypoints, missing {} (index {})",
                    keypoints.len(),
                    joint.to_string(),
                    joint.mediapipe_index()
                ))
            })?;
            set.set(joint, *landmark);
        }
        Ok(set)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyJoint, &Landmark)> {
        BodyJoint::ALL.into_iter().map(move |joint| (joint, self.get(joint)))
    }
}

// ==============================================================================
// Hand joints (MediaPipe Hands, 21 keypoints per hand)
// ==============================================================================

/// Non-thumb fingers evaluated by the grip classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    pub fn tip(self) -> HandJoint {
        match self {
            Finger::Index => HandJoint::IndexTip,
            Finger::Middle => HandJoint::MiddleTip,
            Finger::Ring => HandJoint::RingTip,
            Finger::Pinky => HandJoint::PinkyTip,
        }
    }

    pub fn pip(self) -> HandJoint {
        match self {
            Finger::Index => HandJoint::IndexPip,
            Finger::Middle => HandJoint::MiddlePip,
            Finger::Ring => HandJoint::RingPip,
            Finger::Pinky => HandJoint::PinkyPip,
        }
    }

    pub fn mcp(self) -> HandJoint {
        match self {
            Finger::Index => HandJoint::IndexMcp,
            Finger::Middle => HandJoint::MiddleMcp,
            Finger::Ring => HandJoint::RingMcp,
            Finger::Pinky => HandJoint::PinkyMcp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandJoint {
    ThumbMcp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyTip,
}

impl HandJoint {
    pub const COUNT: usize = 14;

    pub const ALL: [HandJoint; Self::COUNT] = [
        HandJoint::ThumbMcp,
        HandJoint::ThumbTip,
        HandJoint::IndexMcp,
        HandJoint::IndexPip,
        HandJoint::IndexTip,
        HandJoint::MiddleMcp,
        HandJoint::MiddlePip,
        HandJoint::MiddleTip,
        HandJoint::RingMcp,
        HandJoint::RingPip,
        HandJoint::RingTip,
        HandJoint::PinkyMcp,
        HandJoint::PinkyPip,
        HandJoint::PinkyTip,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    /// Index of this joint in the MediaPipe Hands 21-landmark layout
    pub fn mediapipe_index(self) -> usize {
        match self {
            HandJoint::ThumbMcp => 2,
            HandJoint::ThumbTip => 4,
            HandJoint::IndexMcp => 5,
            HandJoint::IndexPip => 6,
            HandJoint::IndexTip => 8,
            HandJoint::MiddleMcp => 9,
            HandJoint::MiddlePip => 10,
            HandJoint::MiddleTip => 12,
            HandJoint::RingMcp => 13,
            HandJoint::RingPip => 14,
            HandJoint::RingTip => 16,
            HandJoint::PinkyMcp => 17,
            HandJoint::PinkyPip => 18,
            HandJoint::PinkyTip => 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn to_string(&self) -> &'static str {
        match self {
            Handedness::Left => "left",
            Handedness::Right => "right",
        }
    }
}

/// One detected hand, one landmark per `HandJoint`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarkSet {
    pub handedness: Handedness,
    pub confidence: f32,
    landmarks: [Landmark; HandJoint::COUNT],
}

impl HandLandmarkSet {
    pub fn uniform(handedness: Handedness, landmark: Landmark) -> Self {
        Self {
            handedness,
            confidence: 1.0,
            landmarks: [landmark; HandJoint::COUNT],
        }
    }

    pub fn with(mut self, joint: HandJoint, landmark: Landmark) -> Self {
        self.set(joint, landmark);
        self
    }

    pub fn set(&mut self, joint: HandJoint, landmark: Landmark) {
        self.landmarks[joint.slot()] = landmark;
    }

    pub fn get(&self, joint: HandJoint) -> &Landmark {
        &self.landmarks[joint.slot()]
    }

    /// Adapter from a MediaPipe-ordered 21-keypoint hand
    pub fn from_mediapipe(
        handedness: Handedness,
        confidence: f32,
        keypoints: &[Landmark],
    ) -> MonitorResult<Self> {
        let mut set = Self::uniform(handedness, Landmark::new(0.0, 0.0, 0.0));
        set.confidence = confidence;
        for joint in HandJoint::ALL {
            let landmark = keypoints.get(joint.mediapipe_index()).ok_or_else(|| {
                MonitorError::InvalidLandmarks(format!(
                    "{} hand has {} keypoints, expected 21",
                    handedness.to_string(),
                    keypoints.len()
                ))
            })?;
            set.set(joint, *landmark);
        }
        Ok(set)
    }
}

// ==============================================================================
// Provider result for a single frame
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkObservation {
    pub body: Option<BodyLandmarkSet>,
    pub hands: Vec<HandLandmarkSet>,
}

impl LandmarkObservation {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mediapipe_points(count: usize) -> Vec<Landmark> {
        (0..count)
            .map(|i| Landmark::new(i as f32 / 100.0, i as f32 / 50.0, 0.9))
            .collect()
    }

    #[test]
    fn test_landmark_visibility_is_strict() {
        let landmark = Landmark::new(0.5, 0.5, 0.5);
        assert!(!landmark.is_visible(0.5));
        assert!(Landmark::new(0.5, 0.5, 0.51).is_visible(0.5));
    }

    #[test]
    fn test_missing_visibility_is_not_visible() {
        let landmark: Landmark = serde_json::from_str(r#"{"x": 0.4, "y": 0.6}"#).unwrap();
        assert_eq!(landmark.visibility, 0.0);
        assert_eq!(landmark.z, 0.0);
        assert!(!landmark.is_visible(0.5));
    }

    #[test]
    fn test_distance_xy_ignores_depth() {
        let mut a = Landmark::new(0.0, 0.0, 1.0);
        a.z = 5.0;
        let b = Landmark::new(0.3, 0.4, 1.0);
        assert!((a.distance_xy(&b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_body_adapter_picks_mediapipe_indices() {
        let points = mediapipe_points(33);
        let body = BodyLandmarkSet::from_mediapipe(&points).unwrap();

        assert_eq!(body.get(BodyJoint::Nose).x, 0.0);
        assert_eq!(body.get(BodyJoint::LeftShoulder).x, 0.11);
        assert_eq!(body.get(BodyJoint::RightWrist).x, 0.16);
    }

    #[test]
    fn test_body_adapter_rejects_short_pose() {
        let points = mediapipe_points(12);
        let err = BodyLandmarkSet::from_mediapipe(&points).unwrap_err();
        assert!(matches!(err, MonitorError::InvalidLandmarks(_)));
    }

    #[test]
    fn test_hand_adapter_picks_mediapipe_indices() {
        let points = mediapipe_points(21);
        let hand = HandLandmarkSet::from_mediapipe(Handedness::Right, 0.8, &points).unwrap();

        assert_eq!(hand.handedness, Handedness::Right);
        assert_eq!(hand.confidence, 0.8);
        assert_eq!(hand.get(HandJoint::ThumbTip).x, 0.04);
        assert_eq!(hand.get(HandJoint::PinkyTip).x, 0.2);
        assert_eq!(hand.get(Finger::Middle.pip()).x, 0.1);
    }

    #[test]
    fn test_hand_adapter_rejects_short_hand() {
        let points = mediapipe_points(20);
        assert!(HandLandmarkSet::from_mediapipe(Handedness::Left, 1.0, &points).is_err());
    }
}

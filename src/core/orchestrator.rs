// Frame orchestration - runs posture and grip classification on each frame
// and drives the confirmation tracker

use crate::core::confirmation::ConfirmationTracker;
use crate::core::grip::grip_details;
use crate::core::posture::classify_posture;
use crate::models::capture::RawFrame;
use crate::models::landmarks::LandmarkObservation;
use crate::models::monitor::{
    ArmPosture, FrameOutcome, FrameReport, SessionStatistics, Verdict,
};
use crate::platform::pose::LandmarkProvider;
use chrono::Utc;
use tracing::{debug, info, warn};

pub struct FrameOrchestrator {
    tracker: ConfirmationTracker,
    statistics: SessionStatistics,
    last_verdict: Verdict,
}

impl FrameOrchestrator {
    pub fn new(session_id: String) -> Self {
        Self {
            tracker: ConfirmationTracker::new(),
            statistics: SessionStatistics {
                session_id,
                started_at: Some(Utc::now()),
                ..SessionStatistics::default()
            },
            last_verdict: Verdict::Idle,
        }
    }

    /// Classify one provider result and advance the tracker.
    ///
    /// Without a body there is nothing to classify: the frame reports idle
    /// and the tracker keeps its episode untouched for the next frame.
    pub fn evaluate(&mut self, observation: &LandmarkObservation, now_ms: u64) -> FrameReport {
        self.statistics.frames_evaluated += 1;

        let body = match observation.body {
            Some(ref body) => body,
            None => {
                debug!("frame at {} ms: no body detected", now_ms);
                return FrameReport {
                    timestamp_ms: now_ms,
                    verdict: Verdict::Idle,
                    posture: ArmPosture::None,
                    gripping_hands: Vec::new(),
                    elapsed_ms: 0,
                    body_detected: false,
                };
            }
        };

        self.statistics.frames_with_body += 1;
        let posture = classify_posture(body);

        let gripping_hands: Vec<_> = if posture.any() {
            self.statistics.frames_with_posture += 1;
            observation
                .hands
                .iter()
                .filter(|hand| {
                    let details = grip_details(hand);
                    debug!(
                        "{} hand: {} curled fingers, thumb extended: {}",
                        hand.handedness.to_string(),
                        details.curled_fingers,
                        details.thumb_extended
                    );
                    details.is_grip()
                })
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        let momentary = !gripping_hands.is_empty();
        let verdict = self.tracker.update(momentary, now_ms);
        let state = self.tracker.state();

        if state.is_currently_gripping {
            self.statistics.longest_grip_ms = self.statistics.longest_grip_ms.max(state.elapsed_ms);
        }
        self.record_transition(verdict, state.elapsed_ms);

        debug!(
            "frame at {} ms: posture={} momentary={} verdict={} elapsed={}ms",
            now_ms,
            posture.to_string(),
            momentary,
            verdict.to_string(),
            state.elapsed_ms
        );

        FrameReport {
            timestamp_ms: now_ms,
            verdict,
            posture,
            gripping_hands,
            elapsed_ms: state.elapsed_ms,
            body_detected: true,
        }
    }

    /// Run the provider on a captured frame, then evaluate it.
    ///
    /// A provider failure skips the frame entirely: the tracker keeps its
    /// in-progress episode as if the frame had never been captured.
    pub fn process_frame(
        &mut self,
        provider: &mut dyn LandmarkProvider,
        frame: &RawFrame,
    ) -> FrameOutcome {
        match provider.infer(frame) {
            Ok(observation) => FrameOutcome::Evaluated(self.evaluate(&observation, frame.timestamp_ms)),
            Err(e) => self.skip_frame(e.to_string()),
        }
    }

    /// Account for a frame that never reached classification
    pub fn skip_frame(&mut self, reason: String) -> FrameOutcome {
        warn!("Skipping frame: {}", reason);
        self.statistics.frames_skipped += 1;
        FrameOutcome::Skipped(reason)
    }

    pub fn verdict(&self) -> Verdict {
        self.tracker.verdict()
    }

    pub fn tracker(&self) -> &ConfirmationTracker {
        &self.tracker
    }

    pub fn statistics(&self) -> &SessionStatistics {
        &self.statistics
    }

    fn record_transition(&mut self, verdict: Verdict, elapsed_ms: u64) {
        if verdict == self.last_verdict {
            return;
        }

        match verdict {
            Verdict::Confirmed => {
                self.statistics.confirmations += 1;
                info!("Phone in hand confirmed after {} ms", elapsed_ms);
            }
            Verdict::Analyzing => debug!("Grip detected, analyzing"),
            Verdict::Idle => debug!("Grip released after {:?}", self.last_verdict),
        }
        self.last_verdict = verdict;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::landmarks::{
        BodyJoint, BodyLandmarkSet, Finger, HandJoint, HandLandmarkSet, Handedness, Landmark,
    };
    use crate::models::monitor::MonitorResult;
    use crate::platform::pose::ProviderOptions;

    fn viewing_body() -> BodyLandmarkSet {
        BodyLandmarkSet::uniform(Landmark::new(0.5, 0.5, 0.9))
            .with(BodyJoint::Nose, Landmark::new(0.5, 0.3, 0.99))
            .with(BodyJoint::LeftShoulder, Landmark::new(0.65, 0.45, 0.9))
            .with(BodyJoint::RightShoulder, Landmark::new(0.35, 0.45, 0.9))
            .with(BodyJoint::LeftElbow, Landmark::new(0.7, 0.75, 0.9))
            .with(BodyJoint::RightElbow, Landmark::new(0.3, 0.75, 0.9))
            .with(BodyJoint::LeftWrist, Landmark::new(0.55, 0.55, 0.9))
            .with(BodyJoint::RightWrist, Landmark::new(0.45, 0.55, 0.9))
    }

    fn resting_body() -> BodyLandmarkSet {
        viewing_body()
            .with(BodyJoint::LeftWrist, Landmark::new(0.7, 0.95, 0.9))
            .with(BodyJoint::RightWrist, Landmark::new(0.3, 0.95, 0.9))
    }

    /// Every fingertip folded below its middle joint
    fn gripping_hand() -> HandLandmarkSet {
        let mut hand = HandLandmarkSet::uniform(Handedness::Right, Landmark::new(0.5, 0.5, 1.0));
        for (i, finger) in Finger::ALL.into_iter().enumerate() {
            let x = 0.4 + i as f32 * 0.05;
            hand.set(finger.mcp(), Landmark::new(x, 0.80, 1.0));
            hand.set(finger.pip(), Landmark::new(x, 0.50, 1.0));
            hand.set(finger.tip(), Landmark::new(x, 0.55, 1.0));
        }
        hand.with(HandJoint::ThumbMcp, Landmark::new(0.3, 0.6, 1.0))
            .with(HandJoint::ThumbTip, Landmark::new(0.3, 0.7, 1.0))
    }

    fn open_hand() -> HandLandmarkSet {
        let mut hand = gripping_hand();
        for finger in Finger::ALL {
            let x = hand.get(finger.pip()).x;
            hand.set(finger.tip(), Landmark::new(x, 0.30, 1.0));
        }
        hand
    }

    fn observation(body: Option<BodyLandmarkSet>, hands: Vec<HandLandmarkSet>) -> LandmarkObservation {
        LandmarkObservation { body, hands }
    }

    struct ScriptedProvider {
        script: Vec<MonitorResult<LandmarkObservation>>,
        options: ProviderOptions,
    }

    impl LandmarkProvider for ScriptedProvider {
        fn infer(&mut self, _frame: &RawFrame) -> MonitorResult<LandmarkObservation> {
            self.script.remove(0)
        }

        fn close(&mut self) {}

        fn is_initialized(&self) -> bool {
            true
        }

        fn options(&self) -> &ProviderOptions {
            &self.options
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    #[test]
    fn test_no_body_is_idle_and_skips_hands() {
        let mut orchestrator = FrameOrchestrator::new("s".to_string());
        let report = orchestrator.evaluate(&observation(None, vec![gripping_hand()]), 0);

        assert_eq!(report.verdict, Verdict::Idle);
        assert_eq!(report.posture, ArmPosture::None);
        assert!(report.gripping_hands.is_empty());
        assert!(!report.body_detected);
    }

    #[test]
    fn test_no_body_keeps_in_progress_grip() {
        let mut orchestrator = FrameOrchestrator::new("s".to_string());
        let holding = observation(Some(viewing_body()), vec![gripping_hand()]);

        for frame in 0..14 {
            orchestrator.evaluate(&holding, frame * 33);
        }
        let missing = orchestrator.evaluate(&LandmarkObservation::empty(), 462);
        assert_eq!(missing.verdict, Verdict::Idle);
        assert_eq!(missing.posture, ArmPosture::None);
        assert!(missing.banner().is_none());
        assert_eq!(orchestrator.tracker().state().grip_started_at, Some(0));

        let mut last = Verdict::Idle;
        for frame in 15..28 {
            last = orchestrator.evaluate(&holding, frame * 33).verdict;
        }
        assert_eq!(last, Verdict::Confirmed);
        assert_eq!(orchestrator.tracker().state().elapsed_ms, 27 * 33);
        assert_eq!(orchestrator.statistics().confirmations, 1);
    }

    #[test]
    fn test_grip_ignored_without_posture() {
        let mut orchestrator = FrameOrchestrator::new("s".to_string());
        let report = orchestrator.evaluate(&observation(Some(resting_body()), vec![gripping_hand()]), 0);

        assert_eq!(report.verdict, Verdict::Idle);
        assert!(report.gripping_hands.is_empty());
        assert_eq!(orchestrator.statistics().frames_with_posture, 0);
    }

    #[test]
    fn test_posture_without_grip_is_idle() {
        let mut orchestrator = FrameOrchestrator::new("s".to_string());
        let report = orchestrator.evaluate(&observation(Some(viewing_body()), vec![open_hand()]), 0);

        assert_eq!(report.verdict, Verdict::Idle);
        assert_eq!(report.posture, ArmPosture::Both);
        assert!(report.banner().is_some());
    }

    #[test]
    fn test_momentary_signal_is_or_across_hands() {
        let mut orchestrator = FrameOrchestrator::new("s".to_string());
        let mut left = open_hand();
        left.handedness = Handedness::Left;

        let report = orchestrator.evaluate(
            &observation(Some(viewing_body()), vec![left, gripping_hand()]),
            0,
        );

        assert_eq!(report.verdict, Verdict::Analyzing);
        assert_eq!(report.gripping_hands.len(), 1);
        assert_eq!(report.gripping_hands[0].handedness, Handedness::Right);
    }

    #[test]
    fn test_sustained_grip_confirms_and_counts_episode() {
        let mut orchestrator = FrameOrchestrator::new("s".to_string());
        let holding = observation(Some(viewing_body()), vec![gripping_hand()]);

        let mut last = Verdict::Idle;
        for frame in 0..28 {
            last = orchestrator.evaluate(&holding, frame * 33).verdict;
        }

        assert_eq!(last, Verdict::Confirmed);
        let stats = orchestrator.statistics();
        assert_eq!(stats.confirmations, 1);
        assert_eq!(stats.longest_grip_ms, 27 * 33);
        assert_eq!(stats.frames_evaluated, 28);
    }

    #[test]
    fn test_provider_failure_does_not_advance_tracker() {
        let holding = observation(Some(viewing_body()), vec![gripping_hand()]);
        let mut provider = ScriptedProvider {
            script: vec![
                Ok(holding.clone()),
                Err(crate::models::monitor::MonitorError::InferenceFailed("camera".to_string())),
                Ok(holding.clone()),
            ],
            options: ProviderOptions::default(),
        };
        let mut orchestrator = FrameOrchestrator::new("s".to_string());

        let first = orchestrator.process_frame(&mut provider, &RawFrame::empty(0));
        assert_eq!(first.report().unwrap().verdict, Verdict::Analyzing);

        let skipped = orchestrator.process_frame(&mut provider, &RawFrame::empty(450));
        assert!(matches!(skipped, FrameOutcome::Skipped(_)));
        assert_eq!(orchestrator.tracker().state().grip_started_at, Some(0));

        let last = orchestrator.process_frame(&mut provider, &RawFrame::empty(900));
        assert_eq!(last.report().unwrap().verdict, Verdict::Confirmed);
        assert_eq!(orchestrator.statistics().frames_skipped, 1);
    }
}

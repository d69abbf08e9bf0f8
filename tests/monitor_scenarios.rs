// End-to-end scenarios: MediaPipe-ordered landmark recordings driven through
// the replay provider and the frame orchestrator

use phone_watch_lib::core::orchestrator::FrameOrchestrator;
use phone_watch_lib::models::capture::RawFrame;
use phone_watch_lib::models::landmarks::{Handedness, Landmark};
use phone_watch_lib::models::monitor::{FrameOutcome, Verdict};
use phone_watch_lib::platform::pose::mediapipe_bridge::ProviderHand;
use phone_watch_lib::platform::pose::{
    parse_recording, ProviderHandle, ProviderOptions, ProviderPayload, RecordedFrame,
    ReplayProvider,
};
use std::sync::Arc;

const FRAME_MS: u64 = 33;

/// Right forearm raised in front of the chest, left arm hanging
fn viewing_pose() -> Vec<Landmark> {
    let mut body = vec![Landmark::new(0.5, 0.5, 0.9); 33];
    body[0] = Landmark::new(0.5, 0.3, 0.99); // nose
    body[12] = Landmark::new(0.35, 0.45, 0.9); // right shoulder
    body[14] = Landmark::new(0.3, 0.75, 0.9); // right elbow
    body[16] = Landmark::new(0.45, 0.55, 0.9); // right wrist
    body
}

/// `curled` fingertips folded below their middle joint, the rest pointing up
fn hand(curled: usize) -> ProviderHand {
    let mut landmarks = vec![Landmark::new(0.5, 0.5, 1.0); 21];
    for (finger, (mcp, pip, tip)) in [(5, 6, 8), (9, 10, 12), (13, 14, 16), (17, 18, 20)]
        .into_iter()
        .enumerate()
    {
        let x = 0.4 + finger as f32 * 0.05;
        landmarks[mcp] = Landmark::new(x, 0.80, 1.0);
        landmarks[pip] = Landmark::new(x, 0.50, 1.0);
        landmarks[tip] = if finger < curled {
            Landmark::new(x, 0.55, 1.0)
        } else {
            Landmark::new(x, 0.20, 1.0)
        };
    }
    landmarks[2] = Landmark::new(0.3, 0.6, 1.0); // thumb MCP
    landmarks[4] = Landmark::new(0.3, 0.7, 1.0); // thumb tip, pointing down

    ProviderHand {
        handedness: Handedness::Right,
        confidence: 0.95,
        landmarks,
    }
}

fn holding(timestamp_ms: u64) -> RecordedFrame {
    RecordedFrame {
        timestamp_ms,
        dropped: false,
        payload: ProviderPayload {
            body: Some(viewing_pose()),
            hands: vec![hand(4)],
        },
    }
}

fn open_handed(timestamp_ms: u64) -> RecordedFrame {
    RecordedFrame {
        payload: ProviderPayload {
            body: Some(viewing_pose()),
            hands: vec![hand(0)],
        },
        ..holding(timestamp_ms)
    }
}

fn dropped(timestamp_ms: u64) -> RecordedFrame {
    RecordedFrame {
        dropped: true,
        payload: ProviderPayload::default(),
        ..holding(timestamp_ms)
    }
}

/// Replay `frames` and return the verdict of every frame (`None` when skipped)
fn run(frames: Vec<RecordedFrame>) -> (Vec<Option<Verdict>>, FrameOrchestrator) {
    let timestamps: Vec<u64> = frames.iter().map(|frame| frame.timestamp_ms).collect();
    let mut provider =
        ReplayProvider::new(frames, &ProviderOptions::default()).expect("replay provider");
    let mut orchestrator = FrameOrchestrator::new("scenario".to_string());

    let verdicts = timestamps
        .into_iter()
        .map(|ts| {
            orchestrator
                .process_frame(&mut provider, &RawFrame::empty(ts))
                .report()
                .map(|report| report.verdict)
        })
        .collect();

    (verdicts, orchestrator)
}

#[test]
fn test_continuous_grip_confirms_after_threshold() {
    let frames = (0..28).map(|i| holding(i * FRAME_MS)).collect();
    let (verdicts, orchestrator) = run(frames);

    // 25 * 33 = 825 ms is still analyzing, 26 * 33 = 858 ms confirms
    assert_eq!(verdicts[0], Some(Verdict::Analyzing));
    assert_eq!(verdicts[25], Some(Verdict::Analyzing));
    assert_eq!(verdicts[26], Some(Verdict::Confirmed));
    assert_eq!(verdicts[27], Some(Verdict::Confirmed));
    assert_eq!(orchestrator.statistics().confirmations, 1);
}

#[test]
fn test_single_release_restarts_the_timer() {
    let mut frames: Vec<RecordedFrame> = (0..16).map(|i| holding(i * FRAME_MS)).collect();
    frames.push(open_handed(16 * FRAME_MS));
    frames.extend((17..33).map(|i| holding(i * FRAME_MS)));

    let (verdicts, orchestrator) = run(frames);

    assert_eq!(verdicts[16], Some(Verdict::Idle));
    assert!(verdicts.iter().all(|v| *v != Some(Verdict::Confirmed)));
    assert_eq!(orchestrator.statistics().confirmations, 0);
    assert_eq!(orchestrator.tracker().state().grip_started_at, Some(17 * FRAME_MS));
}

#[test]
fn test_dropped_frames_keep_the_episode() {
    let frames: Vec<RecordedFrame> = (0..28)
        .map(|i| if i % 7 == 3 { dropped(i * FRAME_MS) } else { holding(i * FRAME_MS) })
        .collect();

    let (verdicts, orchestrator) = run(frames);

    assert_eq!(verdicts[3], None);
    assert_eq!(verdicts[26], Some(Verdict::Confirmed));
    let stats = orchestrator.statistics();
    assert_eq!(stats.frames_skipped, 4);
    assert_eq!(stats.frames_evaluated, 24);
}

#[test]
fn test_single_curled_finger_needs_raised_thumb() {
    let mut raised_thumb = hand(1);
    raised_thumb.landmarks[4] = Landmark::new(0.3, 0.4, 1.0);

    let frames = vec![
        RecordedFrame {
            payload: ProviderPayload {
                body: Some(viewing_pose()),
                hands: vec![hand(1)],
            },
            ..holding(0)
        },
        RecordedFrame {
            payload: ProviderPayload {
                body: Some(viewing_pose()),
                hands: vec![raised_thumb],
            },
            ..holding(33)
        },
    ];

    let (verdicts, _) = run(frames);
    assert_eq!(verdicts, vec![Some(Verdict::Idle), Some(Verdict::Analyzing)]);
}

#[test]
fn test_recording_text_replays_through_handle() {
    let mut text = String::from("# recorded at 30 fps\n");
    for i in 0..28 {
        let frame = if i == 10 { dropped(i * FRAME_MS) } else { holding(i * FRAME_MS) };
        text.push_str(&serde_json::to_string(&frame).unwrap());
        text.push('\n');
    }
    text.push_str(r#"{"timestamp_ms": 1000, "body": null, "hands": []}"#);

    let frames = parse_recording(text.as_bytes()).unwrap();
    assert_eq!(frames.len(), 29);

    let timestamps: Vec<u64> = frames.iter().map(|f| f.timestamp_ms).collect();
    let mut handle =
        ProviderHandle::open(&ProviderOptions::default(), ReplayProvider::factory(Arc::new(frames)))
            .unwrap();
    let mut orchestrator = FrameOrchestrator::new("recording".to_string());

    let outcomes: Vec<FrameOutcome> = timestamps
        .iter()
        .map(|&ts| orchestrator.process_frame(&mut handle, &RawFrame::empty(ts)))
        .collect();

    assert!(matches!(outcomes[10], FrameOutcome::Skipped(_)));
    assert_eq!(outcomes[27].report().unwrap().verdict, Verdict::Confirmed);

    // No body in the last frame shows idle but leaves the episode running
    let last = outcomes[28].report().unwrap();
    assert_eq!(last.verdict, Verdict::Idle);
    assert!(!last.body_detected);
    assert_eq!(orchestrator.tracker().state().grip_started_at, Some(0));
    assert_eq!(orchestrator.verdict(), Verdict::Confirmed);
    assert_eq!(orchestrator.statistics().longest_grip_ms, 27 * FRAME_MS);
}

#[test]
fn test_frame_without_body_does_not_restart_the_timer() {
    let frames: Vec<RecordedFrame> = (0..28)
        .map(|i| {
            if i == 14 {
                RecordedFrame {
                    payload: ProviderPayload::default(),
                    ..holding(i * FRAME_MS)
                }
            } else {
                holding(i * FRAME_MS)
            }
        })
        .collect();

    let (verdicts, orchestrator) = run(frames);

    assert_eq!(verdicts[14], Some(Verdict::Idle));
    assert_eq!(verdicts[27], Some(Verdict::Confirmed));
    assert_eq!(orchestrator.tracker().state().grip_started_at, Some(0));
    assert_eq!(orchestrator.statistics().frames_with_body, 27);
}

use std::time::{Duration, Instant};

use gesture_core::{
    landmarks::{
        INDEX_PIP, INDEX_TIP, LANDMARK_COUNT, MIDDLE_PIP, MIDDLE_TIP, PINKY_MCP, PINKY_PIP,
        PINKY_TIP, RING_PIP, RING_TIP, THUMB_IP, THUMB_TIP, WRIST,
    },
    AutomatonConfig, AutomatonState, ClassifierConfig, FrameMessage, GestureCount,
    GesturePipeline, HandLandmarks, Landmark,
};
use shared::domain::{LightCommand, LightId};

/// A hand showing `count` fingers (0 = fist, 5 = open palm with thumb).
fn hand_showing(count: u8) -> HandLandmarks {
    let mut points = [Landmark::default(); LANDMARK_COUNT];
    points[WRIST] = Landmark::new(0.5, 0.9);
    points[PINKY_MCP] = Landmark::new(0.7, 0.7);
    points[THUMB_IP] = Landmark::new(0.3, 0.7);
    points[THUMB_TIP] = if count == 5 {
        Landmark::new(0.15, 0.6)
    } else {
        Landmark::new(0.5, 0.7)
    };
    let fingers = [
        (INDEX_PIP, INDEX_TIP, 0.4),
        (MIDDLE_PIP, MIDDLE_TIP, 0.5),
        (RING_PIP, RING_TIP, 0.6),
        (PINKY_PIP, PINKY_TIP, 0.7),
    ];
    for (i, (pip, tip, x)) in fingers.into_iter().enumerate() {
        points[pip] = Landmark::new(x, 0.6);
        let open = (i as u8) < count.min(4);
        points[tip] = Landmark::new(x, if open { 0.3 } else { 0.75 });
    }
    HandLandmarks::new(points)
}

fn run(frames: &[Option<u8>]) -> (GesturePipeline, Vec<(usize, LightCommand)>) {
    let mut pipeline = GesturePipeline::default();
    let mut now = Instant::now();
    let mut emitted = Vec::new();
    for (i, frame) in frames.iter().enumerate() {
        now += Duration::from_millis(40);
        let hand = frame.map(hand_showing);
        let report = pipeline.process(hand.as_ref(), now);
        if let Some(command) = report.emitted {
            emitted.push((i + 1, command));
        }
    }
    (pipeline, emitted)
}

#[test]
fn synthetic_hands_classify_to_their_count() {
    let mut pipeline = GesturePipeline::default();
    for count in 0..=5 {
        let report = pipeline.process(Some(&hand_showing(count)), Instant::now());
        assert_eq!(report.count, GestureCount::Fingers(count));
    }
}

#[test]
fn fist_then_three_fingers_toggles_light_three_on() {
    let frames: Vec<Option<u8>> = [0, 0, 0, 0, 0, 3, 3, 3, 3, 3].map(Some).to_vec();
    let (pipeline, emitted) = run(&frames);
    assert_eq!(emitted, vec![(10, LightCommand::new(LightId(3), true))]);
    assert_eq!(pipeline.automaton().state(), AutomatonState::Cooldown);
}

#[test]
fn single_misread_delays_but_does_not_cancel() {
    let frames: Vec<Option<u8>> = [0, 0, 0, 0, 0, 3, 3, 4, 3, 3, 3, 3, 3, 3, 3]
        .map(Some)
        .to_vec();
    let (_, emitted) = run(&frames);
    assert_eq!(emitted, vec![(13, LightCommand::new(LightId(3), true))]);
}

#[test]
fn hand_leaving_frame_mid_confirmation_restarts_it() {
    let frames = [
        Some(0),
        Some(0),
        Some(0),
        Some(0),
        Some(0),
        Some(2),
        Some(2),
        Some(2),
        None,
        Some(2),
        Some(2),
        Some(2),
        Some(2),
    ];
    let (pipeline, emitted) = run(&frames);
    assert!(emitted.is_empty());
    assert_eq!(pipeline.automaton().confirmation_window(), vec![2, 2, 2, 2]);
}

#[test]
fn open_palm_commands_light_five() {
    let frames: Vec<Option<u8>> = [0, 0, 0, 0, 0, 5, 5, 5, 5, 5].map(Some).to_vec();
    let (_, emitted) = run(&frames);
    assert_eq!(emitted, vec![(10, LightCommand::new(LightId(5), true))]);
}

#[test]
fn pipeline_rejects_invalid_configuration() {
    let result = GesturePipeline::new(
        ClassifierConfig::default(),
        AutomatonConfig {
            confirm_window: 0,
            ..AutomatonConfig::default()
        },
    );
    assert!(result.is_err());
}

#[test]
fn json_frames_drive_the_pipeline() {
    let hand = serde_json::to_string(&FrameMessage {
        landmarks: Some(hand_showing(1)),
    })
    .expect("serialize");
    let frame: FrameMessage = serde_json::from_str(&hand).expect("parse");
    let report = GesturePipeline::default().process(frame.landmarks.as_ref(), Instant::now());
    assert_eq!(report.count, GestureCount::Fingers(1));

    let json = serde_json::to_value(report).expect("report json");
    assert_eq!(json["count"], 1);
    assert_eq!(json["state"], "idle");
    assert!(json["emitted"].is_null());
}

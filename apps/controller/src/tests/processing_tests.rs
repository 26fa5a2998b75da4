use super::*;

use dispatch::DryRunDispatcher;
use gesture_core::{
    landmarks::{
        INDEX_PIP, INDEX_TIP, LANDMARK_COUNT, MIDDLE_PIP, MIDDLE_TIP, PINKY_MCP, PINKY_PIP,
        PINKY_TIP, RING_PIP, RING_TIP, THUMB_IP, THUMB_TIP, WRIST,
    },
    GestureCount, Landmark,
};
use shared::domain::{LightCommand, LightId};

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

fn processor() -> (Processor, Arc<DryRunDispatcher>) {
    let dry_run = Arc::new(DryRunDispatcher::default());
    let processor = Processor::new(GesturePipeline::default(), dry_run.clone());
    (processor, dry_run)
}

fn frame(seq: u64, count: Option<u8>) -> CapturedFrame {
    CapturedFrame {
        seq,
        captured_at: std::time::Instant::now(),
        hand: count.map(hand_showing),
    }
}

#[tokio::test]
async fn committed_toggle_reaches_dispatcher() {
    let (mut processor, dry_run) = processor();
    let mut now = std::time::Instant::now();
    let mut tasks = Vec::new();

    for count in [0, 0, 0, 0, 0, 3, 3, 3, 3, 3] {
        now += Duration::from_millis(33);
        let (report, task) = processor.handle(Some(&hand_showing(count)), now);
        assert_eq!(report.count, GestureCount::Fingers(count));
        tasks.extend(task);
    }

    assert_eq!(tasks.len(), 1);
    for task in tasks {
        task.await.expect("dispatch task");
    }
    assert_eq!(
        dry_run.sent().await,
        vec![LightCommand::new(LightId(3), true)]
    );
    assert_eq!(processor.pipeline().automaton().state(), AutomatonState::Cooldown);
}

#[tokio::test]
async fn missing_hand_never_dispatches() {
    let (mut processor, dry_run) = processor();
    let mut now = std::time::Instant::now();
    for _ in 0..20 {
        now += Duration::from_millis(33);
        let (report, task) = processor.handle(None, now);
        assert_eq!(report.count, GestureCount::NoHand);
        assert!(task.is_none());
    }
    assert!(dry_run.sent().await.is_empty());
}

#[tokio::test]
async fn loop_only_sees_latest_frame() {
    let (mut processor, _dry_run) = processor();
    let (tx, rx) = watch::channel(None);
    tx.send(Some(frame(1, Some(0)))).expect("send");
    tx.send(Some(frame(2, Some(0)))).expect("send");
    tx.send(Some(frame(3, None))).expect("send");
    drop(tx);

    let mut seen = Vec::new();
    let stats = run(
        rx,
        &mut processor,
        Duration::from_millis(1),
        std::future::pending::<()>(),
        |report| seen.push(report.count),
    )
    .await;

    assert_eq!(
        stats,
        LoopStats {
            processed: 1,
            superseded: 2,
            commands: 0
        }
    );
    assert_eq!(seen, vec![GestureCount::NoHand]);
}

#[tokio::test]
async fn stale_frame_is_not_processed_twice() {
    let (mut processor, _dry_run) = processor();
    let (tx, rx) = watch::channel(None);
    tx.send(Some(frame(1, Some(0)))).expect("send");

    let stats = run(
        rx,
        &mut processor,
        Duration::from_millis(1),
        time::sleep(Duration::from_millis(50)),
        |_| {},
    )
    .await;

    assert_eq!(stats.processed, 1);
    assert_eq!(processor.pipeline().automaton().fist_streak(), 1);
    drop(tx);
}

#[tokio::test]
async fn shutdown_wins_over_pending_frames() {
    let (mut processor, _dry_run) = processor();
    let (tx, rx) = watch::channel(None);
    tx.send(Some(frame(1, Some(0)))).expect("send");

    let stats = run(rx, &mut processor, Duration::from_millis(1), async {}, |_| {}).await;
    assert_eq!(stats.processed, 0);
    drop(tx);
}

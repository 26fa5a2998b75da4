use std::{future::Future, sync::Arc, time::Duration};

use dispatch::{spawn_dispatch, CommandDispatcher};
use gesture_core::{AutomatonState, FrameReport, GesturePipeline, HandLandmarks};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::frames::CapturedFrame;

/// Owns the pipeline and forwards committed toggles to the dispatcher.
pub struct Processor {
    pipeline: GesturePipeline,
    dispatcher: Arc<dyn CommandDispatcher>,
    last_state: AutomatonState,
}

impl Processor {
    pub fn new(pipeline: GesturePipeline, dispatcher: Arc<dyn CommandDispatcher>) -> Self {
        let last_state = pipeline.automaton().state();
        Self {
            pipeline,
            dispatcher,
            last_state,
        }
    }

    pub fn pipeline(&self) -> &GesturePipeline {
        &self.pipeline
    }

    /// Runs one frame through the pipeline. Must be called inside a tokio
    /// runtime when the frame may commit a toggle.
    pub fn handle(
        &mut self,
        hand: Option<&HandLandmarks>,
        now: std::time::Instant,
    ) -> (FrameReport, Option<JoinHandle<()>>) {
        let report = self.pipeline.process(hand, now);
        debug!(
            fingers = %report.fingers,
            count = %report.count,
            state = %report.state,
            "frame"
        );
        if report.state != self.last_state {
            info!(from = %self.last_state, to = %report.state, "state changed");
            self.last_state = report.state;
        }
        let task = report
            .emitted
            .map(|command| spawn_dispatch(Arc::clone(&self.dispatcher), command));
        (report, task)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub processed: u64,
    /// Frames replaced in the buffer before the loop got to them.
    pub superseded: u64,
    pub commands: u64,
}

/// Processes the newest published frame at most once per `min_interval`
/// until the source closes or `shutdown` resolves. Dispatches still in
/// flight are awaited before returning.
pub async fn run<S, F>(
    mut frames: watch::Receiver<Option<CapturedFrame>>,
    processor: &mut Processor,
    min_interval: Duration,
    shutdown: S,
    mut on_report: F,
) -> LoopStats
where
    S: Future<Output = ()>,
    F: FnMut(&FrameReport),
{
    let mut stats = LoopStats::default();
    let mut last_seq = 0;
    let mut in_flight = Vec::new();
    let mut ticker = time::interval(min_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        let changed = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            changed = next_frame(&mut ticker, &mut frames) => changed,
        };
        if changed.is_err() {
            debug!("frame source closed");
            break;
        }

        let Some(frame) = frames.borrow_and_update().clone() else {
            continue;
        };
        stats.superseded += frame.seq.saturating_sub(last_seq + 1);
        last_seq = frame.seq;
        debug!(
            seq = frame.seq,
            age_ms = frame.captured_at.elapsed().as_millis() as u64,
            "picked up frame"
        );

        let (report, task) = processor.handle(frame.hand.as_ref(), Instant::now().into_std());
        stats.processed += 1;
        if let Some(task) = task {
            stats.commands += 1;
            in_flight.retain(|t: &JoinHandle<()>| !t.is_finished());
            in_flight.push(task);
        }
        on_report(&report);
    }

    for task in in_flight {
        let _ = task.await;
    }

    info!(
        processed = stats.processed,
        superseded = stats.superseded,
        commands = stats.commands,
        "processing loop stopped"
    );
    stats
}

async fn next_frame(
    ticker: &mut time::Interval,
    frames: &mut watch::Receiver<Option<CapturedFrame>>,
) -> Result<(), watch::error::RecvError> {
    ticker.tick().await;
    frames.changed().await
}

#[cfg(test)]
#[path = "tests/processing_tests.rs"]
mod tests;

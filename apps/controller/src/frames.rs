use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
    process::{Child, Command, Stdio},
    thread,
    time::Instant,
};

use anyhow::{anyhow, Context};
use gesture_core::{FrameMessage, HandLandmarks};
use tokio::sync::watch;
use tracing::{debug, warn};

/// A frame as published to the processing loop.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub seq: u64,
    pub captured_at: Instant,
    pub hand: Option<HandLandmarks>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub frames: u64,
    pub rejected: u64,
}

/// Where landmark lines come from.
pub enum FrameSource {
    Stdin,
    File(BufReader<File>),
    Landmarker {
        child: Child,
        stdout: BufReader<std::process::ChildStdout>,
    },
}

impl FrameSource {
    pub fn open(path: Option<&Path>, landmarker_cmd: Option<&str>) -> anyhow::Result<Self> {
        if let Some(cmd) = landmarker_cmd {
            let mut child = Command::new("sh")
                .arg("-c")
                .arg(cmd)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .spawn()
                .with_context(|| format!("failed to start landmarker '{cmd}'"))?;
            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| anyhow!("landmarker stdout was not captured"))?;
            return Ok(Self::Landmarker {
                child,
                stdout: BufReader::new(stdout),
            });
        }
        match path {
            None => Ok(Self::Stdin),
            Some(p) if p == Path::new("-") => Ok(Self::Stdin),
            Some(p) => {
                let file = File::open(p)
                    .with_context(|| format!("failed to open frame source '{}'", p.display()))?;
                Ok(Self::File(BufReader::new(file)))
            }
        }
    }

    /// Starts the reader thread.
    pub fn spawn(self, tx: watch::Sender<Option<CapturedFrame>>) -> FrameReader {
        match self {
            Self::Stdin => FrameReader {
                thread: spawn_reader(BufReader::new(io::stdin()), tx),
                child: None,
            },
            Self::File(reader) => FrameReader {
                thread: spawn_reader(reader, tx),
                child: None,
            },
            Self::Landmarker { child, stdout } => FrameReader {
                thread: spawn_reader(stdout, tx),
                child: Some(child),
            },
        }
    }
}

/// The running reader thread plus the landmarker process feeding it, if any.
pub struct FrameReader {
    thread: thread::JoinHandle<ReaderStats>,
    child: Option<Child>,
}

impl FrameReader {
    /// Kills the landmarker, then collects the reader's stats. Returns `None`
    /// when the thread is still blocked on stdin or panicked.
    pub fn shutdown(mut self) -> Option<ReaderStats> {
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill() {
                debug!(error = %err, "landmarker already exited");
            }
            match child.wait() {
                Ok(status) => debug!(%status, "landmarker stopped"),
                Err(err) => warn!(error = %err, "could not reap landmarker"),
            }
        } else if !self.thread.is_finished() {
            return None;
        }
        match self.thread.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                warn!("frame reader panicked");
                None
            }
        }
    }
}

/// Reads JSON lines on a dedicated thread and publishes each parsed frame,
/// replacing whatever the loop has not picked up yet.
pub fn spawn_reader<R>(
    reader: R,
    tx: watch::Sender<Option<CapturedFrame>>,
) -> thread::JoinHandle<ReaderStats>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || read_frames(reader, &tx))
}

fn read_frames<R: BufRead>(reader: R, tx: &watch::Sender<Option<CapturedFrame>>) -> ReaderStats {
    let mut stats = ReaderStats::default();
    for (line_no, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "frame source read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let message: FrameMessage = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(err) => {
                stats.rejected += 1;
                warn!(line = line_no + 1, error = %err, "skipping malformed frame");
                continue;
            }
        };
        stats.frames += 1;
        let frame = CapturedFrame {
            seq: stats.frames,
            captured_at: Instant::now(),
            hand: message.landmarks,
        };
        if tx.send(Some(frame)).is_err() {
            debug!("processing loop gone; reader stopping");
            break;
        }
    }
    stats
}

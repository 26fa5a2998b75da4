use std::{
    fs,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gesture_core::{
    AutomatonConfig, AutomatonState, FingerClassifier, FrameMessage, GestureAutomaton,
    GestureCount,
};
use shared::domain::LightCommand;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gesture-tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a per-frame count sequence (-1 = no hand, 0 = fist) through the automaton.
    Simulate {
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        counts: Vec<i8>,
        #[arg(long, default_value_t = 15.0)]
        fps: f64,
        #[arg(long)]
        fist_threshold: Option<u32>,
        #[arg(long)]
        confirm_window: Option<usize>,
    },
    /// Classify every frame of a JSON-lines landmark file.
    Classify { file: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Simulate {
            counts,
            fps,
            fist_threshold,
            confirm_window,
        } => {
            let mut config = AutomatonConfig::default();
            if let Some(frames) = fist_threshold {
                config.fist_threshold = frames;
            }
            if let Some(frames) = confirm_window {
                config.confirm_window = frames;
            }
            let outcome = simulate(config, &counts, fps)?;
            for (frame, command) in &outcome.emitted {
                println!("frame {frame}: {}", command.button_name());
            }
            println!(
                "{} frames, {} command(s), final state {}",
                counts.len(),
                outcome.emitted.len(),
                outcome.final_state
            );
        }
        Command::Classify { file } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("failed to read '{}'", file.display()))?;
            for line in classify_lines(&raw) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

struct Simulation {
    emitted: Vec<(usize, LightCommand)>,
    final_state: AutomatonState,
}

/// Frames are spaced `1 / fps` apart, starting one interval after t0.
fn simulate(config: AutomatonConfig, counts: &[i8], fps: f64) -> Result<Simulation> {
    if !(fps.is_finite() && fps > 0.0) {
        bail!("fps must be a positive number, got {fps}");
    }
    let step = Duration::from_secs_f64(1.0 / fps);
    let mut automaton = GestureAutomaton::new(config)?;
    let mut now = Instant::now();
    let mut emitted = Vec::new();

    for (i, raw) in counts.iter().enumerate() {
        let count = GestureCount::from_raw(*raw)
            .with_context(|| format!("frame {}: count {raw} is outside -1..=5", i + 1))?;
        now += step;
        if let Some(command) = automaton.step(count, now) {
            emitted.push((i + 1, command));
        }
    }

    Ok(Simulation {
        emitted,
        final_state: automaton.state(),
    })
}

fn classify_lines(raw: &str) -> Vec<String> {
    let classifier = FingerClassifier::default();
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| match serde_json::from_str::<FrameMessage>(line) {
            Ok(message) => {
                let result = classifier.classify(message.landmarks.as_ref());
                format!("{:>4}  {}  count={}", i + 1, result.fingers, result.count)
            }
            Err(err) => format!("{:>4}  invalid frame: {err}", i + 1),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::LightId;

    #[test]
    fn simulate_reports_frame_of_commit() {
        let counts = [0, 0, 0, 0, 0, 3, 3, 4, 3, 3, 3, 3, 3, 3, 3];
        let outcome = simulate(AutomatonConfig::default(), &counts, 30.0).expect("simulate");
        assert_eq!(outcome.emitted, vec![(13, LightCommand::new(LightId(3), true))]);
        assert_eq!(outcome.final_state, AutomatonState::Cooldown);
    }

    #[test]
    fn slow_sampling_times_out_ready() {
        // At 1 fps the fourth confirming frame lands after the 3 s window.
        let counts = [0, 0, 0, 0, 0, 2, 2, 2, 2, 2];
        let outcome = simulate(AutomatonConfig::default(), &counts, 1.0).expect("simulate");
        assert!(outcome.emitted.is_empty());
    }

    #[test]
    fn simulate_rejects_bad_input() {
        assert!(simulate(AutomatonConfig::default(), &[0, 9], 30.0).is_err());
        assert!(simulate(AutomatonConfig::default(), &[0], 0.0).is_err());
    }

    #[test]
    fn negative_counts_parse_from_cli() {
        let cli = Cli::try_parse_from(["gesture-tools", "simulate", "--counts", "-1,0,3"])
            .expect("cli");
        match cli.command {
            Command::Simulate { counts, .. } => assert_eq!(counts, vec![-1, 0, 3]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn classify_marks_bad_lines() {
        let lines = classify_lines("{\"landmarks\": null}\n\nnope\n");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("count=-1"));
        assert!(lines[1].contains("invalid frame"));
    }
}

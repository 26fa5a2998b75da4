//! Arm/fire state machine driven once per frame.
//!
//! ```text
//!            fist held for fist_threshold frames
//!   IDLE ───────────────────────────────────────▶ READY
//!    ▲  ◀──────── ready_timeout elapsed ─────────  │
//!    │                                             │ confirm_window identical
//!    │                                             │ counts in 1..=5
//!    └──────── cooldown elapsed ──── COOLDOWN ◀────┘  (toggle + emit)
//! ```
//!
//! Frame thresholds are counted in frames, timeouts in wall-clock time, so
//! arming and confirmation get faster or slower with the sampling rate while
//! the timeouts do not.

use std::{
    collections::VecDeque,
    fmt,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use shared::domain::{LightCommand, LightId};
use tracing::{debug, info};

use crate::{classifier::GestureCount, error::ConfigError, registry::LightRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomatonConfig {
    /// Consecutive fist frames needed to arm.
    pub fist_threshold: u32,
    /// Consecutive identical command frames needed to fire.
    pub confirm_window: usize,
    pub ready_timeout: Duration,
    pub cooldown: Duration,
}

impl Default for AutomatonConfig {
    fn default() -> Self {
        Self {
            fist_threshold: 5,
            confirm_window: 5,
            ready_timeout: Duration::from_secs(3),
            cooldown: Duration::from_millis(500),
        }
    }
}

impl AutomatonConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fist_threshold == 0 {
            return Err(ConfigError::ZeroFistThreshold);
        }
        if self.confirm_window == 0 {
            return Err(ConfigError::ZeroConfirmWindow);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomatonState {
    Idle,
    Ready,
    Cooldown,
}

impl AutomatonState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Ready => "READY",
            Self::Cooldown => "COOLDOWN",
        }
    }
}

impl fmt::Display for AutomatonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
enum Phase {
    Idle {
        fist_streak: u32,
    },
    Ready {
        since: Instant,
        window: VecDeque<u8>,
    },
    Cooldown {
        since: Instant,
    },
}

impl Phase {
    fn idle() -> Self {
        Phase::Idle { fist_streak: 0 }
    }
}

#[derive(Debug, Clone)]
pub struct GestureAutomaton {
    config: AutomatonConfig,
    phase: Phase,
    registry: LightRegistry,
}

impl Default for GestureAutomaton {
    fn default() -> Self {
        Self {
            config: AutomatonConfig::default(),
            phase: Phase::idle(),
            registry: LightRegistry::new(),
        }
    }
}

impl GestureAutomaton {
    pub fn new(config: AutomatonConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            phase: Phase::idle(),
            registry: LightRegistry::new(),
        })
    }

    pub fn config(&self) -> &AutomatonConfig {
        &self.config
    }

    pub fn state(&self) -> AutomatonState {
        match self.phase {
            Phase::Idle { .. } => AutomatonState::Idle,
            Phase::Ready { .. } => AutomatonState::Ready,
            Phase::Cooldown { .. } => AutomatonState::Cooldown,
        }
    }

    /// Current fist streak; always 0 outside IDLE.
    pub fn fist_streak(&self) -> u32 {
        match self.phase {
            Phase::Idle { fist_streak } => fist_streak,
            _ => 0,
        }
    }

    /// Pending confirmation counts, oldest first; empty outside READY.
    pub fn confirmation_window(&self) -> Vec<u8> {
        match &self.phase {
            Phase::Ready { window, .. } => window.iter().copied().collect(),
            _ => Vec::new(),
        }
    }

    pub fn registry(&self) -> &LightRegistry {
        &self.registry
    }

    /// Feed one frame's count observed at `now`. Returns the committed
    /// toggle, at most one per call.
    pub fn step(&mut self, count: GestureCount, now: Instant) -> Option<LightCommand> {
        let confirm_window = self.config.confirm_window;
        match &mut self.phase {
            Phase::Idle { fist_streak } => {
                if !count.is_fist() {
                    *fist_streak = 0;
                    return None;
                }
                *fist_streak += 1;
                if *fist_streak >= self.config.fist_threshold {
                    debug!(frames = *fist_streak, "fist held; armed");
                    self.phase = Phase::Ready {
                        since: now,
                        window: VecDeque::with_capacity(confirm_window + 1),
                    };
                }
                None
            }
            Phase::Ready { since, window } => {
                if now.saturating_duration_since(*since) > self.config.ready_timeout {
                    debug!(pending = window.len(), "no command before ready timeout");
                    self.phase = Phase::idle();
                    return None;
                }
                let Some(value) = count.command_value() else {
                    if !window.is_empty() {
                        debug!(%count, discarded = window.len(), "confirmation reset");
                    }
                    window.clear();
                    return None;
                };

                window.push_back(value);
                if window.len() > confirm_window {
                    window.pop_front();
                }
                if window.len() < confirm_window || window.iter().any(|v| *v != value) {
                    return None;
                }

                let light_id = LightId(value);
                let Some(new_on_state) = self.registry.toggle(light_id) else {
                    window.clear();
                    return None;
                };
                let command = LightCommand::new(light_id, new_on_state);
                info!(light = %light_id, on = new_on_state, "gesture confirmed");
                self.phase = Phase::Cooldown { since: now };
                Some(command)
            }
            Phase::Cooldown { since } => {
                if now.saturating_duration_since(*since) > self.config.cooldown {
                    debug!("cooldown over");
                    self.phase = Phase::idle();
                }
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/automaton_tests.rs"]
mod tests;

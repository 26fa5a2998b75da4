use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use dispatch::DEFAULT_API_URL;
use gesture_core::{AutomatonConfig, ClassifierConfig};
use serde::Deserialize;

pub const SETTINGS_FILE: &str = "controller.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub dry_run: bool,
    pub target_fps: f64,
    pub fist_threshold: u32,
    pub confirm_window: usize,
    pub ready_timeout_secs: f64,
    pub cooldown_secs: f64,
    pub thumb_reference: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let automaton = AutomatonConfig::default();
        Self {
            api_url: DEFAULT_API_URL.into(),
            dry_run: false,
            target_fps: 15.0,
            fist_threshold: automaton.fist_threshold,
            confirm_window: automaton.confirm_window,
            ready_timeout_secs: automaton.ready_timeout.as_secs_f64(),
            cooldown_secs: automaton.cooldown.as_secs_f64(),
            thumb_reference: ClassifierConfig::default().thumb_reference,
        }
    }
}

impl Settings {
    pub fn automaton_config(&self) -> anyhow::Result<AutomatonConfig> {
        Ok(AutomatonConfig {
            fist_threshold: self.fist_threshold,
            confirm_window: self.confirm_window,
            ready_timeout: seconds("ready_timeout_secs", self.ready_timeout_secs)?,
            cooldown: seconds("cooldown_secs", self.cooldown_secs)?,
        })
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            thumb_reference: self.thumb_reference,
        }
    }

    pub fn frame_interval(&self) -> anyhow::Result<Duration> {
        if !(self.target_fps.is_finite() && self.target_fps > 0.0) {
            bail!("target_fps must be a positive number, got {}", self.target_fps);
        }
        Ok(Duration::from_secs_f64(1.0 / self.target_fps))
    }
}

fn seconds(name: &str, value: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(value)
        .with_context(|| format!("{name} must be a non-negative number of seconds, got {value}"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    api_url: Option<String>,
    dry_run: Option<bool>,
    target_fps: Option<f64>,
    fist_threshold: Option<u32>,
    confirm_window: Option<usize>,
    ready_timeout_secs: Option<f64>,
    cooldown_secs: Option<f64>,
    thumb_reference: Option<usize>,
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_from(path, |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file if present, then `GESTURE__*` variables.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
        if let Some(v) = file_cfg.api_url {
            settings.api_url = v;
        }
        if let Some(v) = file_cfg.dry_run {
            settings.dry_run = v;
        }
        if let Some(v) = file_cfg.target_fps {
            settings.target_fps = v;
        }
        if let Some(v) = file_cfg.fist_threshold {
            settings.fist_threshold = v;
        }
        if let Some(v) = file_cfg.confirm_window {
            settings.confirm_window = v;
        }
        if let Some(v) = file_cfg.ready_timeout_secs {
            settings.ready_timeout_secs = v;
        }
        if let Some(v) = file_cfg.cooldown_secs {
            settings.cooldown_secs = v;
        }
        if let Some(v) = file_cfg.thumb_reference {
            settings.thumb_reference = v;
        }
    }

    if let Some(v) = env("GESTURE__API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("GESTURE__DRY_RUN") {
        settings.dry_run = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }
    if let Some(v) = env("GESTURE__TARGET_FPS") {
        settings.target_fps = parse_env("GESTURE__TARGET_FPS", &v)?;
    }
    if let Some(v) = env("GESTURE__FIST_THRESHOLD") {
        settings.fist_threshold = parse_env("GESTURE__FIST_THRESHOLD", &v)?;
    }
    if let Some(v) = env("GESTURE__CONFIRM_WINDOW") {
        settings.confirm_window = parse_env("GESTURE__CONFIRM_WINDOW", &v)?;
    }
    if let Some(v) = env("GESTURE__READY_TIMEOUT_SECS") {
        settings.ready_timeout_secs = parse_env("GESTURE__READY_TIMEOUT_SECS", &v)?;
    }
    if let Some(v) = env("GESTURE__COOLDOWN_SECS") {
        settings.cooldown_secs = parse_env("GESTURE__COOLDOWN_SECS", &v)?;
    }

    Ok(settings)
}

fn parse_env<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value: '{raw}'"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;

pub const SETTINGS_FILE: &str = "bridge.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind_addr: String,
    pub serial_port: PathBuf,
    pub baud_rate: u32,
    pub codes_file: PathBuf,
    pub settle: Duration,
    pub read_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".into(),
            serial_port: "/dev/ttyACM0".into(),
            baud_rate: 115_200,
            codes_file: "remote_codes.json".into(),
            settle: Duration::from_secs(2),
            read_timeout: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    bind_addr: Option<String>,
    serial_port: Option<PathBuf>,
    baud_rate: Option<u32>,
    codes_file: Option<PathBuf>,
    settle_ms: Option<u64>,
    read_timeout_ms: Option<u64>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file if present, then `BRIDGE__*` variables.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
        if let Some(v) = file_cfg.bind_addr {
            settings.bind_addr = v;
        }
        if let Some(v) = file_cfg.serial_port {
            settings.serial_port = v;
        }
        if let Some(v) = file_cfg.baud_rate {
            settings.baud_rate = v;
        }
        if let Some(v) = file_cfg.codes_file {
            settings.codes_file = v;
        }
        if let Some(v) = file_cfg.settle_ms {
            settings.settle = Duration::from_millis(v);
        }
        if let Some(v) = file_cfg.read_timeout_ms {
            settings.read_timeout = Duration::from_millis(v);
        }
    }

    if let Some(v) = env("BRIDGE__BIND_ADDR") {
        settings.bind_addr = v;
    }
    if let Some(v) = env("BRIDGE__SERIAL_PORT") {
        settings.serial_port = v.into();
    }
    if let Some(v) = env("BRIDGE__BAUD_RATE") {
        settings.baud_rate = v
            .parse()
            .with_context(|| format!("BRIDGE__BAUD_RATE is not a number: '{v}'"))?;
    }
    if let Some(v) = env("BRIDGE__CODES_FILE") {
        settings.codes_file = v.into();
    }
    if let Some(v) = env("BRIDGE__SETTLE_MS") {
        let ms = v
            .parse()
            .with_context(|| format!("BRIDGE__SETTLE_MS is not a number: '{v}'"))?;
        settings.settle = Duration::from_millis(ms);
    }
    if let Some(v) = env("BRIDGE__READ_TIMEOUT_MS") {
        let ms = v
            .parse()
            .with_context(|| format!("BRIDGE__READ_TIMEOUT_MS is not a number: '{v}'"))?;
        settings.read_timeout = Duration::from_millis(ms);
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

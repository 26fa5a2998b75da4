//! RF code table: button name → transmitter code.
//!
//! The table is a JSON object read from disk on every lookup, so it can be
//! edited while the bridge is running.

use std::{collections::BTreeMap, fmt, path::Path};

use serde::Deserialize;
use tracing::error;

const DEFAULT_PROTOCOL: u32 = 1;
const DEFAULT_PULSE_LENGTH: u32 = 150;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RfCode {
    Number(u64),
    Text(String),
}

impl fmt::Display for RfCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CodeEntry {
    pub code: RfCode,
    #[serde(default = "default_protocol")]
    pub protocol: u32,
    #[serde(default = "default_pulse_length", rename = "pulselength")]
    pub pulse_length: u32,
}

fn default_protocol() -> u32 {
    DEFAULT_PROTOCOL
}

fn default_pulse_length() -> u32 {
    DEFAULT_PULSE_LENGTH
}

impl CodeEntry {
    /// Line sent to the transmitter board: `code,protocol,pulselength\n`.
    pub fn serial_line(&self) -> String {
        format!("{},{},{}\n", self.code, self.protocol, self.pulse_length)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    entries: BTreeMap<String, CodeEntry>,
}

impl CodeTable {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            entries: serde_json::from_str(raw)?,
        })
    }

    /// A missing or unreadable file yields an empty table.
    pub async fn load(path: &Path) -> Self {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(err) => {
                error!(path = %path.display(), error = %err, "code table not readable");
                return Self::default();
            }
        };
        Self::parse(&raw).unwrap_or_else(|err| {
            error!(path = %path.display(), error = %err, "code table is not valid JSON");
            Self::default()
        })
    }

    /// Exact name first, then the upper-cased name.
    pub fn lookup(&self, button: &str) -> Option<(&str, &CodeEntry)> {
        self.entries
            .get_key_value(button)
            .or_else(|| self.entries.get_key_value(&button.to_uppercase()))
            .map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn buttons(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

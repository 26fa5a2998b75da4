use serde::{Deserialize, Serialize};

/// Body of `POST /api/control`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlRequest {
    #[serde(default)]
    pub button: Option<String>,
}

impl ControlRequest {
    pub fn for_button(button: impl Into<String>) -> Self {
        Self {
            button: Some(button.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlResponse {
    pub status: String,
    pub message: String,
    #[serde(rename = "pico_response")]
    pub device_response: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub serial_connected: bool,
}

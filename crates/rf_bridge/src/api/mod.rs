use std::{path::PathBuf, sync::Arc};

use shared::{
    error::{ApiError, ErrorCode},
    protocol::{ControlResponse, HealthResponse, HealthStatus},
};
use tracing::{info, warn};

use crate::{
    codes::CodeTable,
    serial::{SendError, SerialManager},
};

#[derive(Clone)]
pub struct BridgeContext {
    pub codes_file: PathBuf,
    pub serial: Arc<SerialManager>,
}

pub fn control_route() -> &'static str {
    "/api/control"
}

pub fn health_route() -> &'static str {
    "/health"
}

/// Look up `button` in the code table and transmit it.
pub async fn control_outlet(
    ctx: &BridgeContext,
    button: Option<&str>,
) -> Result<ControlResponse, ApiError> {
    let button = button
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| ApiError::new(ErrorCode::Validation, "no button specified"))?;

    let codes = CodeTable::load(&ctx.codes_file).await;
    if codes.is_empty() {
        warn!(path = %ctx.codes_file.display(), "code table is empty");
    }
    let Some((_, entry)) = codes.lookup(button) else {
        let available: Vec<String> = codes.buttons().map(str::to_string).collect();
        return Err(
            ApiError::new(ErrorCode::NotFound, format!("button '{button}' not found"))
                .with_available_buttons(available),
        );
    };

    let device_response = ctx
        .serial
        .send(&entry.serial_line())
        .await
        .map_err(|err| match err {
            SendError::Unavailable(e) => ApiError::new(
                ErrorCode::Unavailable,
                format!("serial connection unavailable: {e}"),
            ),
            SendError::Failed(e) => {
                ApiError::new(ErrorCode::Internal, format!("failed to send command: {e}"))
            }
        })?;

    info!(%button, "command transmitted");
    Ok(ControlResponse {
        status: "success".into(),
        message: format!("Sent {button}"),
        device_response,
    })
}

pub async fn health(ctx: &BridgeContext) -> HealthResponse {
    let serial_connected = ctx.serial.is_connected();
    HealthResponse {
        status: if serial_connected {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        },
        serial_connected,
    }
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;

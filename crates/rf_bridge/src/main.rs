use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{ControlRequest, ControlResponse, HealthResponse},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod codes;
mod config;
mod serial;

#[cfg(test)]
#[path = "tests/fakes.rs"]
mod fakes;

use api::{control_outlet, control_route, health, health_route, BridgeContext};
use config::load_settings;
use serial::{DeviceConnector, SerialManager};

#[derive(Clone)]
struct AppState {
    bridge: BridgeContext,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings()?;
    info!(
        port = %settings.serial_port.display(),
        baud = settings.baud_rate,
        codes = %settings.codes_file.display(),
        "starting rf bridge"
    );

    let serial = Arc::new(SerialManager::new(Arc::new(DeviceConnector {
        path: settings.serial_port.clone(),
        baud_rate: settings.baud_rate,
        settle: settings.settle,
        read_timeout: settings.read_timeout,
    })));
    if !serial.connect().await {
        warn!("transmitter not connected yet; will retry on first command");
    }

    let state = AppState {
        bridge: BridgeContext {
            codes_file: settings.codes_file,
            serial,
        },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "bridge listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(health_route(), get(http_health))
        .route(control_route(), post(http_control))
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Unavailable | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn http_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(health(&state.bridge).await)
}

async fn http_control(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ControlRequest>,
) -> Result<Json<ControlResponse>, (StatusCode, Json<ApiError>)> {
    control_outlet(&state.bridge, req.button.as_deref())
        .await
        .map(Json)
        .map_err(|e| (status_for(e.code), Json(e)))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

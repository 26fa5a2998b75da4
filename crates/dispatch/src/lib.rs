//! Delivery of committed light toggles to the RF bridge.
//!
//! Delivery is fire-and-forget: [`spawn_dispatch`] detaches the request and
//! only logs its outcome, so the processing loop never waits on the network
//! and a failed delivery never feeds back into gesture state.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use shared::{domain::LightCommand, protocol::ControlRequest};
use thiserror::Error;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{error, info, warn};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api/control";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("request to bridge failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("bridge rejected '{button}' with status {status}: {body}")]
    Rejected {
        button: String,
        status: u16,
        body: String,
    },
}

#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    /// Deliver one command; returns the button name that was sent.
    async fn dispatch(&self, command: LightCommand) -> Result<String, DispatchError>;
}

pub struct HttpDispatcher {
    http: Client,
    api_url: String,
}

impl HttpDispatcher {
    pub fn new(api_url: impl Into<String>) -> Result<Self, DispatchError> {
        Self::with_timeout(api_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        api_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DispatchError> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            api_url: api_url.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl CommandDispatcher for HttpDispatcher {
    async fn dispatch(&self, command: LightCommand) -> Result<String, DispatchError> {
        let button = command.button_name();
        let res = self
            .http
            .post(&self.api_url)
            .json(&ControlRequest::for_button(button.clone()))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected {
                button,
                status: status.as_u16(),
                body,
            });
        }
        Ok(button)
    }
}

/// Logs commands instead of sending them.
#[derive(Default)]
pub struct DryRunDispatcher {
    sent: Mutex<Vec<LightCommand>>,
}

impl DryRunDispatcher {
    pub async fn sent(&self) -> Vec<LightCommand> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl CommandDispatcher for DryRunDispatcher {
    async fn dispatch(&self, command: LightCommand) -> Result<String, DispatchError> {
        let button = command.button_name();
        info!(%button, "dry run: command not sent");
        self.sent.lock().await.push(command);
        Ok(button)
    }
}

/// Hand `command` to `dispatcher` on a detached task.
pub fn spawn_dispatch(
    dispatcher: Arc<dyn CommandDispatcher>,
    command: LightCommand,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let button = command.button_name();
        info!(%button, "sending command");
        match dispatcher.dispatch(command).await {
            Ok(_) => info!(%button, "command delivered"),
            Err(DispatchError::Rejected { status, body, .. }) => {
                warn!(%button, status, %body, "bridge rejected command")
            }
            Err(err) => error!(%button, error = %err, "command delivery failed"),
        }
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

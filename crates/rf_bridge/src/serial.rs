//! Persistent link to the RF transmitter board.
//!
//! The board takes one `code,protocol,pulselength` line per command and
//! answers with a short text ending in `Done.`. [`SerialManager`] keeps a
//! single open link, reconnects lazily when it is missing and drops it after
//! any write failure so the next request starts from a fresh connection.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Context;
use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::Mutex,
    time::Instant,
};
use tokio_serial::SerialPortBuilderExt;
use tracing::{error, info, warn};

pub const REPLY_TERMINATOR: &[u8] = b"Done.";

#[async_trait]
pub trait SerialLink: Send {
    /// Write one command line and return the board's reply.
    async fn send(&mut self, line: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait SerialConnector: Send + Sync {
    async fn connect(&self) -> anyhow::Result<Box<dyn SerialLink>>;
    fn describe(&self) -> String;
}

/// A link over any byte stream: a tty device in production, an in-memory
/// pipe in tests.
pub struct DeviceLink<P> {
    port: P,
    read_timeout: Duration,
}

impl<P> DeviceLink<P>
where
    P: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(port: P, read_timeout: Duration) -> Self {
        Self { port, read_timeout }
    }

    /// Read until the terminator shows up, the stream ends or the timeout
    /// elapses; whatever arrived is returned.
    async fn read_reply(&mut self) -> std::io::Result<String> {
        let deadline = Instant::now() + self.read_timeout;
        let mut reply = Vec::new();
        let mut buf = [0u8; 64];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, self.port.read(&mut buf)).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(n)) => {
                    reply.extend_from_slice(&buf[..n]);
                    if reply
                        .windows(REPLY_TERMINATOR.len())
                        .any(|w| w == REPLY_TERMINATOR)
                    {
                        break;
                    }
                }
                Ok(Err(err)) => return Err(err),
            }
        }
        Ok(String::from_utf8_lossy(&reply).trim().to_string())
    }
}

#[async_trait]
impl<P> SerialLink for DeviceLink<P>
where
    P: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, line: &str) -> anyhow::Result<String> {
        self.port
            .write_all(line.as_bytes())
            .await
            .context("write to transmitter failed")?;
        self.port.flush().await.context("flush to transmitter failed")?;
        let reply = self
            .read_reply()
            .await
            .context("read from transmitter failed")?;
        Ok(reply)
    }
}

/// Opens the board's serial port at `baud_rate` and waits for it to settle.
pub struct DeviceConnector {
    pub path: PathBuf,
    pub baud_rate: u32,
    pub settle: Duration,
    pub read_timeout: Duration,
}

#[async_trait]
impl SerialConnector for DeviceConnector {
    async fn connect(&self) -> anyhow::Result<Box<dyn SerialLink>> {
        let port = tokio_serial::new(self.path.to_string_lossy(), self.baud_rate)
            .timeout(self.read_timeout)
            .open_native_async()
            .with_context(|| format!("could not open {}", self.path.display()))?;
        // opening the port resets the board
        tokio::time::sleep(self.settle).await;
        Ok(Box::new(DeviceLink::new(port, self.read_timeout)))
    }

    fn describe(&self) -> String {
        format!("{} @ {} baud", self.path.display(), self.baud_rate)
    }
}

#[derive(Debug)]
pub enum SendError {
    /// No link could be established.
    Unavailable(anyhow::Error),
    /// The link failed mid-command and has been dropped.
    Failed(anyhow::Error),
}

pub struct SerialManager {
    connector: Arc<dyn SerialConnector>,
    link: Mutex<Option<Box<dyn SerialLink>>>,
    /// Mirrors `link.is_some()` so health checks never queue behind a send.
    connected: AtomicBool,
}

impl SerialManager {
    pub fn new(connector: Arc<dyn SerialConnector>) -> Self {
        Self {
            connector,
            link: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    /// Try to open the link now; failure is logged and left for the next request.
    pub async fn connect(&self) -> bool {
        let mut link = self.link.lock().await;
        self.ensure_link(&mut link).await.is_ok()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub async fn send(&self, line: &str) -> Result<String, SendError> {
        let mut guard = self.link.lock().await;
        if guard.is_none() {
            warn!("serial link is down; reconnecting");
        }
        let link = self
            .ensure_link(&mut guard)
            .await
            .map_err(SendError::Unavailable)?;

        info!(command = line.trim_end(), "sending to transmitter");
        match link.send(line).await {
            Ok(reply) => {
                info!(%reply, "transmitter replied");
                Ok(reply)
            }
            Err(err) => {
                error!(error = %err, "serial write failed; dropping link");
                *guard = None;
                self.connected.store(false, Ordering::SeqCst);
                Err(SendError::Failed(err))
            }
        }
    }

    async fn ensure_link<'a>(
        &self,
        slot: &'a mut Option<Box<dyn SerialLink>>,
    ) -> anyhow::Result<&'a mut Box<dyn SerialLink>> {
        if slot.is_none() {
            let target = self.connector.describe();
            info!(%target, "connecting to transmitter");
            match self.connector.connect().await {
                Ok(link) => {
                    info!(%target, "serial link established");
                    *slot = Some(link);
                    self.connected.store(true, Ordering::SeqCst);
                }
                Err(err) => {
                    error!(%target, error = %err, "could not connect to transmitter");
                    return Err(err);
                }
            }
        }
        slot.as_mut().context("serial link missing after connect")
    }
}

#[cfg(test)]
#[path = "tests/serial_tests.rs"]
mod tests;

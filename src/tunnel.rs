//! Tunnel interface control
//!
//! The warden restarts the tunnel through [`TunnelControl`]. The real
//! implementation shells out to `wg-quick down|up <interface>`.

use std::future::Future;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::manifest::RecoveryConfig;

/// Brings a tunnel interface down and up
#[async_trait]
pub trait TunnelControl: Send + Sync {
    async fn stop(&self, interface: &str) -> Result<()>;
    async fn start(&self, interface: &str) -> Result<()>;
}

/// Restart an interface: stop, then start.
///
/// A failed stop is logged and the start is attempted anyway. Only a failed
/// start is reported to the caller.
pub async fn restart(control: &dyn TunnelControl, interface: &str) -> Result<()> {
    match control.stop(interface).await {
        Ok(()) => info!(interface, "stopped tunnel interface"),
        Err(e) => warn!(interface, error = %e, "stopping tunnel interface failed"),
    }

    control.start(interface).await?;
    info!(interface, "started tunnel interface");

    Ok(())
}

/// `wg-quick` backed tunnel control
#[derive(Debug, Clone)]
pub struct WgQuick {
    program: String,
    timeout: Option<Duration>,
}

impl WgQuick {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn from_config(config: &RecoveryConfig) -> Self {
        let wg = Self::new(config.command.clone());
        match config.timeout_duration() {
            Some(limit) => wg.with_timeout(limit),
            None => wg,
        }
    }

    /// Bound each invocation; the child is killed when the bound expires
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn run(&self, action: &str, interface: &str) -> Result<()> {
        let label = format!("{} {} {}", self.program, action, interface);

        let mut cmd = Command::new(&self.program);
        cmd.arg(action)
            .arg(interface)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = bounded(&label, self.timeout, cmd.output())
            .await?
            .map_err(|e| Error::CommandFailed {
                command: label.clone(),
                message: e.to_string(),
            })?;

        check_status(&label, &output)
    }
}

#[async_trait]
impl TunnelControl for WgQuick {
    async fn stop(&self, interface: &str) -> Result<()> {
        self.run("down", interface).await
    }

    async fn start(&self, interface: &str) -> Result<()> {
        self.run("up", interface).await
    }
}

/// Await `fut`, giving up after `timeout` when one is set
async fn bounded<F: Future>(label: &str, timeout: Option<Duration>, fut: F) -> Result<F::Output> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::CommandTimeout {
                command: label.to_string(),
                seconds: limit.as_secs(),
            }),
        None => Ok(fut.await),
    }
}

fn check_status(label: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = match stderr.lines().rev().find(|l| !l.trim().is_empty()) {
        Some(line) => line.trim().to_string(),
        None => match output.status.code() {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        },
    };

    Err(Error::CommandFailed {
        command: label.to_string(),
        message,
    })
}

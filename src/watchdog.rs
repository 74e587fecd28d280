//! Watchdog wiring
//!
//! Connects the health prober to the warden through the handoff channel and
//! runs both as tokio tasks on one cancellation token. Neither task is
//! restarted if it dies; the watchdog just reports the failure.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::connection::ConnectionState;
use crate::error::{Error, Result};
use crate::handoff;
use crate::manifest::WatchConfig;
use crate::sickbay::{HealthProber, Pinger, SystemPing};
use crate::tunnel::{TunnelControl, WgQuick};
use crate::warden::{Warden, WardenReport};

/// Final state of both loops after shutdown
#[derive(Debug)]
pub struct WatchdogSummary {
    pub connection: ConnectionState,
    pub warden: WardenReport,
}

/// Prober + warden pair for one tunnel
pub struct Watchdog {
    config: WatchConfig,
    pinger: Arc<dyn Pinger>,
    tunnel: Arc<dyn TunnelControl>,
}

impl Watchdog {
    /// Watchdog using the system `ping` and `wg-quick`
    pub fn from_config(config: WatchConfig) -> Self {
        let pinger = Arc::new(SystemPing::new(config.probe.program.clone()));
        let tunnel = Arc::new(WgQuick::from_config(&config.recovery));
        Self::with_transports(config, pinger, tunnel)
    }

    pub fn with_transports(
        config: WatchConfig,
        pinger: Arc<dyn Pinger>,
        tunnel: Arc<dyn TunnelControl>,
    ) -> Self {
        Self {
            config,
            pinger,
            tunnel,
        }
    }

    /// Run both loops until `token` is cancelled, then wait for them to finish
    pub async fn run(self, token: CancellationToken) -> Result<WatchdogSummary> {
        let (tx, rx) = handoff::channel();

        let state = ConnectionState::new(&self.config.target, &self.config.interface);
        let prober = HealthProber::new(state, &self.config.probe, self.pinger, tx);
        let warden = Warden::new(
            rx,
            self.tunnel,
            &self.config.interface,
            self.config.recovery.threshold,
        );

        info!(
            host = %self.config.target,
            interface = %self.config.interface,
            "tunnel keepalive started"
        );

        let prober_task = tokio::spawn(prober.run(token.clone()));
        let warden_task = tokio::spawn(warden.run(token));

        let (connection, warden) = tokio::join!(prober_task, warden_task);
        let connection = connection.map_err(|e| Error::TaskFailed(format!("prober: {}", e)))?;
        let warden = warden.map_err(|e| Error::TaskFailed(format!("warden: {}", e)))?;

        Ok(WatchdogSummary { connection, warden })
    }
}

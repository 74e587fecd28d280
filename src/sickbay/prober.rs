//! Health prober loop
//!
//! Probes the tunnel peer on a fixed cadence, records the outcome in the
//! connection state and hands the classification to the warden. The next
//! cycle does not start until the warden has taken the previous one.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connection::ConnectionState;
use crate::handoff::HandoffSender;
use crate::manifest::ProbeConfig;
use crate::sickbay::probe::{PingStats, Pinger};

/// What a single probe produced
enum Outcome {
    Replied(PingStats),
    Lost(PingStats),
    Failed(String),
}

impl Outcome {
    fn is_reachable(&self) -> bool {
        matches!(self, Outcome::Replied(_))
    }
}

/// Periodic reachability prober for one tunnel peer
pub struct HealthProber {
    state: ConnectionState,
    pinger: Arc<dyn Pinger>,
    handoff: HandoffSender,
    interval: Duration,
    count: u32,
    timeout: Duration,
}

impl HealthProber {
    pub fn new(
        state: ConnectionState,
        config: &ProbeConfig,
        pinger: Arc<dyn Pinger>,
        handoff: HandoffSender,
    ) -> Self {
        Self {
            state,
            pinger,
            handoff,
            interval: config.interval_duration(),
            count: config.count,
            timeout: config.timeout_duration(),
        }
    }

    /// Run until cancelled or until the warden goes away.
    ///
    /// Returns the final connection state. The first probe fires one full
    /// interval after start.
    pub async fn run(mut self, token: CancellationToken) -> ConnectionState {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(
            target_addr = self.state.target(),
            interface = self.state.interface(),
            interval_secs = self.interval.as_secs(),
            "health prober started"
        );

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                outcome = self.probe() => outcome,
            };

            let classification = self.state.record(outcome.is_reachable());
            self.report(&outcome);

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                sent = self.handoff.send(classification) => {
                    if sent.is_err() {
                        info!("warden is gone, stopping health prober");
                        break;
                    }
                }
            }
        }

        info!(target_addr = self.state.target(), "health prober stopped");
        self.state
    }

    async fn probe(&self) -> Outcome {
        match self
            .pinger
            .ping(self.state.target(), self.count, self.timeout)
            .await
        {
            Ok(stats) if stats.is_reachable() => Outcome::Replied(stats),
            Ok(stats) => Outcome::Lost(stats),
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }

    fn report(&self, outcome: &Outcome) {
        let target = self.state.target();
        let failures = self.state.consecutive_failures();
        match outcome {
            Outcome::Replied(stats) => info!(
                target_addr = target,
                sent = stats.sent,
                received = stats.received,
                loss = stats.loss_percent,
                "status check passed"
            ),
            Outcome::Lost(stats) => warn!(
                target_addr = target,
                sent = stats.sent,
                received = stats.received,
                failures,
                "status check failed: no echo replies"
            ),
            Outcome::Failed(error) => warn!(
                target_addr = target,
                %error,
                failures,
                "status check failed"
            ),
        }
    }
}

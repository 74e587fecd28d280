//! The Warden - Tunnel Recovery Supervisor
//!
//! Consumes classifications from the health prober and restarts the tunnel
//! interface once consecutive failures exceed the threshold:
//! - Reachable classifications never trigger a restart
//! - A failed restart is logged; the next failing probe retries it
//! - No cooldown beyond the probe interval itself

pub mod state;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::connection::Classification;
use crate::handoff::HandoffReceiver;
use crate::tunnel::{self, TunnelControl};
use state::{Link, LinkState};

/// Restart is due when the peer is unreachable and the failure count,
/// including this probe, is above the threshold
pub fn should_remediate(classification: &Classification, threshold: u32) -> bool {
    !classification.reachable && classification.consecutive_failures > threshold
}

/// Counters reported when the warden stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WardenReport {
    /// Classifications received
    pub classifications: u64,
    /// Restart attempts made
    pub restarts: u64,
    /// Restart attempts whose start step failed
    pub failed_restarts: u64,
}

/// The Warden supervises one tunnel interface
pub struct Warden {
    /// Classifications from the prober
    handoff: HandoffReceiver,
    /// Restart mechanism
    tunnel: Arc<dyn TunnelControl>,
    interface: String,
    threshold: u32,
    link: Link,
    report: WardenReport,
}

impl Warden {
    pub fn new(
        handoff: HandoffReceiver,
        tunnel: Arc<dyn TunnelControl>,
        interface: impl Into<String>,
        threshold: u32,
    ) -> Self {
        Self {
            handoff,
            tunnel,
            interface: interface.into(),
            threshold,
            link: Link::new(),
            report: WardenReport::default(),
        }
    }

    /// Current link state
    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    /// Run the Warden event loop until cancelled or the prober goes away
    ///
    /// This should be spawned as a tokio task
    pub async fn run(mut self, token: CancellationToken) -> WardenReport {
        info!(
            interface = %self.interface,
            threshold = self.threshold,
            "starting recovery supervisor"
        );

        loop {
            let classification = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                next = self.handoff.recv() => match next {
                    Some(c) => c,
                    None => {
                        info!("classification channel closed");
                        break;
                    }
                },
            };

            self.handle(classification).await;
        }

        info!(
            interface = %self.interface,
            link = %self.link_state(),
            restarts = self.report.restarts,
            "recovery supervisor stopped"
        );
        self.report
    }

    /// Apply one classification
    pub async fn handle(&mut self, classification: Classification) {
        self.report.classifications += 1;

        if classification.reachable {
            if self.link.state() != LinkState::Healthy {
                self.link.recover().ok();
                info!(interface = %self.interface, "tunnel peer reachable again");
            }
            return;
        }

        if self.link.state() == LinkState::Healthy {
            self.link.degrade().ok();
            debug!(interface = %self.interface, "tunnel degrading");
        }

        if !should_remediate(&classification, self.threshold) {
            return;
        }

        self.link.escalate().ok();
        self.report.restarts += 1;
        warn!(
            interface = %self.interface,
            failures = classification.consecutive_failures,
            threshold = self.threshold,
            "failure threshold exceeded, restarting tunnel interface"
        );

        match tunnel::restart(self.tunnel.as_ref(), &self.interface).await {
            Ok(()) => info!(interface = %self.interface, "restarted tunnel interface"),
            Err(e) => {
                self.report.failed_restarts += 1;
                error!(
                    interface = %self.interface,
                    error = %e,
                    "restarting tunnel interface failed"
                );
            }
        }

        self.link.settle().ok();
    }
}

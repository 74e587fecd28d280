//! Connection state of the monitored tunnel
//!
//! `ConnectionState` has exactly one writer, the health prober. Everything the
//! warden learns about the tunnel arrives as an immutable [`Classification`].

/// Outcome of one probe cycle, as handed to the warden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Whether the peer answered at least one echo request
    pub reachable: bool,
    /// Consecutive unreachable cycles, including this one
    pub consecutive_failures: u32,
}

impl Classification {
    pub fn reachable() -> Self {
        Self {
            reachable: true,
            consecutive_failures: 0,
        }
    }

    pub fn unreachable(consecutive_failures: u32) -> Self {
        Self {
            reachable: false,
            consecutive_failures,
        }
    }
}

/// Last known liveness of the tunnel peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionState {
    reachable: bool,
    consecutive_failures: u32,
    target: String,
    interface: String,
}

impl ConnectionState {
    /// Create the state for a target/interface pair.
    ///
    /// Starts unconfirmed (`reachable == false`) with no failures recorded.
    pub fn new(target: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            reachable: false,
            consecutive_failures: 0,
            target: target.into(),
            interface: interface.into(),
        }
    }

    /// Record one probe outcome and return the event to publish
    pub fn record(&mut self, reachable: bool) -> Classification {
        self.reachable = reachable;
        if reachable {
            self.consecutive_failures = 0;
            Classification::reachable()
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            Classification::unreachable(self.consecutive_failures)
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }
}

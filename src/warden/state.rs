//! Tunnel link state machine
//!
//! Tracks how the warden sees the tunnel between classifications, using the
//! state-machines crate in dynamic dispatch mode.

use state_machines::state_machine;

state_machine! {
    name: LinkMachine,
    dynamic: true,
    initial: Healthy,
    states: [Healthy, Degrading, Remediating],
    events {
        degrade {
            transition: { from: Healthy, to: Degrading }
        }
        escalate {
            transition: { from: Degrading, to: Remediating }
        }
        settle {
            transition: { from: Remediating, to: Degrading }
        }
        recover {
            transition: { from: [Degrading, Remediating], to: Healthy }
        }
    }
}

/// Simple state enum for external use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Healthy,
    Degrading,
    Remediating,
}

impl LinkState {
    /// Parse state from its machine name
    pub fn from_name(s: &str) -> Self {
        match s {
            "Degrading" => LinkState::Degrading,
            "Remediating" => LinkState::Remediating,
            _ => LinkState::Healthy,
        }
    }
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkState::Healthy => write!(f, "healthy"),
            LinkState::Degrading => write!(f, "degrading"),
            LinkState::Remediating => write!(f, "remediating"),
        }
    }
}

/// Link lifecycle as seen by the warden
pub struct Link {
    machine: DynamicLinkMachine<()>,
}

impl Link {
    pub fn new() -> Self {
        Self {
            machine: LinkMachine::new(()).into_dynamic(),
        }
    }

    pub fn state(&self) -> LinkState {
        LinkState::from_name(self.machine.current_state())
    }

    /// First failure after a healthy stretch
    pub fn degrade(&mut self) -> Result<(), state_machines::DynamicError> {
        self.machine.handle(LinkMachineEvent::Degrade)
    }

    /// Failure threshold crossed, restart under way
    pub fn escalate(&mut self) -> Result<(), state_machines::DynamicError> {
        self.machine.handle(LinkMachineEvent::Escalate)
    }

    /// Restart finished, waiting for the next probe to judge it
    pub fn settle(&mut self) -> Result<(), state_machines::DynamicError> {
        self.machine.handle(LinkMachineEvent::Settle)
    }

    /// Peer answered again
    pub fn recover(&mut self) -> Result<(), state_machines::DynamicError> {
        self.machine.handle(LinkMachineEvent::Recover)
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let machine = LinkMachine::new(()).into_dynamic();
        assert_eq!(machine.current_state(), "Healthy");
        assert_eq!(Link::new().state(), LinkState::Healthy);
    }

    #[test]
    fn test_remediation_cycle() {
        let mut link = Link::new();

        link.degrade().unwrap();
        assert_eq!(link.state(), LinkState::Degrading);

        link.escalate().unwrap();
        assert_eq!(link.state(), LinkState::Remediating);

        link.settle().unwrap();
        assert_eq!(link.state(), LinkState::Degrading);

        link.recover().unwrap();
        assert_eq!(link.state(), LinkState::Healthy);
    }

    #[test]
    fn test_recover_from_remediating() {
        let mut link = Link::new();
        link.degrade().unwrap();
        link.escalate().unwrap();
        link.recover().unwrap();
        assert_eq!(link.state(), LinkState::Healthy);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut link = Link::new();
        // Healthy links cannot escalate or recover
        assert!(link.escalate().is_err());
        assert!(link.recover().is_err());
        assert_eq!(link.state(), LinkState::Healthy);

        link.degrade().unwrap();
        assert!(link.degrade().is_err());
        assert!(link.settle().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(LinkState::Healthy.to_string(), "healthy");
        assert_eq!(LinkState::Degrading.to_string(), "degrading");
        assert_eq!(LinkState::Remediating.to_string(), "remediating");
    }
}

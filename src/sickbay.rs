//! Health monitoring for the tunnel peer
//!
//! Provides:
//! - The reachability probe transport (system `ping`)
//! - The periodic health prober feeding the warden

pub mod probe;
pub mod prober;

pub use probe::{Pinger, SystemPing};
pub use prober::HealthProber;

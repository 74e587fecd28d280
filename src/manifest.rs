//! Configuration for tunnelwatch
//!
//! Parses an optional `tunnelwatch.toml` using serde. Every key has a
//! default, and command-line flags override whatever the file says.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Interface restarted when the peer stops answering
pub const DEFAULT_INTERFACE: &str = "wg0";
/// Tunnel peer address probed each cycle
pub const DEFAULT_TARGET: &str = "10.0.0.1";
/// Seconds between probe cycles
pub const DEFAULT_PROBE_INTERVAL: u64 = 30;
/// Echo requests per probe
pub const DEFAULT_PROBE_COUNT: u32 = 3;
/// Seconds a probe may take in total
pub const DEFAULT_PROBE_TIMEOUT: u64 = 5;
/// Consecutive failures tolerated before restarting
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
/// Seconds each restart command may run (0 = unbounded)
pub const DEFAULT_RESTART_TIMEOUT: u64 = 60;

const DEFAULT_PING_PROGRAM: &str = "ping";
const DEFAULT_RESTART_COMMAND: &str = "wg-quick";

/// Load configuration from a file
pub fn load(path: &Path) -> Result<WatchConfig> {
    let content = fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: WatchConfig = toml::from_str(&content)?;
    config.validate()?;

    Ok(config)
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchConfig {
    /// Tunnel interface to restart
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Address probed for liveness
    #[serde(default = "default_target")]
    pub target: String,

    /// Probe settings
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Recovery settings
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            target: default_target(),
            probe: ProbeConfig::default(),
            recovery: RecoveryConfig::default(),
        }
    }
}

impl WatchConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.interface.trim().is_empty() {
            return Err(Error::ConfigValidation("interface must not be empty".into()));
        }
        if self.target.trim().is_empty() {
            return Err(Error::ConfigValidation("target must not be empty".into()));
        }
        if self.probe.interval == 0 {
            return Err(Error::ConfigValidation(
                "probe.interval must be at least 1 second".into(),
            ));
        }
        if self.probe.count == 0 {
            return Err(Error::ConfigValidation(
                "probe.count must be at least 1".into(),
            ));
        }
        if self.probe.timeout == 0 {
            return Err(Error::ConfigValidation(
                "probe.timeout must be at least 1 second".into(),
            ));
        }
        if self.probe.program.trim().is_empty() {
            return Err(Error::ConfigValidation("probe.program must not be empty".into()));
        }
        if self.recovery.command.trim().is_empty() {
            return Err(Error::ConfigValidation(
                "recovery.command must not be empty".into(),
            ));
        }

        Ok(())
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_interval(mut self, seconds: u64) -> Self {
        self.probe.interval = seconds;
        self
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.recovery.threshold = threshold;
        self
    }

    /// Human-readable listing of the effective settings
    pub fn summary(&self) -> String {
        let restart_timeout = match self.recovery.timeout_duration() {
            Some(d) => format!("{}s", d.as_secs()),
            None => "none".to_string(),
        };
        format!(
            "interface:        {}\n\
             target:           {}\n\
             probe interval:   {}s\n\
             probe count:      {}\n\
             probe timeout:    {}s\n\
             probe program:    {}\n\
             threshold:        {}\n\
             restart command:  {}\n\
             restart timeout:  {}",
            self.interface,
            self.target,
            self.probe.interval,
            self.probe.count,
            self.probe.timeout,
            self.probe.program,
            self.recovery.threshold,
            self.recovery.command,
            restart_timeout,
        )
    }
}

/// Reachability probe settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Seconds between probe cycles
    #[serde(default = "default_probe_interval")]
    pub interval: u64,

    /// Echo requests sent per probe
    #[serde(default = "default_probe_count")]
    pub count: u32,

    /// Total seconds allowed per probe
    #[serde(default = "default_probe_timeout")]
    pub timeout: u64,

    /// ping binary to run
    #[serde(default = "default_ping_program")]
    pub program: String,
}

impl ProbeConfig {
    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval: default_probe_interval(),
            count: default_probe_count(),
            timeout: default_probe_timeout(),
            program: default_ping_program(),
        }
    }
}

/// Tunnel restart settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecoveryConfig {
    /// Restart once consecutive failures exceed this
    #[serde(default = "default_threshold")]
    pub threshold: u32,

    /// Tool invoked as `<command> down|up <interface>`
    #[serde(default = "default_restart_command")]
    pub command: String,

    /// Seconds each restart command may run (0 disables the bound)
    #[serde(default = "default_restart_timeout")]
    pub timeout: u64,
}

impl RecoveryConfig {
    /// Bound for each restart command, if any
    pub fn timeout_duration(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            command: default_restart_command(),
            timeout: default_restart_timeout(),
        }
    }
}

fn default_interface() -> String {
    DEFAULT_INTERFACE.to_string()
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_probe_interval() -> u64 {
    DEFAULT_PROBE_INTERVAL
}

fn default_probe_count() -> u32 {
    DEFAULT_PROBE_COUNT
}

fn default_probe_timeout() -> u64 {
    DEFAULT_PROBE_TIMEOUT
}

fn default_ping_program() -> String {
    DEFAULT_PING_PROGRAM.to_string()
}

fn default_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}

fn default_restart_command() -> String {
    DEFAULT_RESTART_COMMAND.to_string()
}

fn default_restart_timeout() -> u64 {
    DEFAULT_RESTART_TIMEOUT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WatchConfig::default();
        assert_eq!(config.interface, "wg0");
        assert_eq!(config.target, "10.0.0.1");
        assert_eq!(config.probe.interval, 30);
        assert_eq!(config.probe.count, 3);
        assert_eq!(config.probe.timeout, 5);
        assert_eq!(config.recovery.threshold, 3);
        assert_eq!(config.recovery.command, "wg-quick");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_empty_config() {
        let config: WatchConfig = toml::from_str("").unwrap();
        assert_eq!(config.interface, "wg0");
        assert_eq!(config.probe.interval, 30);
        assert_eq!(config.recovery.timeout_duration(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
interface = "wg1"
target = "192.168.77.1"

[probe]
interval = 10
count = 5
timeout = 2
program = "/sbin/ping"

[recovery]
threshold = 6
command = "/usr/local/bin/wg-quick"
timeout = 0
"#;

        let config: WatchConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.interface, "wg1");
        assert_eq!(config.target, "192.168.77.1");
        assert_eq!(config.probe.interval_duration(), Duration::from_secs(10));
        assert_eq!(config.probe.count, 5);
        assert_eq!(config.probe.timeout_duration(), Duration::from_secs(2));
        assert_eq!(config.probe.program, "/sbin/ping");
        assert_eq!(config.recovery.threshold, 6);
        assert_eq!(config.recovery.command, "/usr/local/bin/wg-quick");
        assert_eq!(config.recovery.timeout_duration(), None);
    }

    #[test]
    fn test_partial_table_keeps_defaults() {
        let toml = r#"
[probe]
interval = 15
"#;
        let config: WatchConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.probe.interval, 15);
        assert_eq!(config.probe.count, 3);
        assert_eq!(config.recovery.threshold, 3);
    }

    #[test]
    fn test_overrides() {
        let config = WatchConfig::default()
            .with_interface("wg7")
            .with_target("10.9.0.1")
            .with_interval(5)
            .with_threshold(1);
        assert_eq!(config.interface, "wg7");
        assert_eq!(config.target, "10.9.0.1");
        assert_eq!(config.probe.interval, 5);
        assert_eq!(config.recovery.threshold, 1);
    }

    #[test]
    fn test_validation_rejects_zero_interval() {
        let config = WatchConfig::default().with_interval(0);
        assert!(matches!(config.validate(), Err(Error::ConfigValidation(_))));
    }

    #[test]
    fn test_validation_rejects_empty_names() {
        assert!(WatchConfig::default().with_interface("").validate().is_err());
        assert!(WatchConfig::default().with_target("  ").validate().is_err());

        let mut config = WatchConfig::default();
        config.probe.count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_zero_is_allowed() {
        assert!(WatchConfig::default().with_threshold(0).validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let result = load(Path::new("/nonexistent/tunnelwatch.toml"));
        assert!(matches!(result, Err(Error::ConfigRead { .. })));
    }

    #[test]
    fn test_summary_lists_settings() {
        let summary = WatchConfig::default().summary();
        assert!(summary.contains("wg0"));
        assert!(summary.contains("10.0.0.1"));
        assert!(summary.contains("restart timeout:  60s"));
    }
}

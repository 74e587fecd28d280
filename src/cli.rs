//! Command-line interface for tunnelwatch
//!
//! Uses clap with derive for type-safe CLI parsing

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::manifest::WatchConfig;

/// tunnelwatch - restart a WireGuard interface when its peer stops answering
///
/// `-h` selects the peer address, so help is only available as `--help`.
#[derive(Parser)]
#[command(name = "tunnelwatch")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// WireGuard interface name [default: wg0]
    #[arg(short = 'i', long)]
    pub interface: Option<String>,

    /// Peer address to probe [default: 10.0.0.1]
    #[arg(short = 'h', long = "host")]
    pub host: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seconds between probes
    #[arg(long)]
    pub interval: Option<u64>,

    /// Consecutive failures tolerated before restarting
    #[arg(long)]
    pub threshold: Option<u32>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands (none runs the watchdog)
#[derive(Subcommand)]
pub enum Commands {
    /// Print the effective configuration
    Config {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Apply flag overrides on top of a loaded configuration
    pub fn apply(&self, mut config: WatchConfig) -> WatchConfig {
        if let Some(interface) = &self.interface {
            config = config.with_interface(interface.clone());
        }
        if let Some(host) = &self.host {
            config = config.with_target(host.clone());
        }
        if let Some(interval) = self.interval {
            config = config.with_interval(interval);
        }
        if let Some(threshold) = self.threshold {
            config = config.with_threshold(threshold);
        }
        config
    }

    /// Generate shell completion scripts
    pub fn generate_completion(shell: Shell) {
        let mut cmd = Self::command();
        clap_complete::generate(shell, &mut cmd, "tunnelwatch", &mut std::io::stdout());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from(["tunnelwatch", "-i", "wg3", "-h", "10.8.0.1"]).unwrap();
        assert_eq!(cli.interface.as_deref(), Some("wg3"));
        assert_eq!(cli.host.as_deref(), Some("10.8.0.1"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_defaults_come_from_config() {
        let cli = Cli::try_parse_from(["tunnelwatch"]).unwrap();
        let config = cli.apply(WatchConfig::default());
        assert_eq!(config.interface, "wg0");
        assert_eq!(config.target, "10.0.0.1");
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "tunnelwatch",
            "--interface",
            "wg9",
            "--interval",
            "10",
            "--threshold",
            "5",
        ])
        .unwrap();
        let config = cli.apply(WatchConfig::default().with_target("172.16.0.1"));
        assert_eq!(config.interface, "wg9");
        assert_eq!(config.target, "172.16.0.1");
        assert_eq!(config.probe.interval, 10);
        assert_eq!(config.recovery.threshold, 5);
    }

    #[test]
    fn test_config_subcommand() {
        let cli = Cli::try_parse_from(["tunnelwatch", "-i", "wg2", "config", "--json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Config { json: true })));
        assert_eq!(cli.interface.as_deref(), Some("wg2"));
    }

    #[test]
    fn test_long_help_flag() {
        let err = Cli::try_parse_from(["tunnelwatch", "--help"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}

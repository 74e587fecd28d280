//! tunnelwatch - WireGuard tunnel keepalive
//!
//! Probes the tunnel peer on a fixed interval and restarts the interface
//! with `wg-quick` once too many consecutive probes have failed.

mod cli;
mod connection;
mod error;
mod handoff;
mod manifest;
mod sickbay;
mod tunnel;
mod warden;
mod watchdog;

use cli::{Cli, Commands};
use error::Result;
use manifest::WatchConfig;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();

    if let Some(Commands::Completion { shell }) = cli.command {
        Cli::generate_completion(shell);
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => manifest::load(path)?,
        None => WatchConfig::default(),
    };
    let config = cli.apply(config);

    config.validate()?;

    if let Some(Commands::Config { json }) = cli.command {
        if json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!("{}", config.summary());
        }
        return Ok(());
    }

    init_tracing(cli.verbose);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let token = CancellationToken::new();
        let signals = tokio::spawn(cancel_on_signal(token.clone()));

        let summary = watchdog::Watchdog::from_config(config).run(token).await;
        signals.abort();

        let summary = summary?;
        info!(
            consecutive_failures = summary.connection.consecutive_failures(),
            restarts = summary.warden.restarts,
            failed_restarts = summary.warden.failed_restarts,
            "tunnel keepalive stopped"
        );
        Ok::<(), error::Error>(())
    })
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "info,tunnelwatch=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

/// Cancel `token` on Ctrl+C, or SIGTERM on Unix
async fn cancel_on_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutting down");
    token.cancel();
}

//! Reachability probe transport
//!
//! The prober only needs "send N echo requests, tell me what came back".
//! [`SystemPing`] gets that from the system `ping` binary, which already holds
//! the privileges raw ICMP sockets require.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Extra time granted to the ping process beyond its own deadline
const PROCESS_GRACE: Duration = Duration::from_secs(2);

/// Flag that bounds the total run time of `ping`
#[cfg(target_os = "linux")]
const DEADLINE_FLAG: &str = "-w";
#[cfg(not(target_os = "linux"))]
const DEADLINE_FLAG: &str = "-t";

/// Echo statistics for one probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingStats {
    pub sent: u32,
    pub received: u32,
    pub loss_percent: f64,
}

impl PingStats {
    /// Reachable when at least one reply came back
    pub fn is_reachable(&self) -> bool {
        self.loss_percent < 100.0
    }
}

/// Sends echo requests to an address
#[async_trait]
pub trait Pinger: Send + Sync {
    async fn ping(&self, target: &str, count: u32, timeout: Duration) -> Result<PingStats>;
}

/// Pinger backed by the system `ping` command
#[derive(Debug, Clone)]
pub struct SystemPing {
    program: String,
}

impl SystemPing {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Pinger for SystemPing {
    async fn ping(&self, target: &str, count: u32, timeout: Duration) -> Result<PingStats> {
        let deadline = timeout.as_secs().max(1);

        let mut cmd = Command::new(&self.program);
        cmd.arg("-c")
            .arg(count.to_string())
            .arg(DEADLINE_FLAG)
            .arg(deadline.to_string())
            .arg(target)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(timeout + PROCESS_GRACE, cmd.output()).await {
            Ok(result) => result.map_err(|e| Error::ProbeFailed {
                target: target.to_string(),
                message: format!("failed to run {}: {}", self.program, e),
            })?,
            Err(_) => {
                return Err(Error::ProbeFailed {
                    target: target.to_string(),
                    message: format!("{} did not exit within its deadline", self.program),
                });
            }
        };

        // ping exits non-zero on total loss but still prints its summary
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_summary(&stdout).map_err(|e| {
            let stderr = String::from_utf8_lossy(&output.stderr);
            match stderr.lines().next() {
                Some(line) if !line.trim().is_empty() => Error::ProbeFailed {
                    target: target.to_string(),
                    message: line.trim().to_string(),
                },
                _ => e,
            }
        })
    }
}

/// Parse the statistics line printed by `ping`
///
/// Accepts both the Linux (`3 packets transmitted, 3 received, 0% packet loss`)
/// and BSD (`3 packets transmitted, 3 packets received, 0.0% packet loss`) forms.
pub fn parse_summary(output: &str) -> Result<PingStats> {
    let line = output
        .lines()
        .find(|l| l.contains("packets transmitted"))
        .ok_or_else(|| {
            let first = output.lines().next().unwrap_or("").trim();
            if first.is_empty() {
                Error::ProbeOutput("empty output".to_string())
            } else {
                Error::ProbeOutput(first.to_string())
            }
        })?;

    let mut sent = None;
    let mut received = None;
    let mut loss = None;

    for part in line.split(',').map(str::trim) {
        if part.contains("transmitted") {
            sent = leading_number(part);
        } else if part.contains("received") {
            received = leading_number(part);
        } else if part.contains("packet loss") {
            loss = part
                .split('%')
                .next()
                .and_then(|n| n.trim().parse::<f64>().ok());
        }
    }

    let (sent, received) = match (sent, received) {
        (Some(s), Some(r)) => (s, r),
        _ => return Err(Error::ProbeOutput(line.trim().to_string())),
    };

    let loss_percent = loss.unwrap_or_else(|| {
        if sent == 0 {
            100.0
        } else {
            100.0 * f64::from(sent.saturating_sub(received)) / f64::from(sent)
        }
    });

    Ok(PingStats {
        sent,
        received,
        loss_percent,
    })
}

fn leading_number(part: &str) -> Option<u32> {
    part.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINUX_OK: &str = "\
PING 10.0.0.1 (10.0.0.1) 56(84) bytes of data.
64 bytes from 10.0.0.1: icmp_seq=1 ttl=64 time=12.1 ms
64 bytes from 10.0.0.1: icmp_seq=3 ttl=64 time=11.8 ms

--- 10.0.0.1 ping statistics ---
3 packets transmitted, 2 received, 33.3333% packet loss, time 2003ms
rtt min/avg/max/mdev = 11.800/11.950/12.100/0.150 ms
";

    const LINUX_DOWN: &str = "\
PING 10.0.0.1 (10.0.0.1) 56(84) bytes of data.

--- 10.0.0.1 ping statistics ---
3 packets transmitted, 0 received, +3 errors, 100% packet loss, time 2040ms
";

    const BSD_OK: &str = "\
PING 10.0.0.1 (10.0.0.1): 56 data bytes
64 bytes from 10.0.0.1: icmp_seq=0 ttl=64 time=0.412 ms

--- 10.0.0.1 ping statistics ---
3 packets transmitted, 3 packets received, 0.0% packet loss
round-trip min/avg/max/stddev = 0.398/0.410/0.421/0.009 ms
";

    #[test]
    fn test_parse_linux_partial_loss() {
        let stats = parse_summary(LINUX_OK).unwrap();
        assert_eq!(stats.sent, 3);
        assert_eq!(stats.received, 2);
        assert!(stats.is_reachable());
    }

    #[test]
    fn test_parse_linux_total_loss() {
        let stats = parse_summary(LINUX_DOWN).unwrap();
        assert_eq!(stats.sent, 3);
        assert_eq!(stats.received, 0);
        assert_eq!(stats.loss_percent, 100.0);
        assert!(!stats.is_reachable());
    }

    #[test]
    fn test_parse_bsd() {
        let stats = parse_summary(BSD_OK).unwrap();
        assert_eq!(stats.sent, 3);
        assert_eq!(stats.received, 3);
        assert_eq!(stats.loss_percent, 0.0);
        assert!(stats.is_reachable());
    }

    #[test]
    fn test_loss_derived_when_missing() {
        let stats = parse_summary("4 packets transmitted, 1 received").unwrap();
        assert_eq!(stats.loss_percent, 75.0);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_summary("ping: unknown host nowhere"),
            Err(Error::ProbeOutput(msg)) if msg == "ping: unknown host nowhere"
        ));
        assert!(matches!(parse_summary(""), Err(Error::ProbeOutput(_))));
    }

    #[tokio::test]
    async fn test_missing_program_is_probe_error() {
        let pinger = SystemPing::new("/nonexistent/tunnelwatch-ping");
        let result = pinger
            .ping("10.0.0.1", 1, Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(Error::ProbeFailed { .. })));
    }
}

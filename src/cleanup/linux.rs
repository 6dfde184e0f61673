//! Linux teardown sequence
//!
//! Graceful first, forceful after: ask the client to stop, stop the systemd
//! unit if it is still active, kill whatever processes remain, then delete
//! any tunnel interfaces the client left behind. Every step runs even when
//! an earlier one fails.

use crate::cleanup::best_effort;
use crate::clock::Clock;
use crate::runner::CommandRunner;
use std::time::Duration;
use tracing::{debug, info};

/// Grace period after asking the client to stop.
const STOP_GRACE: Duration = Duration::from_secs(2);

/// Tunnel interfaces are named with this prefix followed by digits.
const TUNNEL_IF_PREFIX: &str = "utun";

pub fn cleanup(runner: &dyn CommandRunner, clock: &dyn Clock) {
    info!("Starting Twingate cleanup for Linux...");

    // Graceful stop, only when the client binary is on the path.
    match runner.run_unchecked("which", &["twingate"]) {
        Ok(which) if which.success() => {
            info!("Stopping Twingate client...");
            best_effort("twingate stop", runner.run_unchecked("twingate", &["stop"]));
            clock.sleep(STOP_GRACE);
        }
        Ok(_) => debug!("Twingate client not found on path"),
        Err(e) => debug!("which twingate failed: {e}"),
    }

    // Stop the systemd unit if it reports active.
    match runner.run_unchecked("systemctl", &["is-active", "twingate"]) {
        Ok(unit) if unit.success() => {
            info!("Stopping Twingate systemd service...");
            best_effort(
                "systemctl stop",
                runner.run_unchecked("sudo", &["systemctl", "stop", "twingate"]),
            );
        }
        Ok(_) => {}
        Err(e) => debug!("systemctl is-active failed: {e}"),
    }

    info!("Terminating any remaining Twingate processes...");
    best_effort(
        "pkill",
        runner.run_unchecked("sudo", &["pkill", "-f", "twingate"]),
    );

    // Delete tunnel interfaces individually so one failure cannot strand
    // the rest.
    match runner.run_unchecked("ip", &["link", "show"]) {
        Ok(links) => {
            for iface in tunnel_interfaces(&links.stdout) {
                info!("Removing network interface: {iface}");
                best_effort(
                    "ip link delete",
                    runner.run_unchecked("sudo", &["ip", "link", "delete", &iface]),
                );
            }
        }
        Err(e) => debug!("ip link show failed: {e}"),
    }

    info!("Linux Twingate cleanup completed");
}

/// Extract tunnel interface names from `ip link show` output.
fn tunnel_interfaces(link_output: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut rest = link_output;

    while let Some(pos) = rest.find(TUNNEL_IF_PREFIX) {
        let tail = &rest[pos + TUNNEL_IF_PREFIX.len()..];
        let digits: &str = &tail[..tail
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(tail.len())];
        if !digits.is_empty() {
            let name = format!("{TUNNEL_IF_PREFIX}{digits}");
            if !found.contains(&name) {
                found.push(name);
            }
        }
        rest = tail;
    }

    found
}

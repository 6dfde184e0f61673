//! Windows teardown sequence
//!
//! Stop the service, give it a moment, then force-stop anything left. The
//! PowerShell commands suppress their own not-found errors so a clean host
//! stays quiet.

use crate::cleanup::best_effort;
use crate::clock::Clock;
use crate::runner::CommandRunner;
use std::time::Duration;
use tracing::info;

/// Grace period between the service stop and the process sweep.
const STOP_GRACE: Duration = Duration::from_secs(3);

const STOP_SERVICE_CMD: &str =
    r#"Stop-Service -Name "twingate.service" -Force -ErrorAction SilentlyContinue"#;
const STOP_PROCESS_CMD: &str = r#"Get-Process -Name "*twingate*" -ErrorAction SilentlyContinue | Stop-Process -Force -ErrorAction SilentlyContinue"#;

pub fn cleanup(runner: &dyn CommandRunner, clock: &dyn Clock) {
    info!("Starting Twingate cleanup for Windows...");

    info!("Stopping Twingate service...");
    best_effort(
        "Stop-Service",
        runner.run_unchecked("powershell", &["-Command", STOP_SERVICE_CMD]),
    );

    clock.sleep(STOP_GRACE);

    info!("Terminating any remaining Twingate processes...");
    best_effort(
        "Stop-Process",
        runner.run_unchecked("powershell", &["-Command", STOP_PROCESS_CMD]),
    );

    info!("Windows Twingate cleanup completed");
}

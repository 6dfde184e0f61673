//! Connection teardown phase
//!
//! Runs at job end, in a separate process from setup, and acts only on the
//! lifecycle flags setup left behind. Teardown is strictly best-effort:
//! every step logs and continues on failure, and the phase as a whole never
//! fails the surrounding job, so a teardown problem cannot mask the setup
//! phase's outcome.

pub mod linux;
pub mod windows;

use crate::clock::Clock;
use crate::platform::Platform;
use crate::runner::{CommandOutput, CommandRunner, RunnerError};
use crate::state::{CleanupFlags, LifecycleState};
use tracing::{debug, info, warn};

/// Run the cleanup phase. Infallible by policy.
pub fn run(flags: &CleanupFlags, runner: &dyn CommandRunner, clock: &dyn Clock) {
    if !flags.cleanup_enabled || !flags.setup_attempted {
        info!("Twingate cleanup skipped (not enabled or setup not attempted)");
        return;
    }

    info!("Starting Twingate cleanup...");

    match &flags.platform {
        Platform::Linux => linux::cleanup(runner, clock),
        Platform::Windows => windows::cleanup(runner, clock),
        Platform::Unsupported(name) => {
            warn!("Cleanup not supported for platform: {name}");
            return;
        }
    }

    if let Err(e) = LifecycleState::delete() {
        debug!("Failed to remove state record: {e}");
    }
    info!("Twingate connection cleanup process completed");
}

/// Log and discard the outcome of a best-effort step.
///
/// A non-zero exit arrives as a value and is expected (stopping an already
/// stopped service); only a failure to launch the command rates a warning.
pub(crate) fn best_effort(step: &str, result: Result<CommandOutput, RunnerError>) {
    match result {
        Ok(output) if !output.success() => {
            debug!("{step} exited with status {}", output.exit_code);
        }
        Ok(_) => {}
        Err(e) => warn!("{step} failed: {e}"),
    }
}

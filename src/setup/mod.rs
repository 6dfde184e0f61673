//! Connection setup phase
//!
//! Drives the full bring-up: lifecycle flag export, client installation,
//! credential handling, headless configuration, and the start/poll/retry
//! loop. The lifecycle flags are exported before the first fallible
//! operation so a later cleanup can always tell that setup was attempted,
//! even when setup itself fails.

pub mod connect;
pub mod linux;
pub mod windows;

use crate::clock::Clock;
use crate::config::SetupInputs;
use crate::platform::Platform;
use crate::runner::{CommandRunner, RunnerError};
use crate::setup::connect::ConnectError;
use crate::state::{self, FlagSink, LifecycleState, StateError};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),
    #[error("Linux setup failed: {0}")]
    Linux(#[source] StepError),
    #[error("Windows setup failed: {0}")]
    Windows(#[source] StepError),
    #[error("Failed to export lifecycle flags: {0}")]
    Export(#[from] StateError),
}

/// Failure of an individual setup step, wrapped with a platform prefix at
/// the phase boundary.
#[derive(Error, Debug)]
pub enum StepError {
    #[error(transparent)]
    Command(#[from] RunnerError),
    #[error("failed to export lifecycle flags: {0}")]
    Export(#[from] StateError),
    #[error("installer download failed: {0}")]
    Download(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// Run the setup phase.
///
/// Exports the handoff flags, persists the state record, then dispatches to
/// the platform-specific install-and-connect sequence.
pub fn run(
    inputs: &SetupInputs,
    platform: Platform,
    runner: &dyn CommandRunner,
    clock: &dyn Clock,
    sink: &mut dyn FlagSink,
) -> Result<(), SetupError> {
    let state = LifecycleState::new(inputs.auto_cleanup, &platform);
    sink.export(
        state::ENV_CLEANUP_ENABLED,
        if inputs.auto_cleanup { "true" } else { "false" },
    )?;
    sink.export(state::ENV_OS, platform.identifier())?;
    sink.export(state::ENV_SETUP_ATTEMPTED, "true")?;
    if let Err(e) = state.save() {
        warn!("Failed to write state record: {e}");
    }

    info!("Setting up Twingate connection...");

    match platform {
        Platform::Linux => {
            linux::setup(inputs, runner, clock, sink).map_err(SetupError::Linux)?
        }
        Platform::Windows => {
            windows::setup(inputs, runner, clock, sink).map_err(SetupError::Windows)?
        }
        Platform::Unsupported(name) => return Err(SetupError::UnsupportedPlatform(name)),
    }

    info!("Twingate connection established successfully");
    Ok(())
}

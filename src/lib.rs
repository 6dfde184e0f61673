//! Twingate CI action toolkit
//!
//! This crate installs the Twingate client inside a CI job, brings the
//! tunnel online with bounded retries, and tears it down when the job
//! finishes. Setup and cleanup run as separate process invocations; the
//! lifecycle flags exported by setup are their only coordination, so
//! cleanup works even when setup failed partway.
//!
//! # Architecture
//!
//! - `config`: action input parsing (`INPUT_*` environment)
//! - `runner`: external command execution
//! - `clock`: timed waits
//! - `platform`: platform detection and dispatch
//! - `state`: lifecycle flag handoff between phases
//! - `setup`: install, headless configuration, connection bring-up
//! - `cleanup`: best-effort teardown
//!
//! # Usage
//!
//! As a pair of workflow steps:
//! ```bash
//! twingate-action setup     # after checkout, with INPUT_SERVICE-KEY set
//! twingate-action cleanup   # in an `if: always()` step at job end
//! ```

pub mod cleanup;
pub mod clock;
pub mod config;
pub mod platform;
pub mod runner;
pub mod setup;
pub mod state;

pub use config::SetupInputs;
pub use platform::Platform;
pub use state::{CleanupFlags, LifecycleState};

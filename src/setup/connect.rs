//! Connection bring-up with bounded retries
//!
//! Starts the client, waits an escalating interval, polls the reported
//! status, and either accepts the connection or stops the client and tries
//! again. A command failure inside an attempt is a warning, not a phase
//! failure; only running out of attempts without ever seeing `online` is
//! fatal.

use crate::clock::Clock;
use crate::runner::{CommandRunner, RunnerError};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Status string that marks a successful bring-up.
const STATUS_ONLINE: &str = "online";

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Twingate client failed to connect after maximum retries")]
    RetriesExhausted,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_wait: Duration,
    pub increment: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_wait: Duration::from_secs(5),
            increment: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Wait before polling on the given 0-based attempt.
    pub fn wait_for(&self, attempt: u32) -> Duration {
        self.initial_wait + self.increment * attempt
    }
}

/// Drives the start/poll/retry loop against an installed, configured client.
pub struct Connector<'a> {
    runner: &'a dyn CommandRunner,
    clock: &'a dyn Clock,
    policy: RetryPolicy,
}

impl<'a> Connector<'a> {
    pub fn new(runner: &'a dyn CommandRunner, clock: &'a dyn Clock) -> Self {
        Self::with_policy(runner, clock, RetryPolicy::default())
    }

    pub fn with_policy(
        runner: &'a dyn CommandRunner,
        clock: &'a dyn Clock,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            runner,
            clock,
            policy,
        }
    }

    /// Bring the connection online within the policy's attempt bound.
    pub fn connect(&self) -> Result<(), ConnectError> {
        for attempt in 0..self.policy.max_attempts {
            info!(
                "Starting Twingate service (attempt {}/{})...",
                attempt + 1,
                self.policy.max_attempts
            );

            match self.attempt(self.policy.wait_for(attempt)) {
                Ok(true) => {
                    info!("Twingate service is connected");
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => warn!("Attempt {} failed: {e}", attempt + 1),
            }

            if attempt + 1 == self.policy.max_attempts {
                return Err(ConnectError::RetriesExhausted);
            }
            info!("Twingate service is not connected. Retrying...");
        }

        Err(ConnectError::RetriesExhausted)
    }

    /// One start/wait/poll cycle. Returns whether the client came online.
    fn attempt(&self, wait: Duration) -> Result<bool, RunnerError> {
        self.runner
            .run("sudo", &["twingate", "config", "log-level", "info"])?;
        self.runner.run("twingate", &["start"])?;

        info!(
            "Waiting {} seconds for Twingate service to start...",
            wait.as_secs()
        );
        self.clock.sleep(wait);

        let output = self.runner.run("twingate", &["status"])?;
        let status = output.stdout.trim();
        info!("Twingate service status: '{status}'");

        if status == STATUS_ONLINE {
            self.runner.run("twingate", &["resources"])?;
            self.show_journal()?;
            Ok(true)
        } else {
            self.runner.run("twingate", &["stop"])?;
            self.show_journal()?;
            Ok(false)
        }
    }

    fn show_journal(&self) -> Result<(), RunnerError> {
        self.runner
            .run("sudo", &["journalctl", "-u", "twingate", "--no-pager"])?;
        Ok(())
    }
}

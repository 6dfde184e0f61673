//! Action input parsing
//!
//! The hosting runner surfaces workflow `inputs:` to the process as
//! `INPUT_<NAME>` environment variables, with the input name uppercased.
//! A declared-but-empty input arrives as an empty string, so required
//! inputs are checked for emptiness as well as presence.

use std::env;
use thiserror::Error;

pub const INPUT_SERVICE_KEY: &str = "INPUT_SERVICE-KEY";
pub const INPUT_AUTO_CLEANUP: &str = "INPUT_AUTO-CLEANUP";

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Missing required input: {0}")]
    Missing(&'static str),
}

/// Inputs consumed by the setup phase.
#[derive(Debug, Clone)]
pub struct SetupInputs {
    /// Opaque service credential, written verbatim to the client's
    /// headless-setup file. Never logged.
    pub service_key: String,
    /// Whether the cleanup phase should act at job end.
    pub auto_cleanup: bool,
}

impl SetupInputs {
    /// Parse inputs from the current process environment.
    pub fn from_env() -> Result<Self, InputError> {
        Self::from_env_fn(|key| env::var(key))
    }

    /// Parse inputs using a custom getter (for testing).
    pub fn from_env_fn<F>(get_var: F) -> Result<Self, InputError>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let service_key = get_var(INPUT_SERVICE_KEY).unwrap_or_default();
        if service_key.is_empty() {
            return Err(InputError::Missing("service-key"));
        }

        let auto_cleanup = get_var(INPUT_AUTO_CLEANUP)
            .map(|value| value == "true")
            .unwrap_or(false);

        Ok(Self {
            service_key,
            auto_cleanup,
        })
    }
}

//! Lifecycle flag handoff between the setup and cleanup phases
//!
//! Setup and cleanup run as separate processes; the flags exported here are
//! their only coordination. The primary medium is the hosting runner's
//! environment file (`GITHUB_ENV`), which later job steps observe as plain
//! environment variables. A small JSON state record in the temp directory is
//! the secondary medium, so a locally-run cleanup can still recover the
//! flags. The reader treats an absent flag as disabled/not attempted.

use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const ENV_CLEANUP_ENABLED: &str = "TWINGATE_CLEANUP_ENABLED";
pub const ENV_OS: &str = "TWINGATE_OS";
pub const ENV_SETUP_ATTEMPTED: &str = "TWINGATE_SETUP_ATTEMPTED";
pub const ENV_INSTALLED: &str = "TWINGATE_INSTALLED";
pub const ENV_CONNECTED: &str = "TWINGATE_CONNECTED";

const STATE_FILE: &str = "twingate-action-state.json";

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to access state record: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse state record: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to append to {}: {source}", path.display())]
    EnvFile { path: PathBuf, source: io::Error },
}

/// Destination for exported lifecycle variables.
pub trait FlagSink {
    fn export(&mut self, key: &str, value: &str) -> Result<(), StateError>;
}

/// Exports variables by appending `KEY=value` lines to the file named by
/// `GITHUB_ENV`. When the variable is unset (local runs), exports become
/// no-ops and the state record carries the handoff instead.
pub struct GithubEnvSink {
    path: Option<PathBuf>,
}

impl GithubEnvSink {
    pub fn from_env() -> Self {
        Self {
            path: env::var_os("GITHUB_ENV").map(PathBuf::from),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }
}

impl FlagSink for GithubEnvSink {
    fn export(&mut self, key: &str, value: &str) -> Result<(), StateError> {
        debug!("Exporting {key}={value}");
        let Some(path) = &self.path else {
            debug!("GITHUB_ENV is not set, relying on the state record");
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| StateError::EnvFile {
                path: path.clone(),
                source: e,
            })?;
        writeln!(file, "{key}={value}").map_err(|e| StateError::EnvFile {
            path: path.clone(),
            source: e,
        })?;
        Ok(())
    }
}

/// Handoff record written by setup before any fallible operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleState {
    pub cleanup_enabled: bool,
    pub setup_attempted: bool,
    pub platform: String,
}

impl LifecycleState {
    pub fn new(cleanup_enabled: bool, platform: &Platform) -> Self {
        Self {
            cleanup_enabled,
            setup_attempted: true,
            platform: platform.identifier().to_string(),
        }
    }

    /// Well-known location of the state record.
    pub fn default_path() -> PathBuf {
        env::temp_dir().join(STATE_FILE)
    }

    pub fn save(&self) -> Result<(), StateError> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), StateError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn load() -> Result<Option<Self>, StateError> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, StateError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn delete() -> Result<(), StateError> {
        Self::delete_at(&Self::default_path())
    }

    pub fn delete_at(path: &Path) -> Result<(), StateError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Flags the cleanup phase acts on.
#[derive(Debug, Clone)]
pub struct CleanupFlags {
    pub cleanup_enabled: bool,
    pub setup_attempted: bool,
    pub platform: Platform,
}

impl CleanupFlags {
    /// Read flags from the environment, falling back to the state record
    /// when the environment carries no evidence of a setup attempt.
    pub fn detect() -> Self {
        let flags = Self::from_env();
        if flags.setup_attempted {
            return flags;
        }
        match LifecycleState::load() {
            Ok(Some(state)) => Self::from_state(&state),
            _ => flags,
        }
    }

    pub fn from_env() -> Self {
        Self::from_env_fn(|key| env::var(key))
    }

    /// Parse flags using a custom getter (for testing). An absent flag
    /// means disabled/not attempted; an absent platform means the live one.
    pub fn from_env_fn<F>(get_var: F) -> Self
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let cleanup_enabled = get_var(ENV_CLEANUP_ENABLED)
            .map(|value| value == "true")
            .unwrap_or(false);
        let setup_attempted = get_var(ENV_SETUP_ATTEMPTED)
            .map(|value| value == "true")
            .unwrap_or(false);
        let platform = get_var(ENV_OS)
            .map(|value| Platform::parse(&value))
            .unwrap_or_else(|_| Platform::current());

        Self {
            cleanup_enabled,
            setup_attempted,
            platform,
        }
    }

    pub fn from_state(state: &LifecycleState) -> Self {
        Self {
            cleanup_enabled: state.cleanup_enabled,
            setup_attempted: state.setup_attempted,
            platform: Platform::parse(&state.platform),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_getter(
        vars: HashMap<String, String>,
    ) -> impl Fn(&str) -> Result<String, env::VarError> {
        move |key: &str| vars.get(key).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn test_flags_from_full_env() {
        let mut vars = HashMap::new();
        vars.insert(ENV_CLEANUP_ENABLED.to_string(), "true".to_string());
        vars.insert(ENV_SETUP_ATTEMPTED.to_string(), "true".to_string());
        vars.insert(ENV_OS.to_string(), "linux".to_string());

        let flags = CleanupFlags::from_env_fn(make_getter(vars));

        assert!(flags.cleanup_enabled);
        assert!(flags.setup_attempted);
        assert_eq!(flags.platform, Platform::Linux);
    }

    #[test]
    fn test_absent_flags_mean_disabled() {
        let flags = CleanupFlags::from_env_fn(make_getter(HashMap::new()));

        assert!(!flags.cleanup_enabled);
        assert!(!flags.setup_attempted);
        // Platform falls back to the live host.
        assert_eq!(flags.platform, Platform::current());
    }

    #[test]
    fn test_non_true_values_mean_disabled() {
        let mut vars = HashMap::new();
        vars.insert(ENV_CLEANUP_ENABLED.to_string(), "yes".to_string());
        vars.insert(ENV_SETUP_ATTEMPTED.to_string(), "1".to_string());

        let flags = CleanupFlags::from_env_fn(make_getter(vars));

        assert!(!flags.cleanup_enabled);
        assert!(!flags.setup_attempted);
    }

    #[test]
    fn test_win32_identifier_resolves_to_windows() {
        let mut vars = HashMap::new();
        vars.insert(ENV_OS.to_string(), "win32".to_string());

        let flags = CleanupFlags::from_env_fn(make_getter(vars));
        assert_eq!(flags.platform, Platform::Windows);
    }

    #[test]
    fn test_state_record_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let state = LifecycleState::new(true, &Platform::Linux);
        state.save_to(&path).unwrap();

        let loaded = LifecycleState::load_from(&path).unwrap().unwrap();
        assert!(loaded.cleanup_enabled);
        assert!(loaded.setup_attempted);
        assert_eq!(loaded.platform, "linux");
    }

    #[test]
    fn test_load_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let result = LifecycleState::load_from(&dir.path().join("absent.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        LifecycleState::new(false, &Platform::Linux)
            .save_to(&path)
            .unwrap();
        LifecycleState::delete_at(&path).unwrap();
        LifecycleState::delete_at(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_flags_from_state_record() {
        let state = LifecycleState::new(true, &Platform::Windows);
        let flags = CleanupFlags::from_state(&state);

        assert!(flags.cleanup_enabled);
        assert!(flags.setup_attempted);
        assert_eq!(flags.platform, Platform::Windows);
    }

    #[test]
    fn test_env_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_env");

        let mut sink = GithubEnvSink::with_path(path.clone());
        sink.export(ENV_CLEANUP_ENABLED, "true").unwrap();
        sink.export(ENV_OS, "linux").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "TWINGATE_CLEANUP_ENABLED=true\nTWINGATE_OS=linux\n");
    }

    #[test]
    fn test_env_sink_without_target_is_noop() {
        let mut sink = GithubEnvSink { path: None };
        sink.export(ENV_CONNECTED, "true").unwrap();
    }
}

//! Platform detection and dispatch
//!
//! Setup records the platform it ran on; cleanup runs in a separate process
//! and dispatches on the recorded identifier rather than the compile target,
//! so the variant is resolved from a string once at the top of each phase.

use std::fmt;

/// Platforms the action knows how to drive.
///
/// `Unsupported` keeps the original identifier for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
    Unsupported(String),
}

impl Platform {
    /// Platform of the running process.
    pub fn current() -> Self {
        Self::parse(std::env::consts::OS)
    }

    /// Resolve a recorded platform identifier.
    ///
    /// Accepts both this binary's identifiers and the `win32`/`Windows`
    /// spellings other tooling records for the same host.
    pub fn parse(identifier: &str) -> Self {
        match identifier {
            "linux" => Platform::Linux,
            "windows" | "win32" | "Windows" => Platform::Windows,
            other => Platform::Unsupported(other.to_string()),
        }
    }

    /// Identifier persisted for the cleanup phase.
    pub fn identifier(&self) -> &str {
        match self {
            Platform::Linux => "linux",
            Platform::Windows => "windows",
            Platform::Unsupported(name) => name,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_identifiers() {
        assert_eq!(Platform::parse("linux"), Platform::Linux);
        assert_eq!(Platform::parse("windows"), Platform::Windows);
        assert_eq!(Platform::parse("win32"), Platform::Windows);
        assert_eq!(Platform::parse("Windows"), Platform::Windows);
    }

    #[test]
    fn test_parse_unknown_identifier() {
        let platform = Platform::parse("darwin");
        assert_eq!(platform, Platform::Unsupported("darwin".to_string()));
        assert_eq!(platform.identifier(), "darwin");
    }

    #[test]
    fn test_identifier_round_trips() {
        assert_eq!(Platform::parse(Platform::Linux.identifier()), Platform::Linux);
        assert_eq!(
            Platform::parse(Platform::Windows.identifier()),
            Platform::Windows
        );
    }

    #[test]
    fn test_current_is_resolved() {
        // Whatever the host, detection must not yield an empty identifier.
        assert!(!Platform::current().identifier().is_empty());
    }

    #[test]
    fn test_display_matches_identifier() {
        assert_eq!(Platform::Linux.to_string(), "linux");
        assert_eq!(
            Platform::Unsupported("freebsd".to_string()).to_string(),
            "freebsd"
        );
    }
}

//! Windows install and bring-up sequence
//!
//! Downloads the MSI installer, installs it with the service credential,
//! and starts the Windows service. There is no retry loop here: the MSI
//! install wires the service up and the phase verifies it once after a
//! fixed grace period.
//!
//! The credential lands in the working directory next to the installer,
//! unlike the Linux temp-file path; removal is attempted regardless of the
//! install outcome.

use crate::clock::Clock;
use crate::config::SetupInputs;
use crate::runner::CommandRunner;
use crate::setup::StepError;
use crate::state::{self, FlagSink};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const INSTALLER_URL: &str = "https://api.twingate.com/download/windows?installer=msi";
const INSTALLER_FILE: &str = "twingate_client.msi";
const KEY_FILE: &str = "key.json";
const SERVICE_START_WAIT: Duration = Duration::from_secs(10);

pub fn setup(
    inputs: &SetupInputs,
    runner: &dyn CommandRunner,
    clock: &dyn Clock,
    sink: &mut dyn FlagSink,
) -> Result<(), StepError> {
    info!("Installing Twingate client for Windows...");
    let work_dir = std::env::current_dir()?;
    download_installer(INSTALLER_URL, &work_dir.join(INSTALLER_FILE))?;
    configure_and_start(&work_dir, inputs, runner, clock, sink)
}

/// Install with the credential, then start and verify the service.
///
/// Split from [`setup`] so the sequence is testable without the download.
pub(crate) fn configure_and_start(
    work_dir: &Path,
    inputs: &SetupInputs,
    runner: &dyn CommandRunner,
    clock: &dyn Clock,
    sink: &mut dyn FlagSink,
) -> Result<(), StepError> {
    let key_path = write_service_key(work_dir, &inputs.service_key)?;

    let installed = install(runner, &key_path);
    if let Err(e) = fs::remove_file(&key_path) {
        debug!("Failed to remove credential file: {e}");
    }
    installed?;
    sink.export(state::ENV_INSTALLED, "true")?;

    info!("Starting Twingate service...");
    runner.run("powershell", &["-Command", "Start-Service twingate.service"])?;
    clock.sleep(SERVICE_START_WAIT);
    runner.run("powershell", &["-Command", "Get-Service twingate.service"])?;
    sink.export(state::ENV_CONNECTED, "true")?;
    Ok(())
}

fn install(runner: &dyn CommandRunner, key_path: &Path) -> Result<(), StepError> {
    let command = format!(
        "Start-Process msiexec.exe -Wait -ArgumentList \"/i {INSTALLER_FILE} service_secret={} /quiet\"",
        key_path.display()
    );
    runner.run("powershell", &["-Command", &command])?;
    Ok(())
}

fn write_service_key(work_dir: &Path, service_key: &str) -> Result<PathBuf, StepError> {
    let path = work_dir.join(KEY_FILE);
    fs::write(&path, service_key)?;
    Ok(path)
}

fn download_installer(url: &str, dest: &Path) -> Result<(), StepError> {
    info!("Downloading Twingate installer...");
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let bytes = response.bytes()?;
    fs::write(dest, &bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::mock::RecordingClock;
    use crate::runner::mock::ScriptedRunner;
    use crate::state::mock::RecordingSink;

    fn inputs() -> SetupInputs {
        SetupInputs {
            service_key: "abc123".to_string(),
            auto_cleanup: true,
        }
    }

    fn msiexec_line(work_dir: &Path) -> String {
        format!(
            "powershell -Command Start-Process msiexec.exe -Wait -ArgumentList \"/i twingate_client.msi service_secret={} /quiet\"",
            work_dir.join(KEY_FILE).display()
        )
    }

    #[test]
    fn test_credential_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let key = r#"{"service_account":"ci"}"#;

        let path = write_service_key(dir.path(), key).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), key);
    }

    #[test]
    fn test_full_sequence_with_grace_period() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new();
        let clock = RecordingClock::new();
        let mut sink = RecordingSink::new();

        configure_and_start(dir.path(), &inputs(), &runner, &clock, &mut sink).unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0], msiexec_line(dir.path()));
        assert_eq!(calls[1], "powershell -Command Start-Service twingate.service");
        assert_eq!(calls[2], "powershell -Command Get-Service twingate.service");
        assert_eq!(clock.slept_seconds(), vec![10]);
        assert_eq!(sink.get(state::ENV_INSTALLED), Some("true"));
        assert_eq!(sink.get(state::ENV_CONNECTED), Some("true"));
    }

    #[test]
    fn test_credential_removed_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new();
        let clock = RecordingClock::new();
        let mut sink = RecordingSink::new();

        configure_and_start(dir.path(), &inputs(), &runner, &clock, &mut sink).unwrap();

        assert!(!dir.path().join(KEY_FILE).exists());
    }

    #[test]
    fn test_credential_removed_even_when_install_fails() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new();
        runner.push_exit(&msiexec_line(dir.path()), 1603);
        let clock = RecordingClock::new();
        let mut sink = RecordingSink::new();

        let result = configure_and_start(dir.path(), &inputs(), &runner, &clock, &mut sink);

        assert!(result.is_err());
        assert!(!dir.path().join(KEY_FILE).exists());
        assert_eq!(runner.count("powershell -Command Start-Service twingate.service"), 0);
        assert!(sink.exported.is_empty());
    }
}

//! Linux install and bring-up sequence
//!
//! Installs the client from the vendor apt repository, writes the service
//! credential to a scoped temporary file, configures the client headlessly,
//! and hands off to the connect loop. The credential file is removed when
//! it goes out of scope, on success and failure alike.

use crate::clock::Clock;
use crate::config::SetupInputs;
use crate::runner::CommandRunner;
use crate::setup::connect::Connector;
use crate::setup::StepError;
use crate::state::{self, FlagSink};
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::info;

const APT_KEYRING_CMD: &str = "curl -fsSL https://packages.twingate.com/apt/gpg.key | sudo gpg --dearmor -o /usr/share/keyrings/twingate-client-keyring.gpg";
const APT_SOURCE_CMD: &str = r#"echo "deb [signed-by=/usr/share/keyrings/twingate-client-keyring.gpg] https://packages.twingate.com/apt/ * *" | sudo tee /etc/apt/sources.list.d/twingate.list"#;

pub fn setup(
    inputs: &SetupInputs,
    runner: &dyn CommandRunner,
    clock: &dyn Clock,
    sink: &mut dyn FlagSink,
) -> Result<(), StepError> {
    info!("Installing Twingate client for Linux...");
    install(runner)?;
    sink.export(state::ENV_INSTALLED, "true")?;

    info!("Setting up and starting Twingate service...");
    let key_file = write_service_key(&inputs.service_key)?;
    let key_path = key_file.path().to_string_lossy().into_owned();
    runner.run("sudo", &["twingate", "setup", "--headless", &key_path])?;

    Connector::new(runner, clock).connect()?;
    sink.export(state::ENV_CONNECTED, "true")?;
    Ok(())
}

/// Install the client from the vendor apt repository.
fn install(runner: &dyn CommandRunner) -> Result<(), StepError> {
    runner.run("sudo", &["apt-get", "update", "-qq"])?;
    runner.run(
        "sudo",
        &["apt-get", "install", "-y", "curl", "gnupg", "ca-certificates"],
    )?;
    runner.run("bash", &["-c", APT_KEYRING_CMD])?;
    runner.run("bash", &["-c", APT_SOURCE_CMD])?;
    runner.run("sudo", &["apt-get", "update", "-yq"])?;
    runner.run("sudo", &["apt-get", "install", "-yq", "twingate"])?;
    Ok(())
}

/// Write the credential to a scoped temporary file for headless setup.
fn write_service_key(service_key: &str) -> Result<NamedTempFile, StepError> {
    let mut file = tempfile::Builder::new()
        .prefix("twingate-key-")
        .suffix(".json")
        .tempfile()?;
    file.write_all(service_key.as_bytes())?;
    file.flush()?;
    Ok(file)
}

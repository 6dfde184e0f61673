use clap::{Parser, Subcommand};
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use twingate_action::clock::SystemClock;
use twingate_action::runner::ExecRunner;
use twingate_action::state::GithubEnvSink;
use twingate_action::{cleanup, setup, CleanupFlags, Platform, SetupInputs};

#[derive(Parser)]
#[command(name = "twingate-action")]
#[command(about = "CI action toolkit for Twingate tunnel lifecycle management")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the Twingate client and bring the tunnel online
    ///
    /// Reads the service credential and cleanup preference from the
    /// INPUT_* environment the hosting runner provides, and exports the
    /// TWINGATE_* lifecycle flags for the cleanup step.
    Setup,
    /// Tear down whatever a previous setup step left behind
    ///
    /// Acts only when setup exported its lifecycle flags with cleanup
    /// enabled. Never fails the job; problems are logged as warnings.
    Cleanup,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Setup => {
            let inputs = match SetupInputs::from_env() {
                Ok(inputs) => inputs,
                Err(e) => {
                    error!("Action failed: {e}");
                    std::process::exit(1);
                }
            };
            let mut sink = GithubEnvSink::from_env();
            if let Err(e) = setup::run(
                &inputs,
                Platform::current(),
                &ExecRunner,
                &SystemClock,
                &mut sink,
            ) {
                error!("Action failed: {e}");
                std::process::exit(1);
            }
        }
        Commands::Cleanup => {
            let flags = CleanupFlags::detect();
            cleanup::run(&flags, &ExecRunner, &SystemClock);
        }
    }

    Ok(())
}

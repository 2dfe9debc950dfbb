// Entry point of the macrunner CLI.
// Parses the command line, sets up logging and the host context, and hands
// the command to the Runner dispatcher.

use clap::Parser;
use macrunner_common::constants;
use macrunner_common::{HostContext, Terminal};
use macrunner_sdk::{MacrunnerPackage, Source};

use macrunner::command_settings::CommandSettings;
use macrunner::runner::Runner;

fn main() {
    // clap exits on its own for --help, --version and usage errors.
    let settings = CommandSettings::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to build Tokio runtime: {}", e);
            std::process::exit(constants::return_code::TERMINATED_ERROR);
        }
    };

    let exit_code = runtime.block_on(run(settings));
    std::process::exit(exit_code);
}

async fn run(settings: CommandSettings) -> i32 {
    // Diagnostics go to stderr so they never mix with the wizard's prompts.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    tracing::info!("macrunner starting.");
    tracing::info!("  Version  = {}", MacrunnerPackage::VERSION);
    tracing::info!("  Commit   = {}", Source::COMMIT_HASH);
    tracing::info!(
        "  Platform = {} / {}",
        constants::CURRENT_PLATFORM,
        constants::CURRENT_ARCHITECTURE
    );

    let host_context = match HostContext::new() {
        Ok(context) => context,
        Err(e) => {
            eprintln!("{:#}", e);
            return constants::return_code::TERMINATED_ERROR;
        }
    };

    let runner = Runner::new(host_context.clone());
    match runner.execute_command(settings).await {
        Ok(exit_code) => {
            tracing::info!("macrunner exiting with code {}", exit_code);
            exit_code
        }
        Err(e) => {
            Terminal::new(&host_context).write_error_err(&e);
            constants::return_code::TERMINATED_ERROR
        }
    }
}

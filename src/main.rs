use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use finite_state_upload::config::{HostEnvironment, HttpSettings, UploadConfig};
use finite_state_upload::finite_state::FiniteStateClient;
use finite_state_upload::logging::{self, LogConfig};
use finite_state_upload::outputs::OutputWriter;
use finite_state_upload::platform::publisher_for;
use finite_state_upload::workflow::UploadWorkflow;

#[derive(Parser)]
#[command(
    name = "finite-state-upload",
    about = "Upload a binary to Finite State and report the result on the pull request"
)]
struct Cli {
    /// Path of the rotating status log
    #[arg(long, default_value = "status.log")]
    log_file: PathBuf,

    /// Timeout for API requests, in seconds
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,

    /// Timeout for each uploaded file part, in seconds
    #[arg(long, default_value_t = 3600)]
    upload_timeout_secs: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&LogConfig {
        file_path: cli.log_file,
        ..LogConfig::default()
    })?;

    let http = HttpSettings {
        request_timeout: Duration::from_secs(cli.timeout_secs),
        upload_timeout: Duration::from_secs(cli.upload_timeout_secs),
        ..HttpSettings::default()
    };

    let host = HostEnvironment::load()?;
    let outputs = OutputWriter::from_host(&host)?;
    tracing::debug!(platform = ?host.platform, output = %outputs.path().display(), "Loaded host environment");

    let platform = FiniteStateClient::new(&http)?;
    let publisher = publisher_for(&host, &http)?;

    let outcome = UploadWorkflow::new(&platform, publisher.as_ref(), &outputs, &host)
        .run(UploadConfig::load())
        .await?;

    if outcome.is_success() {
        tracing::info!("Finished - Create new asset version and upload binary");
    }

    Ok(())
}

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use sf_writer::{run_data_dir, DataDir, RunSettings};

#[derive(Parser)]
#[command(
    name = "sf-writer",
    version,
    about = "Write a CSV table into Salesforce through the Bulk API"
)]
struct Cli {
    /// Data directory holding config.json, in/tables and out/tables
    #[arg(long, env = "KBC_DATADIR", default_value = "/data")]
    data_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    let data_dir = DataDir::new(cli.data_dir);
    match run_data_dir(&data_dir, &RunSettings::default()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            if code == sf_writer::pipeline::EXIT_USER_ERROR {
                error!("{err}");
            } else {
                error!(error = ?err, "Unexpected failure: {err}");
            }
            ExitCode::from(code)
        }
    }
}

use std::process::ExitCode;
use tracing::error;
use wikicrawl::{get_args, init_logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match get_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    // held until exit so the log file gets flushed
    let _guard = match init_logging(config.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("cannot set up logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("crawl aborted: {e}");
            ExitCode::FAILURE
        }
    }
}

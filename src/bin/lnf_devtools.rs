use lnf_devtools::cli::run_cli;
use lnf_devtools::logging::{init_logging, LogConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = init_logging(&LogConfig::from_env()) {
        eprintln!("Warning: {:#}", e);
    }
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "generation failed");
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

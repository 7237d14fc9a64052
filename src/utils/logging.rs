use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::error::{AqiError, Result};

/// Default directive when RUST_LOG is unset
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "aqi_processor=debug"
    } else {
        "aqi_processor=info"
    }
}

/// Install the global subscriber. Logs go to stderr, or are appended to
/// `log_file` without ANSI colours, so stdout stays free for result tables.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::builder().parse_lossy(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_directive(verbose).to_string()),
    );

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(verbose)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(verbose)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    installed.map_err(|e| AqiError::Configuration(format!("Cannot initialise logging: {}", e)))
}

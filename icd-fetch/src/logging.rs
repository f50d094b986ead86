//! Console + file logging.
//!
//! Events go to stderr and, in plain text, to the configured log file. The
//! level comes from `RUST_LOG` and defaults to `info`. A log file that cannot
//! be opened is reported once and the run continues with console output only.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber. A second call leaves the first subscriber in place.
pub fn init(log_file: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    let file_layer = match open_log_file(log_file) {
        Ok(file) => Some(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        ),
        Err(e) => {
            eprintln!(
                "[WARN] Cannot open log file {}: {e}. Logging to console only.",
                log_file.display()
            );
            None
        }
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        tracing::debug!(error = %e, "Tracing subscriber already set");
    }
}

//! Logging configuration.
//!
//! Installs a `tracing-subscriber` writing to stderr or an append-mode file.
//!
//! ## Configuration priority
//!
//! 1. `log_level` / `log_file` connect options (highest)
//! 2. `RUST_LOG` environment variable
//! 3. Default: `warn`
//!
//! Applications that install their own subscriber should leave both options
//! unset and skip `RUST_LOG`; `try_init` never replaces an existing one.

use std::fs::OpenOptions;
use std::sync::{Mutex, OnceLock};

use tracing_subscriber::{
    fmt::{self, time::SystemTime, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const TARGET: &str = "athenars";
const DEFAULT_LEVEL: &str = "warn";

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Logging configuration carried by the connect options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogConfig {
    /// Log level: "OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE".
    pub level: Option<String>,
    /// Log file path. If unset, logs go to stderr.
    pub file: Option<String>,
}

impl LogConfig {
    fn is_configured(&self) -> bool {
        self.level.is_some() || self.file.is_some()
    }

    fn is_off(&self) -> bool {
        self.level
            .as_deref()
            .is_some_and(|level| level.eq_ignore_ascii_case("off"))
    }

    /// Filter directive for an explicit level, e.g. `athenars=debug`.
    fn directive(&self) -> Option<String> {
        self.level
            .as_ref()
            .map(|level| format!("{}={}", TARGET, level.to_lowercase()))
    }
}

/// Initialize the tracing subscriber.
///
/// Installs at most once per process; the first connection that carries a
/// logging option (or finds `RUST_LOG` set) wins. A connection asking for
/// `off` installs nothing and leaves the slot for a later one.
pub fn init_logging(config: &LogConfig) {
    if config.is_off() {
        return;
    }
    if !config.is_configured() && std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    LOGGING_INITIALIZED.get_or_init(|| {
        let Some(writer) = make_writer(config) else {
            return;
        };
        tracing_subscriber::registry()
            .with(filter(config))
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_target(false)
                    .with_ansi(config.file.is_none())
                    .with_timer(SystemTime),
            )
            .try_init()
            .ok();
    });
}

fn filter(config: &LogConfig) -> EnvFilter {
    match config.directive() {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", TARGET, DEFAULT_LEVEL))),
    }
}

/// Stderr, or the configured file opened for appending. `None` when the
/// file cannot be opened; logging is then skipped rather than failing the
/// connection.
fn make_writer(config: &LogConfig) -> Option<BoxMakeWriter> {
    let Some(ref path) = config.file else {
        return Some(BoxMakeWriter::new(std::io::stderr));
    };
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(BoxMakeWriter::new(Mutex::new(file))),
        Err(e) => {
            eprintln!("{}: failed to open log file {}: {}", TARGET, path, e);
            None
        }
    }
}

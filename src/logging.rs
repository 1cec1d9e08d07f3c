use eyre::WrapErr;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, PartialEq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    /// Nothing is installed; every event is dropped.
    Off,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub target: LogTarget,
}

impl LoggingConfig {
    /// The TUI owns the terminal, so it only ever logs to a file.
    pub fn for_tui(level: &str, log_file: Option<PathBuf>) -> Self {
        Self {
            level: level.to_string(),
            target: log_file.map_or(LogTarget::Off, LogTarget::File),
        }
    }

    pub fn for_cli(level: &str) -> Self {
        Self {
            level: level.to_string(),
            target: LogTarget::Stderr,
        }
    }

    /// `RUST_LOG` wins over the configured level.
    fn filter(&self) -> eyre::Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level)
                .wrap_err_with(|| format!("invalid log level '{}'", self.level)),
        }
    }
}

pub fn init_logging(config: &LoggingConfig) -> eyre::Result<()> {
    let (writer, ansi) = match &config.target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .wrap_err_with(|| format!("cannot open log file {}", path.display()))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
    };

    tracing_subscriber::registry()
        .with(config.filter()?)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi),
        )
        .try_init()
        .wrap_err("logging already initialised")?;

    tracing::debug!(target_kind = ?config.target, "logging initialised");
    Ok(())
}

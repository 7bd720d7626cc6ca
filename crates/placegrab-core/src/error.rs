use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building [`crate::AppConfig`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Errors raised while reading credential or input-term files.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while writing the consolidated report.
///
/// Unlike provider failures, a report-write failure is fatal to the whole
/// run: once collection is over there is no further useful work to do.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

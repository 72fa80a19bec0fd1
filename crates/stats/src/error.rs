//! Error types for report persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while persisting a report.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The report file could not be opened for writing.
    #[error("Can't open file {}", path.display())]
    OpenReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The report file was opened but writing to it failed.
    #[error("Failed to write report {}", path.display())]
    WriteReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

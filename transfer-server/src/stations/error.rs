//! Station directory error types.

use std::path::PathBuf;

/// Errors from loading or querying the station directory.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// The CSV file could not be opened or parsed
    #[error("failed to read stations from {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A row could not be read
    #[error("malformed stations row: {0}")]
    Row(#[from] csv::Error),

    /// No station matches the given name
    #[error("no station found for {0:?}")]
    NotFound(String),
}

//! Snapshot store error types.

use std::path::PathBuf;

/// Errors from loading or querying a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading the snapshot file failed
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot file is not valid JSON for the expected shape
    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    /// The snapshot content is inconsistent
    #[error("invalid snapshot: {0}")]
    Invalid(String),

    /// The store was built from in-memory data and has no file to reload
    #[error("snapshot store has no backing file")]
    NotReloadable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::Invalid("station 1 listed twice".into());
        assert_eq!(err.to_string(), "invalid snapshot: station 1 listed twice");

        let err = StoreError::Io {
            path: PathBuf::from("/nope.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/nope.json"));
        assert!(err.to_string().contains("missing"));
    }
}

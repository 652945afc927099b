/// Core error taxonomy and shared constants for the probe engine
use std::path::PathBuf;
use thiserror::Error;

/// Maximum number of evidence entries kept by one aggregation pass
pub const DEFAULT_EVIDENCE_CAPACITY: usize = 128;

/// Maximum length (characters) of one `category|detail` record
pub const DEFAULT_RECORD_MAX_LEN: usize = 1024;

/// Allocation used when a pseudo-file reports a size of zero
pub const DEFAULT_READ_CAPACITY: usize = 20_000;

/// Wall-clock budget for one isolated probe child
pub const DEFAULT_ISOLATION_TIMEOUT_MS: u64 = 5_000;

/// Error taxonomy for probe sources.
///
/// None of these are fatal to an aggregation pass: every probe maps them to
/// "this source produced no evidence" at its own boundary.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("source unavailable: {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("partial read of {path} after {bytes} bytes")]
    PartialRead { path: PathBuf, bytes: usize },

    #[error("isolation failure: {0}")]
    IsolationFailure(String),

    #[error("malformed entry: {0}")]
    MalformedEntry(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    pub fn unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProbeError::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    /// True for errors that simply mean "nothing to read here"
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ProbeError::SourceUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_display_names_path() {
        let err = ProbeError::unavailable(
            "/proc/1/mountinfo",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("/proc/1/mountinfo"));
    }

    #[test]
    fn test_io_conversion() {
        let err: ProbeError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert!(matches!(err, ProbeError::Io(_)));
        assert!(!err.is_unavailable());
    }
}

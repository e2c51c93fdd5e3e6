use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything that can go wrong while inspecting or cleaning a file.
///
/// Only [`CleanError::InvalidPreset`] is a caller error that stops a batch
/// before it starts. The rest are per-file and end up inside a
/// [`CleaningResult`](crate::report::CleaningResult).
#[derive(Debug, Error)]
pub enum CleanError {
    #[error("unknown preset: {0}")]
    InvalidPreset(String),

    #[error("cannot open file {path}: {source}")]
    UnreadableSource {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("write failed: {0}")]
    WriteFailure(String),

    #[error("could not clear {tag}: {reason}")]
    PartialTagFailure { tag: String, reason: String },
}

/// Serializable discriminant of [`CleanError`], kept on results and history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidPreset,
    UnreadableSource,
    UnsupportedFormat,
    WriteFailure,
    PartialTagFailure,
}

impl CleanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPreset(_) => ErrorKind::InvalidPreset,
            Self::UnreadableSource { .. } => ErrorKind::UnreadableSource,
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::WriteFailure(_) => ErrorKind::WriteFailure,
            Self::PartialTagFailure { .. } => ErrorKind::PartialTagFailure,
        }
    }

    pub(crate) fn unreadable(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::UnreadableSource {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(context: &str, err: impl std::fmt::Display) -> Self {
        Self::WriteFailure(format!("{context}: {err}"))
    }
}

pub type Result<T, E = CleanError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(CleanError::InvalidPreset("x".into()).kind(), ErrorKind::InvalidPreset);
        assert_eq!(
            CleanError::unreadable("a.jpg", std::io::Error::other("gone")).kind(),
            ErrorKind::UnreadableSource
        );
        assert_eq!(
            CleanError::PartialTagFailure { tag: "Make".into(), reason: "locked".into() }.kind(),
            ErrorKind::PartialTagFailure
        );
    }

    #[test]
    fn messages_are_human_readable() {
        let err = CleanError::unreadable("a.jpg", std::io::Error::other("gone"));
        assert_eq!(err.to_string(), "cannot open file a.jpg: gone");

        let err = CleanError::write("Failed to commit", "disk full");
        assert_eq!(err.to_string(), "write failed: Failed to commit: disk full");
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::UnsupportedFormat).unwrap();
        assert_eq!(json, "\"unsupported_format\"");
    }
}

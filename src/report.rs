//! Per-file outcomes and batch summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{CleanError, ErrorKind};

/// Outcome of cleaning one file.
///
/// Built once when the rewrite finishes and never changed afterwards; the
/// caller may hand it to a [`HistoryLog`](crate::collab::HistoryLog).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningResult {
    pub success: bool,
    pub original_path: String,
    pub cleaned_path: Option<PathBuf>,
    pub original_size: u64,
    pub cleaned_size: Option<u64>,
    /// Display names, in catalog order.
    pub fields_removed: Vec<String>,
    pub metadata_removed_count: usize,
    /// Fields the container refused to clear.
    #[serde(default)]
    pub skipped_fields: Vec<String>,
    pub original_width: u32,
    pub original_height: u32,
    pub cleaned_width: u32,
    pub cleaned_height: u32,
    pub error_message: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub timestamp: DateTime<Utc>,
}

/// Success-side inputs for [`CleaningResult::succeeded`].
#[derive(Debug, Clone, Default)]
pub struct CleanedFile {
    pub original_path: String,
    pub cleaned_path: PathBuf,
    pub original_size: u64,
    pub cleaned_size: u64,
    pub fields_removed: Vec<String>,
    pub skipped_fields: Vec<String>,
    pub original_dimensions: (u32, u32),
    pub cleaned_dimensions: (u32, u32),
}

impl CleaningResult {
    pub fn succeeded(file: CleanedFile) -> Self {
        Self {
            success: true,
            original_path: file.original_path,
            cleaned_path: Some(file.cleaned_path),
            original_size: file.original_size,
            cleaned_size: Some(file.cleaned_size),
            metadata_removed_count: file.fields_removed.len(),
            fields_removed: file.fields_removed,
            skipped_fields: file.skipped_fields,
            original_width: file.original_dimensions.0,
            original_height: file.original_dimensions.1,
            cleaned_width: file.cleaned_dimensions.0,
            cleaned_height: file.cleaned_dimensions.1,
            error_message: None,
            error_kind: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(original_path: String, original_size: u64, error: &CleanError) -> Self {
        Self {
            success: false,
            original_path,
            cleaned_path: None,
            original_size,
            cleaned_size: None,
            fields_removed: Vec::new(),
            metadata_removed_count: 0,
            skipped_fields: Vec::new(),
            original_width: 0,
            original_height: 0,
            cleaned_width: 0,
            cleaned_height: 0,
            error_message: Some(error.to_string()),
            error_kind: Some(error.kind()),
            timestamp: Utc::now(),
        }
    }

    /// Bytes saved, negative if the file grew. `None` on failure.
    pub fn bytes_saved(&self) -> Option<i64> {
        match (self.success, self.cleaned_size) {
            (true, Some(cleaned)) => Some(self.original_size as i64 - cleaned as i64),
            _ => None,
        }
    }
}

/// Aggregate over a batch of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub bytes_saved: i64,
    pub fields_removed: usize,
}

impl BatchSummary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a CleaningResult>) -> Self {
        results.into_iter().fold(Self::default(), |mut s, r| {
            s.total += 1;
            if r.success {
                s.succeeded += 1;
                s.fields_removed += r.metadata_removed_count;
                s.bytes_saved += r.bytes_saved().unwrap_or(0);
            } else {
                s.failed += 1;
            }
            s
        })
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed out of {} images ({} fields removed, {} bytes saved)",
            self.succeeded, self.failed, self.total, self.fields_removed, self.bytes_saved
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(original: u64, cleaned: u64, removed: &[&str]) -> CleaningResult {
        CleaningResult::succeeded(CleanedFile {
            original_path: "a.jpg".into(),
            cleaned_path: PathBuf::from("out/a.jpg"),
            original_size: original,
            cleaned_size: cleaned,
            fields_removed: removed.iter().map(|s| s.to_string()).collect(),
            original_dimensions: (640, 480),
            cleaned_dimensions: (640, 480),
            ..Default::default()
        })
    }

    #[test]
    fn success_counts_removed_fields() {
        let r = ok(1000, 900, &["Make", "Model"]);
        assert!(r.success);
        assert_eq!(r.metadata_removed_count, 2);
        assert_eq!(r.bytes_saved(), Some(100));
        assert!(r.error_message.is_none());
    }

    #[test]
    fn failure_has_no_output() {
        let err = CleanError::UnsupportedFormat("not an image".into());
        let r = CleaningResult::failed("notes.txt".into(), 12, &err);
        assert!(!r.success);
        assert!(r.cleaned_path.is_none());
        assert_eq!(r.original_size, 12);
        assert_eq!(r.error_kind, Some(ErrorKind::UnsupportedFormat));
        assert_eq!(r.error_message.as_deref(), Some("unsupported format: not an image"));
        assert_eq!(r.bytes_saved(), None);
    }

    #[test]
    fn summary_only_counts_successful_savings() {
        let err = CleanError::WriteFailure("disk full".into());
        let results = vec![
            ok(1000, 900, &["Make"]),
            ok(500, 510, &[]),
            CleaningResult::failed("b.jpg".into(), 2000, &err),
        ];
        let s = BatchSummary::from_results(&results);
        assert_eq!(s.total, 3);
        assert_eq!(s.succeeded, 2);
        assert_eq!(s.failed, 1);
        assert_eq!(s.bytes_saved, 90);
        assert_eq!(s.fields_removed, 1);
        assert_eq!(
            s.to_string(),
            "2 succeeded, 1 failed out of 3 images (1 fields removed, 90 bytes saved)"
        );
    }

    #[test]
    fn result_round_trips_through_json() {
        let r = ok(10, 8, &["GPS Latitude"]);
        let json = serde_json::to_string(&r).unwrap();
        let back: CleaningResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}

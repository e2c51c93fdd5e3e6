//! Seams to the host application: stored preferences, cleaning history and
//! output file naming.

use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

use crate::report::CleaningResult;

/// Entries kept by the history logs unless configured otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// File name prefix for allocated copies.
pub const DEFAULT_FILE_PREFIX: &str = "MetaClean";

/// User preferences consulted when a batch does not name its own policy.
pub trait PreferenceStore: Send + Sync {
    /// Preset identifier, parsed with [`PresetId::from_str`](crate::policy::PresetId).
    fn default_preset(&self) -> String;
    /// `true` writes cleaned copies, `false` overwrites originals.
    fn save_as_copy(&self) -> bool;
}

/// Receives every finished [`CleaningResult`].
///
/// Failures are the caller's to log; they never change the outcome of the
/// file that was cleaned.
#[async_trait::async_trait]
pub trait HistoryLog: Send + Sync {
    async fn record(&self, result: &CleaningResult) -> Result<()>;
}

/// History persisted as a JSON array, newest first.
///
/// ```rust,no_run
/// use metastrip::collab::{HistoryLog, JsonHistoryLog};
///
/// # async fn example(result: metastrip::report::CleaningResult) -> anyhow::Result<()> {
/// let history = JsonHistoryLog::new("history.json").with_limit(50);
/// history.record(&result).await?;
/// println!("{} entries", history.load().await?.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct JsonHistoryLog {
    path: PathBuf,
    limit: usize,
    lock: Mutex<()>,
}

impl JsonHistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            limit: DEFAULT_HISTORY_LIMIT,
            lock: Mutex::new(()),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored entries, newest first. A missing file is an empty history.
    pub async fn load(&self) -> Result<Vec<CleaningResult>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read history file {}", self.path.display())
                });
            }
        };
        serde_json::from_str(&contents).context("Failed to parse history file")
    }
}

#[async_trait::async_trait]
impl HistoryLog for JsonHistoryLog {
    async fn record(&self, result: &CleaningResult) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut entries = self.load().await?;
        entries.insert(0, result.clone());
        entries.truncate(self.limit);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create history directory")?;
        }
        let contents = serde_json::to_string_pretty(&entries).context("Failed to serialize history")?;
        tokio::fs::write(&self.path, contents)
            .await
            .context("Failed to write history file")?;
        log::debug!("Recorded {} in {}", result.original_path, self.path.display());
        Ok(())
    }
}

/// In-process history, newest first.
#[derive(Debug)]
pub struct MemoryHistoryLog {
    entries: Mutex<Vec<CleaningResult>>,
    limit: usize,
}

impl Default for MemoryHistoryLog {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl MemoryHistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub async fn entries(&self) -> Vec<CleaningResult> {
        self.entries.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl HistoryLog for MemoryHistoryLog {
    async fn record(&self, result: &CleaningResult) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(0, result.clone());
        entries.truncate(self.limit);
        Ok(())
    }
}

/// Picks where a cleaned copy is written.
pub trait DestinationAllocator: Send + Sync {
    /// A path no earlier call has returned.
    fn allocate(&self, original_name: &str) -> PathBuf;
}

/// Names copies `<prefix>_<millis>_<counter>.<ext>` inside one directory.
#[derive(Debug)]
pub struct DirectoryAllocator {
    dir: PathBuf,
    prefix: String,
    counter: AtomicU64,
}

impl DirectoryAllocator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: DEFAULT_FILE_PREFIX.to_string(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DestinationAllocator for DirectoryAllocator {
    fn allocate(&self, original_name: &str) -> PathBuf {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .unwrap_or("jpg");
        let millis = chrono::Utc::now().timestamp_millis();
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!("{}_{millis}_{n}.{ext}", self.prefix))
    }
}

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use walkdir::WalkDir;

use crate::collab::{DestinationAllocator, DirectoryAllocator, HistoryLog, JsonHistoryLog, PreferenceStore};
use crate::config::Config;
use crate::error::{CleanError, Result};
use crate::exif::{self, MetadataSnapshot};
use crate::policy::{self, CategoryOverrides, DecisionSet, PolicyInput};
use crate::report::{BatchSummary, CleaningResult};
use crate::rewrite::{OutputTarget, RewriteEngine};
use crate::source::{FileSource, Source};

/// Extensions picked up when walking directories.
const IMAGE_EXTENSIONS: &[&str] = &[
    // Rewritable
    "jpg", "jpeg", "png", "webp",
    // Inspect only
    "tif", "tiff",
];

/// Results of one batch, in input order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub results: Vec<CleaningResult>,
    pub summary: BatchSummary,
}

/// Cleans batches of images concurrently.
///
/// Each file is rewritten on tokio's blocking pool, at most `max_parallel`
/// at a time. Files are independent: one failure never affects another, and
/// the report keeps the order the sources were given in.
///
/// # Example
///
/// ```rust,no_run
/// use metastrip::config::Config;
/// use metastrip::pipeline::{Cleaner, collect_images};
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = Config::load(Some("config.json".as_ref()))?;
///     let cleaner = Cleaner::from_config(&config)?;
///
///     let images = collect_images(&[PathBuf::from("./photos")]);
///     let report = cleaner.clean_paths_with_preferences(&config, &images).await?;
///
///     for result in &report.results {
///         match &result.error_message {
///             Some(err) => eprintln!("Error cleaning {}: {err}", result.original_path),
///             None => println!("Cleaned: {}", result.original_path),
///         }
///     }
///     println!("{}", report.summary);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Cleaner {
    engine: Arc<RewriteEngine>,
    allocator: Arc<dyn DestinationAllocator>,
    history: Option<Arc<dyn HistoryLog>>,
    max_parallel: usize,
}

impl Cleaner {
    pub fn new(engine: RewriteEngine, allocator: Arc<dyn DestinationAllocator>) -> Self {
        Self {
            engine: Arc::new(engine),
            allocator,
            history: None,
            max_parallel: 4,
        }
    }

    pub fn with_history(mut self, history: Arc<dyn HistoryLog>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Build a cleaner from configuration: copies go to `output.output_dir`,
    /// and a JSON history is kept if enabled.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let allocator = DirectoryAllocator::new(&config.output.output_dir)
            .with_prefix(config.output.file_prefix.clone());
        let mut cleaner = Self::new(RewriteEngine::new(config.rewrite_options()), Arc::new(allocator))
            .with_max_parallel(config.output.max_parallel);
        if let Some(path) = config.history_path()? {
            let history = JsonHistoryLog::new(path).with_limit(config.history.limit);
            cleaner = cleaner.with_history(Arc::new(history));
        }
        Ok(cleaner)
    }

    pub fn engine(&self) -> &RewriteEngine {
        &self.engine
    }

    /// Clean every source under one policy.
    pub async fn clean_batch(
        &self,
        sources: Vec<Arc<dyn Source>>,
        policy: &PolicyInput,
        save_as_copy: bool,
    ) -> BatchReport {
        let decisions = policy::resolve(policy);
        self.run(sources, decisions, save_as_copy).await
    }

    /// Clean every source with the stored default preset and save mode.
    ///
    /// An unknown preset fails the whole call before any file is touched.
    pub async fn clean_with_preferences(
        &self,
        preferences: &dyn PreferenceStore,
        sources: Vec<Arc<dyn Source>>,
    ) -> Result<BatchReport> {
        let decisions = policy::resolve_named(&preferences.default_preset(), CategoryOverrides::default())?;
        Ok(self.run(sources, decisions, preferences.save_as_copy()).await)
    }

    /// [`clean_with_preferences`](Self::clean_with_preferences) over local files.
    pub async fn clean_paths_with_preferences(
        &self,
        preferences: &dyn PreferenceStore,
        paths: &[PathBuf],
    ) -> Result<BatchReport> {
        let sources = paths
            .iter()
            .map(|p| Arc::new(FileSource::new(p)) as Arc<dyn Source>)
            .collect();
        self.clean_with_preferences(preferences, sources).await
    }

    async fn run(&self, sources: Vec<Arc<dyn Source>>, decisions: DecisionSet, save_as_copy: bool) -> BatchReport {
        log::info!(
            "Cleaning {} images ({})",
            sources.len(),
            if save_as_copy { "copy" } else { "overwrite" }
        );

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut pending = Vec::with_capacity(sources.len());

        for source in sources {
            let target = if save_as_copy {
                OutputTarget::Copy(self.allocator.allocate(source.name()))
            } else {
                OutputTarget::Overwrite
            };
            let locator = source.locator();
            let size = source.size_hint().unwrap_or(0);
            // The semaphore is never closed.
            let permit = semaphore.clone().acquire_owned().await.ok();
            let engine = self.engine.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                engine.rewrite(source.as_ref(), &decisions, &target)
            });
            pending.push((locator, size, handle));
        }

        let mut results = Vec::with_capacity(pending.len());
        for (locator, size, handle) in pending {
            let result = match handle.await {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("Worker for {locator} did not finish: {e}");
                    let err = CleanError::WriteFailure(format!("worker did not finish: {e}"));
                    CleaningResult::failed(locator, size, &err)
                }
            };
            if let Some(history) = &self.history {
                if let Err(e) = history.record(&result).await {
                    log::warn!("Failed to record history for {}: {e:#}", result.original_path);
                }
            }
            results.push(result);
        }

        let summary = BatchSummary::from_results(&results);
        log::info!("Done: {summary}");
        BatchReport { results, summary }
    }
}

/// Read a source's metadata on the blocking pool.
pub async fn inspect(source: Arc<dyn Source>) -> Result<MetadataSnapshot> {
    let locator = source.locator();
    tokio::task::spawn_blocking(move || exif::extract(source.as_ref()))
        .await
        .map_err(|e| CleanError::unreadable(locator, io::Error::other(e.to_string())))?
}

/// Collect supported image files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks). Only files with supported image
/// extensions are included.
///
/// # Example
///
/// ```rust,no_run
/// use metastrip::pipeline::collect_images;
/// use std::path::PathBuf;
///
/// let images = collect_images(&[
///     PathBuf::from("photo.jpg"),       // single file
///     PathBuf::from("./photos/"),        // entire directory
/// ]);
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_supported_image(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Check if a file has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

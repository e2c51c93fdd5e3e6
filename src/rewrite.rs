//! The rewrite engine: strip selected fields from one file and commit the
//! result atomically.
//!
//! Every rewrite stages its edits in a private working copy created next to
//! the destination. The destination (or, in overwrite mode, the original)
//! only changes at the final atomic rename; every earlier failure drops the
//! working copy and leaves the filesystem as it was.

use nom_exif::{ExifIter, MediaParser, MediaSource};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{CleanError, Result};
use crate::exif::{self, ExifContainer, ImageKind};
use crate::policy::DecisionSet;
use crate::report::{CleanedFile, CleaningResult};
use crate::source::{self, Source};
use crate::taxonomy::{Category, Tag};

/// Per-file lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteState {
    Pending,
    Reading,
    Rewriting,
    Committing,
    Succeeded,
    Failed,
}

/// Where the cleaned file goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write a new file; the original is left alone.
    Copy(PathBuf),
    /// Replace the original. Requires a source backed by a local file.
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Fields that must survive any policy. Attempts to clear them are
    /// reported in `skipped_fields`.
    pub preserve: Vec<Tag>,
    /// Re-read the staged file and fail if GPS data is still visible after a
    /// GPS-removing policy.
    pub verify_gps_removal: bool,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            preserve: Vec::new(),
            verify_gps_removal: true,
        }
    }
}

/// Observation points inside a rewrite. Returning an error from the
/// observer aborts the rewrite at that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Checkpoint<'a> {
    State(RewriteState),
    Cleared(&'a str),
}

/// Strips metadata from files according to a [`DecisionSet`].
///
/// # Example
///
/// ```rust,no_run
/// use metastrip::policy::{self, PolicyInput, PresetId};
/// use metastrip::rewrite::{OutputTarget, RewriteEngine};
/// use metastrip::source::FileSource;
///
/// let engine = RewriteEngine::default();
/// let decisions = policy::resolve(&PolicyInput::preset(PresetId::SocialSafe));
/// let result = engine.rewrite(
///     &FileSource::new("photo.jpg"),
///     &decisions,
///     &OutputTarget::Copy("photo-clean.jpg".into()),
/// );
/// if result.success {
///     println!("Removed: {}", result.fields_removed.join(", "));
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RewriteEngine {
    options: RewriteOptions,
}

impl RewriteEngine {
    pub fn new(options: RewriteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Clean one file. Never fails: errors come back inside the result.
    pub fn rewrite(
        &self,
        source: &dyn Source,
        decisions: &DecisionSet,
        target: &OutputTarget,
    ) -> CleaningResult {
        self.run(source, decisions, target, &mut |_| Ok(()))
    }

    pub(crate) fn run(
        &self,
        source: &dyn Source,
        decisions: &DecisionSet,
        target: &OutputTarget,
        observer: &mut dyn FnMut(Checkpoint<'_>) -> Result<()>,
    ) -> CleaningResult {
        let locator = source.locator();
        let mut original_size = source.size_hint().unwrap_or(0);
        log::debug!("{locator}: {:?}", RewriteState::Pending);

        match self.stage_and_commit(source, decisions, target, observer, &mut original_size) {
            Ok(file) => {
                log::debug!("{locator}: {:?}", RewriteState::Succeeded);
                log::info!(
                    "Cleaned {locator}: {} fields removed, {} -> {} bytes",
                    file.fields_removed.len(),
                    file.original_size,
                    file.cleaned_size
                );
                CleaningResult::succeeded(file)
            }
            Err(e) => {
                log::debug!("{locator}: {:?}", RewriteState::Failed);
                log::warn!("Failed to clean {locator}: {e}");
                CleaningResult::failed(locator, original_size, &e)
            }
        }
    }

    fn stage_and_commit(
        &self,
        source: &dyn Source,
        decisions: &DecisionSet,
        target: &OutputTarget,
        observer: &mut dyn FnMut(Checkpoint<'_>) -> Result<()>,
        original_size: &mut u64,
    ) -> Result<CleanedFile> {
        let locator = source.locator();
        enter(&locator, RewriteState::Reading, observer)?;

        let destination = match target {
            OutputTarget::Copy(path) => path.clone(),
            OutputTarget::Overwrite => source
                .local_path()
                .ok_or_else(|| CleanError::WriteFailure(format!("{locator} cannot be overwritten in place")))?
                .to_path_buf(),
        };

        let bytes = source::read_all(source)?;
        *original_size = bytes.len() as u64;

        let kind = ImageKind::detect(&bytes).ok_or_else(|| {
            CleanError::UnsupportedFormat(format!(
                "{} ({}) is not a supported image",
                source.name(),
                exif::mime_type_for_name(source.name())
            ))
        })?;
        if !kind.can_rewrite() {
            return Err(CleanError::UnsupportedFormat(format!(
                "{} files can be inspected but not rewritten",
                kind.mime_type()
            )));
        }

        let (_, block) = exif::read_exif_block(&bytes)?;
        let mut container = block.as_deref().map(ExifContainer::parse).transpose()?;
        let original_dimensions = exif::pixel_dimensions(&bytes, container.as_ref()).unwrap_or((0, 0));

        let mut working = new_working_copy(&destination)?;
        working
            .as_file_mut()
            .write_all(&bytes)
            .map_err(|e| CleanError::write("Failed to stage working copy", e))?;

        enter(&locator, RewriteState::Rewriting, observer)?;

        let mut report = exif::StripReport::default();
        if let Some(c) = container.as_mut() {
            c.protect(self.options.preserve.iter().map(|t| t.key()));
            report = exif::strip_fields(c, decisions, &mut |name| observer(Checkpoint::Cleared(name)))?;
        }

        let mut fields_removed = report.removed;
        let output = if fields_removed.is_empty() && !decisions.remove_all {
            bytes
        } else {
            let new_block = match container {
                Some(c) if !c.is_empty() => Some(c.to_bytes()?),
                _ => None,
            };
            let replaced = exif::replace_exif_block(&bytes, kind, new_block, decisions.remove_all)?;
            fields_removed.extend(replaced.extra_removed);
            replaced.bytes
        };

        let file = working.as_file_mut();
        file.set_len(0)
            .and_then(|_| file.seek(SeekFrom::Start(0)))
            .and_then(|_| file.write_all(&output))
            .and_then(|_| file.sync_all())
            .map_err(|e| CleanError::write("Failed to write working copy", e))?;

        let preserves_gps = self
            .options
            .preserve
            .iter()
            .any(|t| t.category() == Category::Gps);
        if self.options.verify_gps_removal
            && decisions.removes(Category::Gps)
            && !preserves_gps
            && gps_survives(working.path())
        {
            return Err(CleanError::WriteFailure(
                "GPS data still readable after rewrite".into(),
            ));
        }

        enter(&locator, RewriteState::Committing, observer)?;

        // The working copy is created owner-only; take the mode of the file
        // being replaced, or of the source for a fresh copy.
        let template = [Some(destination.as_path()), source.local_path()]
            .into_iter()
            .flatten()
            .find_map(|p| std::fs::metadata(p).ok());
        if let Some(meta) = template {
            std::fs::set_permissions(working.path(), meta.permissions())
                .map_err(|e| CleanError::write("Failed to copy file permissions", e))?;
        }

        working
            .persist(&destination)
            .map_err(|e| CleanError::write("Failed to commit cleaned file", e.error))?;

        // Committed. Everything below is best-effort.
        let cleaned_size = std::fs::metadata(&destination)
            .map(|m| m.len())
            .unwrap_or(output.len() as u64);
        let cleaned_dimensions = image::ImageReader::open(&destination)
            .ok()
            .and_then(|r| r.with_guessed_format().ok())
            .and_then(|r| r.into_dimensions().ok())
            .unwrap_or(original_dimensions);

        Ok(CleanedFile {
            original_path: locator,
            cleaned_path: destination,
            original_size: *original_size,
            cleaned_size,
            fields_removed,
            skipped_fields: report.skipped,
            original_dimensions,
            cleaned_dimensions,
        })
    }
}

fn enter(
    locator: &str,
    state: RewriteState,
    observer: &mut dyn FnMut(Checkpoint<'_>) -> Result<()>,
) -> Result<()> {
    log::debug!("{locator}: {state:?}");
    observer(Checkpoint::State(state))
}

/// A hidden temporary file in the destination's directory, so the final
/// rename never crosses filesystems. Deleted on drop unless persisted.
fn new_working_copy(destination: &Path) -> Result<tempfile::NamedTempFile> {
    let dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)
        .map_err(|e| CleanError::write(&format!("Failed to create {}", dir.display()), e))?;
    tempfile::Builder::new()
        .prefix(".metastrip-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|e| CleanError::write("Failed to create working copy", e))
}

/// Independent check with nom-exif's GPS parser.
fn gps_survives(path: &Path) -> bool {
    let mut parser = MediaParser::new();
    let Ok(ms) = MediaSource::file_path(path) else {
        return false;
    };
    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(_) => return false,
    };
    iter.parse_gps_info().ok().flatten().is_some()
}

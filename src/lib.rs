//! # metastrip
//!
//! Strip privacy-sensitive metadata from images: GPS coordinates, capture
//! timestamps, camera identity and editing software. Fields are grouped into
//! categories, named presets decide which categories go, and every rewrite
//! is staged in a private working copy that is committed atomically, so a
//! failure never leaves a half-cleaned file behind.
//!
//! ## Quick Start
//!
//! The simplest way to use the library is through the pipeline module, which
//! handles policy resolution, concurrent rewriting and the batch summary:
//!
//! ```rust,no_run
//! use metastrip::config::Config;
//! use metastrip::pipeline::{Cleaner, collect_images};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Default preset, output directory, preserved tags, history
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!     let cleaner = Cleaner::from_config(&config)?;
//!
//!     // Collect supported image files from paths (files or directories)
//!     let images = collect_images(&[PathBuf::from("./photos")]);
//!
//!     let report = cleaner.clean_paths_with_preferences(&config, &images).await?;
//!     for result in &report.results {
//!         if let Some(ref err) = result.error_message {
//!             eprintln!("Error cleaning {}: {err}", result.original_path);
//!         } else {
//!             println!(
//!                 "Cleaned {} ({} fields removed)",
//!                 result.original_path, result.metadata_removed_count
//!             );
//!         }
//!     }
//!     println!("{}", report.summary);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! For more control, inspect a file, resolve a policy and run the rewrite
//! engine yourself:
//!
//! ```rust,no_run
//! use metastrip::exif::extract_path;
//! use metastrip::policy::{self, CategoryOverrides, PolicyInput};
//! use metastrip::rewrite::{OutputTarget, RewriteEngine};
//! use metastrip::source::FileSource;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let path = Path::new("photo.jpg");
//!
//!     // 1. Preview what is there
//!     let snapshot = extract_path(path)?;
//!     println!("Camera: {:?}, GPS: {}", snapshot.camera_model, snapshot.has_gps);
//!
//!     // 2. Pick categories
//!     let decisions = policy::resolve(&PolicyInput::custom(CategoryOverrides {
//!         gps: Some(true),
//!         datetime: Some(true),
//!         ..Default::default()
//!     }));
//!
//!     // 3. Rewrite into a copy
//!     let result = RewriteEngine::default().rewrite(
//!         &FileSource::new(path),
//!         &decisions,
//!         &OutputTarget::Copy("photo-clean.jpg".into()),
//!     );
//!     println!("Removed: {:?}", result.fields_removed);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Presets
//!
//! | Preset | Removes |
//! |--------|---------|
//! | Social Safe (`SOCIAL_SAFE`) | GPS, software |
//! | Anonymous (`ANONYMOUS`) | Everything, including XMP and IPTC blocks |
//! | Professional Photographer (`PROFESSIONAL`) | GPS |
//! | Remove GPS Only (`GPS_ONLY`) | GPS |
//! | Custom (`CUSTOM`) | Whatever the category overrides select |
//!
//! ## Supported Formats
//!
//! | Format | Support |
//! |--------|---------|
//! | JPEG (`.jpg`, `.jpeg`) | Inspect and rewrite (EXIF in APP1) |
//! | PNG (`.png`) | Inspect and rewrite (`eXIf` chunk) |
//! | WebP (`.webp`) | Inspect and rewrite (`EXIF` chunk) |
//! | TIFF (`.tif`, `.tiff`) | Inspect only |
//!
//! ## Modules
//!
//! - [`taxonomy`]: Known fields, their categories and display names
//! - [`policy`]: Presets and category overrides resolved to a decision set
//! - [`exif`]: EXIF container codec, embedding, snapshot extraction and stripping
//! - [`source`]: Readable image handles (files, in-memory bytes)
//! - [`rewrite`]: Per-file rewrite engine with atomic commit
//! - [`report`]: Per-file results and batch summaries
//! - [`collab`]: Preferences, history and destination naming
//! - [`config`]: Configuration types and loading/saving
//! - [`pipeline`]: Batch cleaning and image collection
//! - [`error`]: Error kinds

pub mod collab;
pub mod config;
pub mod error;
pub mod exif;
pub mod pipeline;
pub mod policy;
pub mod report;
pub mod rewrite;
pub mod source;
pub mod taxonomy;

pub use error::{CleanError, ErrorKind};

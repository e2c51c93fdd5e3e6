use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::embed::{self, ImageKind};
use super::ifd::ExifContainer;
use super::value::display_value;
use crate::error::{CleanError, Result};
use crate::source::{self, FileSource, Source};
use crate::taxonomy::{self, FieldKey, Tag};

/// Read-only view of a file's metadata, for preview before cleaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataSnapshot {
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    /// Display name to value, catalogued fields first in catalog order.
    pub exif: IndexMap<String, String>,
    pub has_gps: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date_time_taken: Option<String>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub lens: Option<String>,
    pub iso: Option<String>,
    pub shutter_speed: Option<String>,
    pub aperture: Option<String>,
    pub focal_length: Option<String>,
    pub software: Option<String>,
}

impl MetadataSnapshot {
    pub fn is_empty(&self) -> bool {
        self.exif.is_empty()
    }
}

/// Inspect a source without modifying it.
///
/// A file without an EXIF block yields an empty snapshot. Files that are
/// not JPEG, PNG, WebP or TIFF, or whose EXIF block is corrupt, fail with
/// [`CleanError::UnsupportedFormat`].
pub fn extract(source: &dyn Source) -> Result<MetadataSnapshot> {
    let bytes = source::read_all(source)?;

    let mut snapshot = MetadataSnapshot {
        file_path: source.locator(),
        file_name: source.name().to_string(),
        file_size: bytes.len() as u64,
        mime_type: embed::mime_type_for_name(source.name()).to_string(),
        ..Default::default()
    };

    let Some(kind) = ImageKind::detect(&bytes) else {
        return Err(CleanError::UnsupportedFormat(format!(
            "{} ({}) is not a supported image",
            source.name(),
            snapshot.mime_type
        )));
    };
    snapshot.mime_type = kind.mime_type().to_string();

    let (_, block) = embed::read_exif_block(&bytes)?;
    let Some(block) = block else {
        log::debug!("No EXIF data found in {}", source.locator());
        return Ok(snapshot);
    };
    let container = ExifContainer::parse(&block)?;

    fill(&mut snapshot, &container);
    Ok(snapshot)
}

/// Shorthand for [`extract`] on a local file.
pub fn extract_path(path: &Path) -> Result<MetadataSnapshot> {
    extract(&FileSource::new(path))
}

fn fill(snapshot: &mut MetadataSnapshot, container: &ExifContainer) {
    let shown = |key: FieldKey| container.value(key).map(|v| display_value(key, &v));

    for d in taxonomy::all_tags() {
        if let Some(v) = shown(d.key) {
            snapshot.exif.insert(d.display_name.to_string(), v);
        }
    }
    for key in container.keys() {
        if taxonomy::lookup(key).is_none() {
            if let Some(v) = shown(key) {
                snapshot.exif.insert(taxonomy::display_name(key).into_owned(), v);
            }
        }
    }

    let text = |tag: Tag| shown(tag.key()).filter(|s| !s.is_empty());

    snapshot.latitude = coordinate(container, Tag::GpsLatitude, Tag::GpsLatitudeRef, 'N', 'S');
    snapshot.longitude = coordinate(container, Tag::GpsLongitude, Tag::GpsLongitudeRef, 'E', 'W');
    // Both halves are needed for a position.
    snapshot.has_gps = snapshot.latitude.is_some() && snapshot.longitude.is_some();
    if !snapshot.has_gps {
        snapshot.latitude = None;
        snapshot.longitude = None;
    }

    snapshot.date_time_taken = text(Tag::DateTimeOriginal).or_else(|| text(Tag::DateTime));
    snapshot.camera_make = text(Tag::Make);
    snapshot.camera_model = text(Tag::Model);
    snapshot.lens = text(Tag::LensModel).or_else(|| text(Tag::LensMake));
    snapshot.iso = text(Tag::PhotographicSensitivity).or_else(|| text(Tag::IsoSpeed));
    snapshot.shutter_speed = text(Tag::ExposureTime);
    snapshot.aperture = text(Tag::FNumber).map(|v| format!("f/{v}"));
    snapshot.focal_length = text(Tag::FocalLength).map(|v| format!("{v} mm"));
    snapshot.software = text(Tag::Software);
}

/// Decimal degrees from a degrees/minutes/seconds field and its hemisphere
/// reference. Missing or unrecognized references give `None`.
fn coordinate(
    container: &ExifContainer,
    value: Tag,
    reference: Tag,
    positive: char,
    negative: char,
) -> Option<f64> {
    let reference = container.tag_value(reference)?;
    let hemisphere = reference.as_text()?.chars().next()?.to_ascii_uppercase();
    let parts = container.tag_value(value)?.as_f64s()?;
    if parts.is_empty() {
        return None;
    }

    let degrees = parts[0];
    let minutes = parts.get(1).copied().unwrap_or(0.0);
    let seconds = parts.get(2).copied().unwrap_or(0.0);
    let coord = degrees + minutes / 60.0 + seconds / 3600.0;

    if hemisphere == positive {
        Some(coord)
    } else if hemisphere == negative {
        Some(-coord)
    } else {
        None
    }
}

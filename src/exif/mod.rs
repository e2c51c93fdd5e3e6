//! EXIF container reading, stripping and re-embedding.
//!
//! - [`extract`]: Read a file's metadata into a [`MetadataSnapshot`] for preview
//! - [`ExifContainer`]: Parse, edit and serialize the TIFF-structured EXIF block
//! - [`strip_fields`]: Clear the fields a [`DecisionSet`](crate::policy::DecisionSet) selects
//! - [`read_exif_block`] / [`replace_exif_block`]: Move the block in and out of
//!   JPEG, PNG and WebP files without touching pixel data

mod embed;
mod ifd;
mod reader;
mod value;
mod writer;

pub use embed::{
    IPTC_RECORD, ImageKind, Replaced, XMP_PACKET, mime_type_for_name, pixel_dimensions,
    read_exif_block, replace_exif_block,
};
pub use ifd::{Entry, ExifContainer};
pub use reader::{MetadataSnapshot, extract, extract_path};
pub use value::{ByteOrder, Value, display_value, format_rational, type_size};
pub use writer::{StripReport, strip_fields};

//! Locating and replacing the EXIF block inside an image file.
//!
//! Category policies act on EXIF fields only. XMP and IPTC blocks are left
//! alone unless every field is being removed, in which case they are dropped
//! whole. GPS properties inside an XMP packet therefore survive a GPS-only
//! clean.

use image::ImageReader;
use img_parts::jpeg::{Jpeg, JpegSegment};
use img_parts::png::Png;
use img_parts::riff::{RiffChunk, RiffContent};
use img_parts::webp::{CHUNK_ALPH, CHUNK_ANIM, CHUNK_EXIF, CHUNK_ICCP, CHUNK_VP8L, CHUNK_VP8X, CHUNK_XMP, WebP};
use img_parts::{Bytes, ImageEXIF};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

use super::ifd::ExifContainer;
use crate::error::{CleanError, Result};
use crate::taxonomy::Tag;

const EXIF_PREFIX: &[u8] = b"Exif\0\0";
const XMP_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const XMP_EXTENSION_HEADER: &[u8] = b"http://ns.adobe.com/xmp/extension/\0";
const IPTC_HEADER: &[u8] = b"Photoshop 3.0\0";
const PNG_XMP_KEYWORD: &[u8] = b"XML:com.adobe.xmp\0";

// VP8X feature flags
const VP8X_ICC: u8 = 0x20;
const VP8X_ALPHA: u8 = 0x10;
const VP8X_EXIF: u8 = 0x08;
const VP8X_XMP: u8 = 0x04;

/// Largest EXIF payload one JPEG APP1 segment can carry
/// (65535 minus the length field and `Exif\0\0`).
const JPEG_MAX_EXIF: usize = 65535 - 2 - EXIF_PREFIX.len();

/// Reported when XMP segments or chunks are dropped.
pub const XMP_PACKET: &str = "XMP Packet";
/// Reported when JPEG IPTC segments are dropped.
pub const IPTC_RECORD: &str = "IPTC Record";

/// Container format of an image file.
///
/// # Example
///
/// ```rust
/// use metastrip::exif::ImageKind;
///
/// assert_eq!(ImageKind::detect(b"\xFF\xD8\xFF\xE0"), Some(ImageKind::Jpeg));
/// assert_eq!(ImageKind::Png.mime_type(), "image/png");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
    WebP,
    /// Inspect only; the image data of a TIFF lives in its own IFDs.
    Tiff,
}

impl ImageKind {
    /// Sniff the format from magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::WebP)
        } else if bytes.starts_with(b"II\x2a\x00") || bytes.starts_with(b"MM\x00\x2a") {
            Some(Self::Tiff)
        } else {
            None
        }
    }

    /// Determine the kind from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Tiff => "image/tiff",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Tiff => "tiff",
        }
    }

    pub fn can_rewrite(self) -> bool {
        !matches!(self, Self::Tiff)
    }
}

/// MIME type guessed from a file name, for files the sniffer does not know.
pub fn mime_type_for_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "avif" => "image/avif",
        "dng" => "image/x-adobe-dng",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

fn parse_err(kind: ImageKind, e: impl std::fmt::Display) -> CleanError {
    CleanError::UnsupportedFormat(format!("failed to parse {}: {e}", kind.mime_type()))
}

/// Find the raw EXIF block (TIFF structure, without `Exif\0\0`).
pub fn read_exif_block(bytes: &[u8]) -> Result<(ImageKind, Option<Vec<u8>>)> {
    let kind = ImageKind::detect(bytes)
        .ok_or_else(|| CleanError::UnsupportedFormat("not a JPEG, PNG, WebP or TIFF image".into()))?;
    let data = Bytes::copy_from_slice(bytes);

    let exif = match kind {
        ImageKind::Jpeg => Jpeg::from_bytes(data).map_err(|e| parse_err(kind, e))?.exif(),
        ImageKind::Png => Png::from_bytes(data).map_err(|e| parse_err(kind, e))?.exif(),
        ImageKind::WebP => WebP::from_bytes(data).map_err(|e| parse_err(kind, e))?.exif(),
        ImageKind::Tiff => return Ok((kind, Some(bytes.to_vec()))),
    };

    // Some PNG/WebP writers keep the JPEG-style prefix.
    let exif = exif.map(|b| match b.strip_prefix(EXIF_PREFIX) {
        Some(rest) => rest.to_vec(),
        None => b.to_vec(),
    });
    Ok((kind, exif.filter(|b| !b.is_empty())))
}

/// Output of [`replace_exif_block`].
#[derive(Debug)]
pub struct Replaced {
    pub bytes: Vec<u8>,
    /// Non-EXIF metadata blocks that were dropped, if asked to.
    pub extra_removed: Vec<String>,
}

/// Swap the EXIF block of an image, leaving every other segment or chunk
/// untouched. `None` removes the block. With `strip_extras`, XMP and IPTC
/// blocks are dropped as well.
pub fn replace_exif_block(
    bytes: &[u8],
    kind: ImageKind,
    exif: Option<Vec<u8>>,
    strip_extras: bool,
) -> Result<Replaced> {
    let data = Bytes::copy_from_slice(bytes);
    let mut extra_removed = Vec::new();

    let out = match kind {
        ImageKind::Jpeg => {
            if let Some(ref b) = exif {
                if b.len() > JPEG_MAX_EXIF {
                    return Err(CleanError::WriteFailure(format!(
                        "EXIF block of {} bytes does not fit in a JPEG APP1 segment",
                        b.len()
                    )));
                }
            }
            let mut jpeg = Jpeg::from_bytes(data).map_err(|e| parse_err(kind, e))?;
            let orig_pos = find_exif_segment_pos(jpeg.segments());
            jpeg.set_exif(exif.map(Bytes::from));

            // set_exif() inserts near the start, which may land after XMP.
            // Put the segment back where it was.
            if let (Some(target), Some(new_pos)) = (orig_pos, find_exif_segment_pos(jpeg.segments())) {
                if target < new_pos {
                    let segments = jpeg.segments_mut();
                    let seg = segments.remove(new_pos);
                    segments.insert(target, seg);
                }
            }

            if strip_extras {
                let segments = jpeg.segments_mut();
                let before = segments.len();
                segments.retain(|s| !is_xmp_segment(s));
                if segments.len() != before {
                    extra_removed.push(XMP_PACKET.to_string());
                }
                let before = segments.len();
                segments.retain(|s| !(s.marker() == 0xED && s.contents().starts_with(IPTC_HEADER)));
                if segments.len() != before {
                    extra_removed.push(IPTC_RECORD.to_string());
                }
            }
            jpeg.encoder().bytes()
        }
        ImageKind::Png => {
            let mut png = Png::from_bytes(data).map_err(|e| parse_err(kind, e))?;
            png.set_exif(exif.map(Bytes::from));
            if strip_extras {
                let chunks = png.chunks_mut();
                let before = chunks.len();
                chunks.retain(|c| !(c.kind() == *b"iTXt" && c.contents().starts_with(PNG_XMP_KEYWORD)));
                if chunks.len() != before {
                    extra_removed.push(XMP_PACKET.to_string());
                }
            }
            png.encoder().bytes()
        }
        ImageKind::WebP => {
            let mut webp = WebP::from_bytes(data).map_err(|e| parse_err(kind, e))?;
            let vp8x = webp.chunk_by_id(CHUNK_VP8X).cloned();
            webp.set_exif(exif.map(Bytes::from));
            if strip_extras && webp.has_chunk(CHUNK_XMP) {
                webp.remove_chunks_by_id(CHUNK_XMP);
                extra_removed.push(XMP_PACKET.to_string());
            }
            settle_vp8x(&mut webp, vp8x);
            webp.encoder().bytes()
        }
        ImageKind::Tiff => {
            return Err(CleanError::UnsupportedFormat(
                "TIFF files can be inspected but not rewritten".into(),
            ));
        }
    };

    Ok(Replaced {
        bytes: out.to_vec(),
        extra_removed,
    })
}

fn find_exif_segment_pos(segments: &[JpegSegment]) -> Option<usize> {
    segments
        .iter()
        .position(|s| s.marker() == 0xE1 && s.contents().starts_with(EXIF_PREFIX))
}

fn is_xmp_segment(s: &JpegSegment) -> bool {
    s.marker() == 0xE1
        && (s.contents().starts_with(XMP_HEADER) || s.contents().starts_with(XMP_EXTENSION_HEADER))
}

/// Bring the `VP8X` header back in line with the chunks a WebP still
/// carries. img-parts drops it once ICC and EXIF are both gone, and never
/// updates its flags.
fn settle_vp8x(webp: &mut WebP, original: Option<RiffChunk>) {
    let extended = [CHUNK_ICCP, CHUNK_ALPH, CHUNK_ANIM, CHUNK_EXIF, CHUNK_XMP]
        .iter()
        .any(|id| webp.has_chunk(*id));
    if !extended {
        webp.remove_chunks_by_id(CHUNK_VP8X);
        return;
    }
    if !webp.has_chunk(CHUNK_VP8X) {
        match original {
            Some(chunk) => webp.chunks_mut().insert(0, chunk),
            None => return,
        }
    }

    let mut flags = 0;
    for (id, bit) in [(CHUNK_ICCP, VP8X_ICC), (CHUNK_EXIF, VP8X_EXIF), (CHUNK_XMP, VP8X_XMP)] {
        if webp.has_chunk(id) {
            flags |= bit;
        }
    }
    if webp.has_chunk(CHUNK_ALPH) || vp8l_has_alpha(webp) {
        flags |= VP8X_ALPHA;
    }

    let Some(chunk) = webp.chunks_mut().iter_mut().find(|c| c.id() == CHUNK_VP8X) else {
        return;
    };
    if let RiffContent::Data(data) = chunk.content_mut() {
        if let Some(&first) = data.first() {
            let mut header = data.to_vec();
            header[0] = (first & !(VP8X_ICC | VP8X_EXIF | VP8X_XMP)) | flags;
            *data = Bytes::from(header);
        }
    }
}

/// Alpha hint bit of a lossless bitstream header.
fn vp8l_has_alpha(webp: &WebP) -> bool {
    webp.chunk_by_id(CHUNK_VP8L)
        .and_then(|c| c.content().data())
        .and_then(|d| d.get(1..5))
        .map(|b| (u32::from_le_bytes([b[0], b[1], b[2], b[3]]) >> 28) & 1 == 1)
        .unwrap_or(false)
}

/// Pixel dimensions from the image header, falling back to the EXIF
/// dimension fields when the header cannot be read.
pub fn pixel_dimensions(bytes: &[u8], exif: Option<&ExifContainer>) -> Option<(u32, u32)> {
    let from_header = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()
        .and_then(|r| r.into_dimensions().ok());
    if from_header.is_some() {
        return from_header;
    }

    let exif = exif?;
    let dim = |tags: [Tag; 2]| {
        tags.iter()
            .find_map(|t| exif.tag_value(*t).and_then(|v| v.first_u32()))
    };
    match (
        dim([Tag::PixelXDimension, Tag::ImageWidth]),
        dim([Tag::PixelYDimension, Tag::ImageLength]),
    ) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
        _ => None,
    }
}

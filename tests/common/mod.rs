#![allow(dead_code)]

use image::{ImageFormat, Rgb, RgbImage};
use img_parts::jpeg::{Jpeg, JpegSegment};
use img_parts::riff::{RiffChunk, RiffContent};
use img_parts::webp::{CHUNK_XMP, WebP};
use img_parts::{Bytes, ImageEXIF};
use metastrip::exif::{ByteOrder, ExifContainer, ImageKind, Value, replace_exif_block};
use metastrip::taxonomy::{FieldKey, IfdGroup, Tag};
use std::io::Cursor;
use std::path::{Path, PathBuf};

pub const WIDTH: u32 = 48;
pub const HEIGHT: u32 = 32;

pub fn encoded(format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(WIDTH, HEIGHT, |x, y| Rgb([(x * 5) as u8, (y * 7) as u8, 90]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
    buffer
}

/// GPS fields set by [`camera_container`].
pub const GPS_FIELDS: usize = 5;

/// What a phone camera typically writes: position, timestamps, device,
/// software, exposure, plus one uncatalogued field per directory.
pub fn camera_container(order: ByteOrder) -> ExifContainer {
    let mut c = ExifContainer::new(order);
    c.set_tag(Tag::Make, Value::Ascii("Acme".into()))
        .set_tag(Tag::Model, Value::Ascii("Pocket 12".into()))
        .set_tag(Tag::Orientation, Value::Short(vec![1]))
        .set_tag(Tag::Software, Value::Ascii("Pocket OS 17.2".into()))
        .set_tag(Tag::DateTime, Value::Ascii("2024:06:30 18:04:11".into()))
        .set_tag(Tag::DateTimeOriginal, Value::Ascii("2024:06:30 18:04:11".into()))
        .set_tag(Tag::ExposureTime, Value::Rational(vec![(1, 250)]))
        .set_tag(Tag::FNumber, Value::Rational(vec![(18, 10)]))
        .set_tag(Tag::LensModel, Value::Ascii("Wide 4.2mm f/1.8".into()))
        .set_tag(Tag::GpsLatitudeRef, Value::Ascii("N".into()))
        .set_tag(Tag::GpsLatitude, Value::Rational(vec![(48, 1), (51, 1), (2964, 100)]))
        .set_tag(Tag::GpsLongitudeRef, Value::Ascii("E".into()))
        .set_tag(Tag::GpsLongitude, Value::Rational(vec![(2, 1), (17, 1), (4010, 100)]))
        .set_tag(Tag::GpsAltitude, Value::Rational(vec![(35, 1)]))
        .set(FieldKey::new(IfdGroup::Exif, 0xEA1C), Value::Undefined(vec![0; 12]))
        .set(FieldKey::new(IfdGroup::Primary, 0xC000), Value::Long(vec![7]));
    c
}

pub fn with_exif(image: &[u8], kind: ImageKind, container: &ExifContainer) -> Vec<u8> {
    replace_exif_block(image, kind, Some(container.to_bytes().unwrap()), false)
        .unwrap()
        .bytes
}

pub fn camera_jpeg() -> Vec<u8> {
    with_exif(&encoded(ImageFormat::Jpeg), ImageKind::Jpeg, &camera_container(ByteOrder::Little))
}

pub fn camera_png() -> Vec<u8> {
    with_exif(&encoded(ImageFormat::Png), ImageKind::Png, &camera_container(ByteOrder::Big))
}

pub fn camera_webp() -> Vec<u8> {
    with_exif(&encoded(ImageFormat::WebP), ImageKind::WebP, &camera_container(ByteOrder::Little))
}

pub const XMP_GPS: &[u8] = b"<exif:GPSLatitude>48,51N</exif:GPSLatitude>";

fn xmp_packet() -> Vec<u8> {
    let mut xmp = b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\">".to_vec();
    xmp.extend_from_slice(XMP_GPS);
    xmp.extend_from_slice(b"</x:xmpmeta>");
    xmp
}

/// Append an `XMP ` chunk carrying a GPS property.
pub fn with_webp_xmp(webp: &[u8]) -> Vec<u8> {
    let mut parsed = WebP::from_bytes(Bytes::copy_from_slice(webp)).unwrap();
    parsed
        .chunks_mut()
        .push(RiffChunk::new(CHUNK_XMP, RiffContent::Data(Bytes::from(xmp_packet()))));
    parsed.encoder().bytes().to_vec()
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Add XMP and IPTC segments after the EXIF segment.
pub fn with_xmp_and_iptc(jpeg: &[u8]) -> Vec<u8> {
    let mut parsed = Jpeg::from_bytes(Bytes::copy_from_slice(jpeg)).unwrap();
    let mut xmp = b"http://ns.adobe.com/xap/1.0/\0".to_vec();
    xmp.extend_from_slice(&xmp_packet());
    let mut iptc = b"Photoshop 3.0\0".to_vec();
    iptc.extend_from_slice(b"8BIM\x04\x04\0\0\0\0\0\x00");

    let at = parsed.segments().len().min(2);
    let segments = parsed.segments_mut();
    segments.insert(at, JpegSegment::new_with_contents(0xED, Bytes::from(iptc)));
    segments.insert(at, JpegSegment::new_with_contents(0xE1, Bytes::from(xmp)));
    parsed.encoder().bytes().to_vec()
}

/// The raw EXIF block of a written file, parsed.
pub fn container_of(bytes: &[u8]) -> Option<ExifContainer> {
    let (_, block) = metastrip::exif::read_exif_block(bytes).unwrap();
    block.map(|b| ExifContainer::parse(&b).unwrap())
}

pub fn has_jpeg_exif_segment(bytes: &[u8]) -> bool {
    Jpeg::from_bytes(Bytes::copy_from_slice(bytes)).unwrap().exif().is_some()
}

pub fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

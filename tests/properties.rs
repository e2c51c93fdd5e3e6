mod common;

use common::*;
use metastrip::error::ErrorKind;
use metastrip::exif::{self, ByteOrder, ExifContainer, ImageKind, IPTC_RECORD, Value, XMP_PACKET};
use metastrip::policy::{self, CategoryOverrides, PolicyInput, PresetId};
use metastrip::rewrite::{OutputTarget, RewriteEngine, RewriteOptions};
use metastrip::source::{FileSource, MemorySource, Source};
use metastrip::taxonomy::{self, Category, Tag};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tempfile::TempDir;

fn clean(bytes: &[u8], name: &str, input: &PolicyInput, dest: &Path) -> metastrip::report::CleaningResult {
    RewriteEngine::default().rewrite(
        &MemorySource::new(name, bytes.to_vec()),
        &policy::resolve(input),
        &OutputTarget::Copy(dest.to_path_buf()),
    )
}

fn every_policy() -> Vec<PolicyInput> {
    let mut inputs: Vec<PolicyInput> = PresetId::ALL.iter().map(|p| PolicyInput::preset(*p)).collect();
    for bits in 0..16u8 {
        inputs.push(PolicyInput::custom(CategoryOverrides {
            gps: Some(bits & 1 != 0),
            datetime: Some(bits & 2 != 0),
            camera: Some(bits & 4 != 0),
            software: Some(bits & 8 != 0),
        }));
    }
    inputs
}

// ── idempotence ──────────────────────────────────────────────────────

#[test]
fn cleaning_twice_removes_nothing_more() {
    let dir = TempDir::new().unwrap();
    for (i, input) in every_policy().iter().enumerate() {
        let once = dir.path().join(format!("once_{i}.jpg"));
        let twice = dir.path().join(format!("twice_{i}.jpg"));

        let first = clean(&camera_jpeg(), "a.jpg", input, &once);
        assert!(first.success, "{input:?}: {:?}", first.error_message);
        let second = clean(&fs::read(&once).unwrap(), "a.jpg", input, &twice);
        assert!(second.success);
        assert!(second.fields_removed.is_empty(), "{input:?}: {:?}", second.fields_removed);

        let a = exif::extract_path(&once).unwrap();
        let b = exif::extract_path(&twice).unwrap();
        assert_eq!(a.exif, b.exif);
    }
}

#[test]
fn cleaning_webp_twice_removes_nothing_more() {
    let dir = TempDir::new().unwrap();
    for (i, input) in every_policy().iter().enumerate() {
        let once = dir.path().join(format!("once_{i}.webp"));
        let twice = dir.path().join(format!("twice_{i}.webp"));

        let first = clean(&camera_webp(), "a.webp", input, &once);
        assert!(first.success, "{input:?}: {:?}", first.error_message);
        let second = clean(&fs::read(&once).unwrap(), "a.webp", input, &twice);
        assert!(second.success);
        assert!(second.fields_removed.is_empty(), "{input:?}: {:?}", second.fields_removed);

        let a = exif::extract_path(&once).unwrap();
        let b = exif::extract_path(&twice).unwrap();
        assert_eq!(a.exif, b.exif);
    }
}

// ── category closure ─────────────────────────────────────────────────

#[test]
fn only_selected_categories_change() {
    let dir = TempDir::new().unwrap();
    let original = camera_jpeg();
    let before = container_of(&original).unwrap();

    for (i, input) in every_policy().iter().enumerate() {
        let decisions = policy::resolve(input);
        let dest = dir.path().join(format!("{i}.jpg"));
        let r = clean(&original, "a.jpg", input, &dest);
        assert!(r.success);

        let after = container_of(&fs::read(&dest).unwrap());
        let after_keys: HashSet<_> = after.as_ref().map(|c| c.keys()).unwrap_or_default().into_iter().collect();

        for key in before.keys() {
            let removed = decisions.removes(taxonomy::category_of(key));
            assert_eq!(after_keys.contains(&key), !removed, "{input:?}: {key}");
        }
        if let Some(after) = after {
            for key in after.keys() {
                let (old, new) = (before.entry(key).unwrap(), after.entry(key).unwrap());
                assert_eq!(old.format(), new.format(), "{key}");
                assert_eq!(old.count(), new.count(), "{key}");
                assert_eq!(old.raw(), new.raw(), "{key}");
            }
        }
    }
}

#[test]
fn remove_all_is_a_superset_of_every_policy() {
    let dir = TempDir::new().unwrap();
    let original = camera_jpeg();
    let all = clean(&original, "a.jpg", &PolicyInput::preset(PresetId::Anonymous), &dir.path().join("all.jpg"));
    let everything: HashSet<_> = all.fields_removed.iter().cloned().collect();

    for (i, input) in every_policy().iter().enumerate() {
        let r = clean(&original, "a.jpg", input, &dir.path().join(format!("{i}.jpg")));
        for name in &r.fields_removed {
            assert!(everything.contains(name), "{input:?} removed {name}");
        }
    }
}

// ── presets end to end ───────────────────────────────────────────────

#[test]
fn social_safe_keeps_date_and_camera() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("out.jpg");
    let r = clean(&camera_jpeg(), "a.jpg", &PolicyInput::preset(PresetId::SocialSafe), &dest);

    assert!(r.success);
    assert_eq!(r.metadata_removed_count, GPS_FIELDS + 1);
    assert!(r.fields_removed.contains(&"Software".to_string()));
    assert!(r.fields_removed.contains(&"GPS Latitude".to_string()));

    let snap = exif::extract_path(&dest).unwrap();
    assert!(!snap.has_gps);
    assert_eq!(snap.software, None);
    assert_eq!(snap.date_time_taken.as_deref(), Some("2024:06:30 18:04:11"));
    assert_eq!(snap.camera_make.as_deref(), Some("Acme"));
}

#[test]
fn anonymous_leaves_no_metadata() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("out.jpg");
    let input = with_xmp_and_iptc(&camera_jpeg());

    let r = clean(&input, "a.jpg", &PolicyInput::preset(PresetId::Anonymous), &dest);

    assert!(r.success, "{:?}", r.error_message);
    let tail: Vec<&str> = r.fields_removed.iter().rev().take(2).map(|s| s.as_str()).collect();
    assert_eq!(tail, vec![IPTC_RECORD, XMP_PACKET]);
    assert_eq!(r.fields_removed[r.fields_removed.len() - 3], "Unknown tag 0xEA1C (Exif)");

    let cleaned = fs::read(&dest).unwrap();
    assert!(!has_jpeg_exif_segment(&cleaned));
    assert!(!cleaned.windows(28).any(|w| w == b"http://ns.adobe.com/xap/1.0/"));
    assert!(exif::extract_path(&dest).unwrap().is_empty());
    assert_eq!((r.cleaned_width, r.cleaned_height), (WIDTH, HEIGHT));
}

#[test]
fn anonymous_cleans_png_too() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("out.png");
    let r = clean(&camera_png(), "a.png", &PolicyInput::preset(PresetId::Anonymous), &dest);

    assert!(r.success, "{:?}", r.error_message);
    assert!(exif::extract_path(&dest).unwrap().is_empty());
    let img = image::open(&dest).unwrap();
    assert_eq!((img.width(), img.height()), (WIDTH, HEIGHT));
}

#[test]
fn anonymous_cleans_webp_including_xmp() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("out.webp");
    let input = with_webp_xmp(&camera_webp());
    assert!(contains(&input, XMP_GPS));

    let r = clean(&input, "a.webp", &PolicyInput::preset(PresetId::Anonymous), &dest);

    assert!(r.success, "{:?}", r.error_message);
    assert_eq!(r.fields_removed.last().map(|s| s.as_str()), Some(XMP_PACKET));
    let cleaned = fs::read(&dest).unwrap();
    assert!(!contains(&cleaned, XMP_GPS));
    assert!(exif::extract_path(&dest).unwrap().is_empty());
    let img = image::open(&dest).unwrap();
    assert_eq!((img.width(), img.height()), (WIDTH, HEIGHT));
}

#[test]
fn gps_only_cleans_webp() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("out.webp");
    let r = clean(&camera_webp(), "a.webp", &PolicyInput::preset(PresetId::GpsOnly), &dest);

    assert!(r.success, "{:?}", r.error_message);
    assert_eq!(r.metadata_removed_count, GPS_FIELDS);
    let snap = exif::extract_path(&dest).unwrap();
    assert!(!snap.has_gps);
    assert_eq!(snap.camera_make.as_deref(), Some("Acme"));
    assert_eq!(snap.software.as_deref(), Some("Pocket OS 17.2"));
    assert_eq!((r.cleaned_width, r.cleaned_height), (WIDTH, HEIGHT));
}

#[test]
fn newer_identity_fields_follow_their_categories() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("out.jpg");
    let mut c = ExifContainer::new(ByteOrder::Big);
    c.set_tag(Tag::Software, Value::Ascii("Pocket OS 17.2".into()))
        .set_tag(Tag::Photographer, Value::Ascii("Jane Doe".into()))
        .set_tag(Tag::CameraFirmware, Value::Ascii("FW 1.2".into()))
        .set_tag(Tag::ImageEditingSoftware, Value::Ascii("Lightroom 13".into()))
        .set_tag(Tag::MetadataEditingSoftware, Value::Ascii("Tagger 2".into()))
        .set_tag(Tag::CameraSerialNumber, Value::Ascii("SN-0042".into()));
    let original = with_exif(&encoded(image::ImageFormat::Jpeg), ImageKind::Jpeg, &c);

    let r = clean(&original, "a.jpg", &PolicyInput::custom(CategoryOverrides::all(true)), &dest);

    assert!(r.success, "{:?}", r.error_message);
    for name in [
        "Software",
        "Camera Firmware",
        "Image Editing Software",
        "Metadata Editing Software",
        "Camera Serial Number",
    ] {
        assert!(r.fields_removed.contains(&name.to_string()), "{name} kept");
    }
    let after = container_of(&fs::read(&dest).unwrap()).unwrap();
    assert_eq!(after.keys(), vec![Tag::Photographer.key()]);
}

#[test]
fn utf8_text_fields_do_not_block_cleaning() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("out.jpg");
    let mut c = camera_container(ByteOrder::Little);
    c.set_tag(Tag::ImageDescription, Value::Utf8("Café am Fluss".into()));
    let original = with_exif(&encoded(image::ImageFormat::Jpeg), ImageKind::Jpeg, &c);

    let gps = clean(&original, "a.jpg", &PolicyInput::preset(PresetId::GpsOnly), &dir.path().join("gps.jpg"));
    assert!(gps.success, "{:?}", gps.error_message);
    let kept = container_of(&fs::read(dir.path().join("gps.jpg")).unwrap()).unwrap();
    assert_eq!(kept.tag_value(Tag::ImageDescription), Some(Value::Utf8("Café am Fluss".into())));

    let r = clean(&original, "a.jpg", &PolicyInput::preset(PresetId::Anonymous), &dest);
    assert!(r.success, "{:?}", r.error_message);
    assert!(r.fields_removed.contains(&"Image Description".to_string()));
    assert!(exif::extract_path(&dest).unwrap().is_empty());
}

#[test]
fn custom_nothing_leaves_file_as_is() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("out.jpg");
    let original = camera_jpeg();
    let r = clean(&original, "a.jpg", &PolicyInput::custom(CategoryOverrides::all(false)), &dest);

    assert!(r.success);
    assert!(r.fields_removed.is_empty());
    assert_eq!(r.metadata_removed_count, 0);
    assert_eq!((r.original_width, r.original_height), (r.cleaned_width, r.cleaned_height));
    assert_eq!(fs::read(&dest).unwrap(), original);
}

#[test]
fn professional_keeps_thumbnail() {
    let dir = TempDir::new().unwrap();
    let thumb = encoded(image::ImageFormat::Jpeg);
    let mut c = camera_container(ByteOrder::Big);
    c.set_tag(Tag::ThumbnailCompression, exif::Value::Short(vec![6]))
        .set_thumbnail_jpeg(thumb.clone());
    let original = with_exif(&encoded(image::ImageFormat::Jpeg), ImageKind::Jpeg, &c);

    let kept = dir.path().join("kept.jpg");
    assert!(clean(&original, "a.jpg", &PolicyInput::preset(PresetId::Professional), &kept).success);
    assert_eq!(container_of(&fs::read(&kept).unwrap()).unwrap().thumbnail_jpeg(), Some(thumb.as_slice()));

    let gone = dir.path().join("gone.jpg");
    let r = clean(&original, "a.jpg", &PolicyInput::preset(PresetId::Anonymous), &gone);
    assert!(r.fields_removed.contains(&"Thumbnail Offset".to_string()));
    assert!(container_of(&fs::read(&gone).unwrap()).is_none());
}

#[test]
fn preserved_field_survives_anonymous() {
    let dir = TempDir::new().unwrap();
    let src = write(dir.path(), "in.jpg", &camera_jpeg());
    let dest = dir.path().join("out.jpg");
    let engine = RewriteEngine::new(RewriteOptions {
        preserve: vec![Tag::Orientation],
        ..Default::default()
    });

    let r = engine.rewrite(
        &FileSource::new(&src),
        &policy::resolve(&PolicyInput::preset(PresetId::Anonymous)),
        &OutputTarget::Copy(dest.clone()),
    );

    assert!(r.success);
    assert_eq!(r.skipped_fields, vec!["Orientation"]);
    let after = container_of(&fs::read(&dest).unwrap()).unwrap();
    assert_eq!(after.keys(), vec![Tag::Orientation.key()]);
    assert!(Tag::Orientation.category() == Category::Other);
}

// ── all-or-nothing ───────────────────────────────────────────────────

/// Hands out the first half of an image, then fails.
struct BrokenSource(Vec<u8>);

impl Source for BrokenSource {
    fn name(&self) -> &str {
        "broken.jpg"
    }

    fn locator(&self) -> String {
        "test:broken.jpg".into()
    }

    fn open(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        let half = &self.0[..self.0.len() / 2];
        Ok(Box::new(half.chain(FailingReader)))
    }
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "source went away"))
    }
}

#[test]
fn failed_read_leaves_destination_untouched() {
    let dir = TempDir::new().unwrap();
    let dest = write(dir.path(), "out.jpg", b"earlier result");

    let r = RewriteEngine::default().rewrite(
        &BrokenSource(camera_jpeg()),
        &policy::resolve(&PolicyInput::preset(PresetId::Anonymous)),
        &OutputTarget::Copy(dest.clone()),
    );

    assert!(!r.success);
    assert_eq!(r.error_kind, Some(ErrorKind::UnreadableSource));
    assert_eq!(fs::read(&dest).unwrap(), b"earlier result");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn overwrite_failure_keeps_original() {
    let dir = TempDir::new().unwrap();
    let src = write(dir.path(), "scan.tif", &camera_container(ByteOrder::Little).to_bytes().unwrap());
    let before = fs::read(&src).unwrap();

    let r = RewriteEngine::default().rewrite(
        &FileSource::new(&src),
        &policy::resolve(&PolicyInput::preset(PresetId::Anonymous)),
        &OutputTarget::Overwrite,
    );

    assert!(!r.success);
    assert_eq!(r.error_kind, Some(ErrorKind::UnsupportedFormat));
    assert_eq!(fs::read(&src).unwrap(), before);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

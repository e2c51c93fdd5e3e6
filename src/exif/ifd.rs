//! TIFF-structured EXIF container: parse, edit, serialize.
//!
//! The container holds up to five directories (IFD0, Exif, GPS, Interop and
//! the IFD1 thumbnail directory). Sub-directory pointers are structural and
//! never show up as fields; they are regenerated on write, and a directory
//! that ends up empty is dropped together with its pointer. Thumbnail
//! payloads are carried along and relocated. Entries the catalog does not
//! know are kept byte-for-byte.

use std::collections::HashSet;

use super::value::{self, ByteOrder, Value};
use crate::error::{CleanError, Result};
use crate::taxonomy::{self, FieldKey, IfdGroup, Tag};

const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_GPS_IFD: u16 = 0x8825;
const TAG_INTEROP_IFD: u16 = 0xA005;

const TAG_JPEG_OFFSET: u16 = 0x0201;
const TAG_JPEG_LENGTH: u16 = 0x0202;
const TAG_STRIP_OFFSETS: u16 = 0x0111;
const TAG_STRIP_BYTE_COUNTS: u16 = 0x0117;

/// One raw directory entry. `data` is in the container's byte order and
/// holds exactly `count` components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    code: u16,
    format: u16,
    count: u32,
    data: Vec<u8>,
}

impl Entry {
    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn format(&self) -> u16 {
        self.format
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn raw(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Thumbnail {
    Jpeg(Vec<u8>),
    Strips(Vec<Vec<u8>>),
}

/// An editable EXIF block.
#[derive(Debug, Clone)]
pub struct ExifContainer {
    order: ByteOrder,
    dirs: [Vec<Entry>; 5],
    thumbnail: Option<Thumbnail>,
    protected: HashSet<FieldKey>,
}

fn dir_index(group: IfdGroup) -> usize {
    match group {
        IfdGroup::Primary => 0,
        IfdGroup::Exif => 1,
        IfdGroup::Gps => 2,
        IfdGroup::Interop => 3,
        IfdGroup::Thumbnail => 4,
    }
}

fn is_pointer(key: FieldKey) -> bool {
    matches!(
        (key.group, key.code),
        (IfdGroup::Primary, TAG_EXIF_IFD) | (IfdGroup::Primary, TAG_GPS_IFD) | (IfdGroup::Exif, TAG_INTEROP_IFD)
    )
}

fn corrupt(what: impl Into<String>) -> CleanError {
    CleanError::UnsupportedFormat(format!("corrupt EXIF data: {}", what.into()))
}

impl ExifContainer {
    /// An empty container, for assembling EXIF from scratch.
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            dirs: Default::default(),
            thumbnail: None,
            protected: HashSet::new(),
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    /// Parse a TIFF-structured block (the payload after `Exif\0\0`).
    pub fn parse(tiff: &[u8]) -> Result<Self> {
        if tiff.len() < 8 {
            return Err(corrupt("TIFF header too short"));
        }
        let order = match &tiff[0..2] {
            b"II" => ByteOrder::Little,
            b"MM" => ByteOrder::Big,
            _ => return Err(corrupt("invalid TIFF byte order")),
        };
        if order.u16(&tiff[2..4]) != 42 {
            return Err(corrupt("bad TIFF magic"));
        }

        let mut parser = Parser {
            tiff,
            order,
            visited: HashSet::new(),
        };
        let mut container = Self::new(order);

        let ifd0_offset = order.u32(&tiff[4..8]) as usize;
        let (ifd0, next) = parser.directory(ifd0_offset)?;

        for entry in ifd0 {
            match entry.code {
                TAG_EXIF_IFD => {
                    let (exif, _) = parser.directory(parser.pointer(&entry)?)?;
                    for e in exif {
                        if e.code == TAG_INTEROP_IFD {
                            let (interop, _) = parser.directory(parser.pointer(&e)?)?;
                            container.dirs[dir_index(IfdGroup::Interop)] = interop;
                        } else {
                            container.dirs[dir_index(IfdGroup::Exif)].push(e);
                        }
                    }
                }
                TAG_GPS_IFD => {
                    let (gps, _) = parser.directory(parser.pointer(&entry)?)?;
                    container.dirs[dir_index(IfdGroup::Gps)] = gps;
                }
                _ => container.dirs[dir_index(IfdGroup::Primary)].push(entry),
            }
        }

        if next != 0 {
            let (ifd1, next1) = parser.directory(next as usize)?;
            if next1 != 0 {
                log::debug!("Ignoring directories after IFD1 (next offset {next1})");
            }
            container.thumbnail = parser.thumbnail(&ifd1)?;
            container.dirs[dir_index(IfdGroup::Thumbnail)] = ifd1;
        }

        Ok(container)
    }

    // ========================================================================
    // Access and editing
    // ========================================================================

    /// Every field present, directory by directory in file order.
    pub fn keys(&self) -> Vec<FieldKey> {
        IfdGroup::ALL
            .iter()
            .flat_map(|g| {
                self.dirs[dir_index(*g)]
                    .iter()
                    .map(move |e| FieldKey::new(*g, e.code))
            })
            .collect()
    }

    pub fn entry(&self, key: FieldKey) -> Option<&Entry> {
        self.dirs[dir_index(key.group)]
            .iter()
            .find(|e| e.code == key.code)
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.entry(key).is_some()
    }

    pub fn value(&self, key: FieldKey) -> Option<Value> {
        let e = self.entry(key)?;
        Value::decode(e.format, &e.data, self.order)
    }

    pub fn tag_value(&self, tag: Tag) -> Option<Value> {
        self.value(tag.key())
    }

    /// Insert or replace a field. Directory pointers are managed by the
    /// container and cannot be set.
    pub fn set(&mut self, key: FieldKey, value: Value) -> &mut Self {
        if is_pointer(key) {
            log::warn!("Ignoring attempt to set directory pointer {key}");
            return self;
        }
        let (format, count, data) = value.encode(self.order);
        let entry = Entry {
            code: key.code,
            format,
            count,
            data,
        };
        let dir = &mut self.dirs[dir_index(key.group)];
        match dir.iter_mut().find(|e| e.code == key.code) {
            Some(slot) => *slot = entry,
            None => dir.push(entry),
        }
        self
    }

    pub fn set_tag(&mut self, tag: Tag, value: Value) -> &mut Self {
        self.set(tag.key(), value)
    }

    /// Attach a JPEG thumbnail; its offset and length fields are filled in
    /// on write.
    pub fn set_thumbnail_jpeg(&mut self, jpeg: Vec<u8>) -> &mut Self {
        let len = jpeg.len() as u32;
        self.set_tag(Tag::ThumbnailOffset, Value::Long(vec![0]));
        self.set_tag(Tag::ThumbnailLength, Value::Long(vec![len]));
        self.thumbnail = Some(Thumbnail::Jpeg(jpeg));
        self
    }

    pub fn thumbnail_jpeg(&self) -> Option<&[u8]> {
        match &self.thumbnail {
            Some(Thumbnail::Jpeg(b)) => Some(b),
            _ => None,
        }
    }

    /// Fields the container refuses to clear.
    pub fn protect(&mut self, keys: impl IntoIterator<Item = FieldKey>) {
        self.protected.extend(keys);
    }

    /// Remove a field. Returns whether it was present.
    pub fn clear(&mut self, key: FieldKey) -> Result<bool> {
        if !self.contains(key) {
            return Ok(false);
        }
        if self.protected.contains(&key) {
            return Err(CleanError::PartialTagFailure {
                tag: taxonomy::display_name(key).into_owned(),
                reason: "field is protected".to_string(),
            });
        }

        self.dirs[dir_index(key.group)].retain(|e| e.code != key.code);

        // Without its offset field the payload is unreachable.
        if key.group == IfdGroup::Thumbnail {
            let orphaned = matches!(
                (&self.thumbnail, key.code),
                (Some(Thumbnail::Jpeg(_)), TAG_JPEG_OFFSET) | (Some(Thumbnail::Strips(_)), TAG_STRIP_OFFSETS)
            );
            if orphaned {
                self.thumbnail = None;
            }
        }
        Ok(true)
    }

    /// No fields left in any directory.
    pub fn is_empty(&self) -> bool {
        self.dirs.iter().all(|d| d.is_empty())
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serialize to a TIFF-structured block with IFD0 at offset 8.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let order = self.order;
        let mut w = Writer {
            buf: Vec::new(),
            order,
        };

        w.buf.extend_from_slice(match order {
            ByteOrder::Little => b"II",
            ByteOrder::Big => b"MM",
        });
        order.put_u16(&mut w.buf, 42);
        order.put_u32(&mut w.buf, 8);

        let primary = &self.dirs[dir_index(IfdGroup::Primary)];
        let exif = &self.dirs[dir_index(IfdGroup::Exif)];
        let gps = &self.dirs[dir_index(IfdGroup::Gps)];
        let interop = &self.dirs[dir_index(IfdGroup::Interop)];
        let ifd1 = &self.dirs[dir_index(IfdGroup::Thumbnail)];

        let need_exif = !exif.is_empty() || !interop.is_empty();

        let mut ifd0_entries = primary.clone();
        if need_exif {
            ifd0_entries.push(pointer_placeholder(TAG_EXIF_IFD));
        }
        if !gps.is_empty() {
            ifd0_entries.push(pointer_placeholder(TAG_GPS_IFD));
        }
        let ifd0 = w.directory(ifd0_entries);

        if need_exif {
            let mut entries = exif.clone();
            if !interop.is_empty() {
                entries.push(pointer_placeholder(TAG_INTEROP_IFD));
            }
            let start = w.align();
            w.patch(ifd0.slot(TAG_EXIF_IFD), start)?;
            let exif_dir = w.directory(entries);

            if !interop.is_empty() {
                let start = w.align();
                w.patch(exif_dir.slot(TAG_INTEROP_IFD), start)?;
                w.directory(interop.clone());
            }
        }

        if !gps.is_empty() {
            let start = w.align();
            w.patch(ifd0.slot(TAG_GPS_IFD), start)?;
            w.directory(gps.clone());
        }

        if !ifd1.is_empty() {
            let start = w.align();
            w.patch(Some(ifd0.next), start)?;
            self.write_thumbnail_dir(&mut w, ifd1)?;
        }

        if w.buf.len() > u32::MAX as usize {
            return Err(CleanError::WriteFailure("EXIF block exceeds 4 GiB".into()));
        }
        Ok(w.buf)
    }

    fn write_thumbnail_dir(&self, w: &mut Writer, ifd1: &[Entry]) -> Result<()> {
        let mut entries = ifd1.to_vec();

        // Offset fields are rewritten as LONGs pointing at the relocated data.
        let has_code = |code: u16| entries.iter().any(|e| e.code == code);
        let payload = match &self.thumbnail {
            Some(Thumbnail::Jpeg(b)) if has_code(TAG_JPEG_OFFSET) => Some(vec![b.as_slice()]),
            Some(Thumbnail::Strips(s)) if has_code(TAG_STRIP_OFFSETS) => {
                Some(s.iter().map(|b| b.as_slice()).collect())
            }
            _ => None,
        };
        let offset_code = match &self.thumbnail {
            Some(Thumbnail::Jpeg(_)) => TAG_JPEG_OFFSET,
            _ => TAG_STRIP_OFFSETS,
        };
        if let Some(chunks) = &payload {
            for e in entries.iter_mut().filter(|e| e.code == offset_code) {
                e.format = value::LONG;
                e.count = chunks.len() as u32;
                e.data = vec![0; chunks.len() * 4];
            }
        }

        let dir = w.directory(entries);

        if let Some(chunks) = payload {
            let Some(slot) = dir.slot(offset_code) else {
                return Ok(());
            };
            for (i, chunk) in chunks.iter().enumerate() {
                let start = w.align();
                w.buf.extend_from_slice(chunk);
                w.patch(Some(slot + i * 4), start)?;
            }
        } else if self.thumbnail.is_some() {
            log::debug!("Thumbnail payload dropped: no offset field left in IFD1");
        }
        Ok(())
    }
}

fn pointer_placeholder(code: u16) -> Entry {
    Entry {
        code,
        format: value::LONG,
        count: 1,
        data: vec![0; 4],
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    tiff: &'a [u8],
    order: ByteOrder,
    visited: HashSet<usize>,
}

impl Parser<'_> {
    /// Read one directory; returns its entries and the next-IFD offset.
    fn directory(&mut self, offset: usize) -> Result<(Vec<Entry>, u32)> {
        let tiff = self.tiff;
        let order = self.order;

        if !self.visited.insert(offset) {
            return Err(corrupt(format!("directory loop at offset {offset}")));
        }
        if offset < 8 || offset + 2 > tiff.len() {
            return Err(corrupt(format!("directory offset {offset} out of bounds")));
        }

        let count = order.u16(&tiff[offset..]) as usize;
        let start = offset + 2;
        let end = start + count * 12;
        if end > tiff.len() {
            return Err(corrupt("directory entries extend beyond data"));
        }
        // Some writers omit the trailing next pointer on the last directory.
        let next = if end + 4 <= tiff.len() {
            order.u32(&tiff[end..])
        } else {
            0
        };

        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let at = start + i * 12;
            let code = order.u16(&tiff[at..]);
            let format = order.u16(&tiff[at + 2..]);
            let n = order.u32(&tiff[at + 4..]);

            let size = value::type_size(format)
                .ok_or_else(|| corrupt(format!("tag 0x{code:04X} has unknown type {format}")))?;
            let total = size
                .checked_mul(n as usize)
                .ok_or_else(|| corrupt(format!("tag 0x{code:04X} size overflows")))?;

            let data = if total <= 4 {
                tiff[at + 8..at + 8 + total].to_vec()
            } else {
                let value_offset = order.u32(&tiff[at + 8..]) as usize;
                let value_end = value_offset
                    .checked_add(total)
                    .filter(|e| *e <= tiff.len())
                    .ok_or_else(|| corrupt(format!("tag 0x{code:04X} value out of bounds")))?;
                tiff[value_offset..value_end].to_vec()
            };

            entries.push(Entry {
                code,
                format,
                count: n,
                data,
            });
        }

        Ok((entries, next))
    }

    fn pointer(&self, entry: &Entry) -> Result<usize> {
        match Value::decode(entry.format, &entry.data, self.order).and_then(|v| v.first_u32()) {
            Some(off) => Ok(off as usize),
            None => Err(corrupt(format!("bad pointer in tag 0x{:04X}", entry.code))),
        }
    }

    fn thumbnail(&self, ifd1: &[Entry]) -> Result<Option<Thumbnail>> {
        let uints = |code: u16| -> Option<Vec<u32>> {
            let e = ifd1.iter().find(|e| e.code == code)?;
            match Value::decode(e.format, &e.data, self.order)? {
                Value::Short(v) => Some(v.into_iter().map(u32::from).collect()),
                Value::Long(v) => Some(v),
                _ => None,
            }
        };

        if let (Some(off), Some(len)) = (uints(TAG_JPEG_OFFSET), uints(TAG_JPEG_LENGTH)) {
            let (Some(&off), Some(&len)) = (off.first(), len.first()) else {
                return Ok(None);
            };
            let chunk = self.chunk(off as usize, len as usize)?;
            return Ok(Some(Thumbnail::Jpeg(chunk)));
        }

        if let (Some(offs), Some(lens)) = (uints(TAG_STRIP_OFFSETS), uints(TAG_STRIP_BYTE_COUNTS)) {
            if offs.len() != lens.len() {
                return Err(corrupt("thumbnail strip offsets and byte counts differ in length"));
            }
            let strips = offs
                .iter()
                .zip(&lens)
                .map(|(o, l)| self.chunk(*o as usize, *l as usize))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Some(Thumbnail::Strips(strips)));
        }

        Ok(None)
    }

    fn chunk(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        if offset > self.tiff.len() {
            return Err(corrupt(format!("thumbnail offset {offset} out of bounds")));
        }
        let end = offset.saturating_add(len);
        if end > self.tiff.len() {
            // Common in camera output: the length overshoots the segment by a few bytes.
            log::warn!(
                "Thumbnail extends {} bytes past EXIF data, truncating",
                end - self.tiff.len()
            );
        }
        Ok(self.tiff[offset..end.min(self.tiff.len())].to_vec())
    }
}

// ============================================================================
// Writer
// ============================================================================

struct Writer {
    buf: Vec<u8>,
    order: ByteOrder,
}

/// Where a written directory's value fields and next pointer landed.
struct WrittenDir {
    slots: Vec<(u16, usize)>,
    next: usize,
}

impl WrittenDir {
    fn slot(&self, code: u16) -> Option<usize> {
        self.slots.iter().find(|(c, _)| *c == code).map(|(_, p)| *p)
    }
}

impl Writer {
    fn align(&mut self) -> usize {
        if self.buf.len() % 2 != 0 {
            self.buf.push(0);
        }
        self.buf.len()
    }

    fn patch(&mut self, pos: Option<usize>, value: usize) -> Result<()> {
        let pos = pos.ok_or_else(|| CleanError::WriteFailure("missing directory slot".into()))?;
        let value = u32::try_from(value)
            .map_err(|_| CleanError::WriteFailure("EXIF offset exceeds 4 GiB".into()))?;
        let mut bytes = Vec::with_capacity(4);
        self.order.put_u32(&mut bytes, value);
        self.buf[pos..pos + 4].copy_from_slice(&bytes);
        Ok(())
    }

    /// Write a directory followed by its overflow values.
    fn directory(&mut self, mut entries: Vec<Entry>) -> WrittenDir {
        entries.sort_by_key(|e| e.code);
        let order = self.order;
        let start = self.buf.len();

        order.put_u16(&mut self.buf, entries.len() as u16);
        let mut cursor = start + 2 + entries.len() * 12 + 4;
        let mut slots = Vec::with_capacity(entries.len());
        let mut overflow: Vec<&[u8]> = Vec::new();

        for e in &entries {
            order.put_u16(&mut self.buf, e.code);
            order.put_u16(&mut self.buf, e.format);
            order.put_u32(&mut self.buf, e.count);
            if e.data.len() <= 4 {
                slots.push((e.code, self.buf.len()));
                let mut inline = [0u8; 4];
                inline[..e.data.len()].copy_from_slice(&e.data);
                self.buf.extend_from_slice(&inline);
            } else {
                slots.push((e.code, cursor));
                order.put_u32(&mut self.buf, cursor as u32);
                overflow.push(&e.data);
                cursor += e.data.len() + e.data.len() % 2;
            }
        }

        let next = self.buf.len();
        order.put_u32(&mut self.buf, 0);

        for data in overflow {
            self.buf.extend_from_slice(data);
            if data.len() % 2 != 0 {
                self.buf.push(0);
            }
        }

        WrittenDir { slots, next }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(order: ByteOrder) -> ExifContainer {
        let mut c = ExifContainer::new(order);
        c.set_tag(Tag::Make, Value::Ascii("Acme".into()))
            .set_tag(Tag::Model, Value::Ascii("Shooter 3000".into()))
            .set_tag(Tag::Orientation, Value::Short(vec![1]))
            .set_tag(Tag::DateTimeOriginal, Value::Ascii("2024:05:01 10:00:00".into()))
            .set_tag(Tag::InteroperabilityIndex, Value::Ascii("R98".into()))
            .set_tag(Tag::GpsLatitudeRef, Value::Ascii("N".into()))
            .set_tag(Tag::GpsLatitude, Value::Rational(vec![(37, 1), (46, 1), (2964, 100)]));
        c
    }

    // ── parsing hand-assembled bytes ──────────────────────────────────

    #[test]
    fn parses_minimal_little_endian_block() {
        // IFD0 with Make="Acme" (inline) and Orientation=6.
        let mut b = b"II\x2a\x00\x08\x00\x00\x00".to_vec();
        b.extend_from_slice(&[2, 0]);
        b.extend_from_slice(&[0x0F, 0x01, 2, 0, 4, 0, 0, 0, b'A', b'c', b'm', 0]);
        b.extend_from_slice(&[0x12, 0x01, 3, 0, 1, 0, 0, 0, 6, 0, 0, 0]);
        b.extend_from_slice(&[0, 0, 0, 0]);

        let c = ExifContainer::parse(&b).unwrap();
        assert_eq!(c.tag_value(Tag::Make), Some(Value::Ascii("Acm".into())));
        assert_eq!(c.tag_value(Tag::Orientation), Some(Value::Short(vec![6])));
        assert_eq!(c.keys().len(), 2);
    }

    #[test]
    fn parses_utf8_typed_entry() {
        // IFD0 with ImageDescription stored as EXIF 3.0 UTF-8 (type 129).
        let text = "Zürich\0".as_bytes();
        let mut b = b"MM\x00\x2a\x00\x00\x00\x08".to_vec();
        b.extend_from_slice(&[0, 1]);
        b.extend_from_slice(&[0x01, 0x0E, 0x00, 0x81, 0, 0, 0, text.len() as u8, 0, 0, 0, 26]);
        b.extend_from_slice(&[0, 0, 0, 0]);
        b.extend_from_slice(text);

        let c = ExifContainer::parse(&b).unwrap();
        assert_eq!(c.tag_value(Tag::ImageDescription), Some(Value::Utf8("Zürich".into())));

        let back = ExifContainer::parse(&c.to_bytes().unwrap()).unwrap();
        let entry = back.entry(Tag::ImageDescription.key()).unwrap();
        assert_eq!(entry.format(), value::UTF8);
        assert_eq!(entry.raw(), text);
    }

    #[test]
    fn rejects_garbage() {
        assert!(ExifContainer::parse(b"XX\x2a\x00\x08\x00\x00\x00").is_err());
        assert!(ExifContainer::parse(b"II\x2b\x00\x08\x00\x00\x00").is_err());
        assert!(ExifContainer::parse(b"II").is_err());
        // IFD0 offset past the end
        assert!(ExifContainer::parse(b"II\x2a\x00\xff\x00\x00\x00").is_err());
    }

    #[test]
    fn rejects_directory_loop() {
        // IFD0 with zero entries whose next pointer points back at itself.
        let b = b"II\x2a\x00\x08\x00\x00\x00\x00\x00\x08\x00\x00\x00".to_vec();
        let err = ExifContainer::parse(&b).unwrap_err();
        assert!(err.to_string().contains("loop"));
    }

    // ── serialization ──────────────────────────────────────────────────

    #[test]
    fn write_then_parse_preserves_every_directory() {
        for order in [ByteOrder::Little, ByteOrder::Big] {
            let c = sample(order);
            let bytes = c.to_bytes().unwrap();
            let back = ExifContainer::parse(&bytes).unwrap();
            assert_eq!(back.byte_order(), order);
            assert_eq!(back.keys().len(), c.keys().len());
            for key in c.keys() {
                assert_eq!(back.value(key), c.value(key), "{key}");
            }
        }
    }

    #[test]
    fn empty_gps_directory_is_dropped() {
        let mut c = sample(ByteOrder::Little);
        c.clear(Tag::GpsLatitudeRef.key()).unwrap();
        c.clear(Tag::GpsLatitude.key()).unwrap();
        let back = ExifContainer::parse(&c.to_bytes().unwrap()).unwrap();
        assert!(back.keys().iter().all(|k| k.group != IfdGroup::Gps));
        // No pointer left behind in IFD0 either.
        assert!(back.entry(FieldKey::new(IfdGroup::Primary, TAG_GPS_IFD)).is_none());
    }

    #[test]
    fn interop_survives_without_other_exif_fields() {
        let mut c = sample(ByteOrder::Big);
        c.clear(Tag::DateTimeOriginal.key()).unwrap();
        let back = ExifContainer::parse(&c.to_bytes().unwrap()).unwrap();
        assert_eq!(
            back.tag_value(Tag::InteroperabilityIndex),
            Some(Value::Ascii("R98".into()))
        );
    }

    #[test]
    fn thumbnail_is_relocated() {
        let mut c = sample(ByteOrder::Little);
        let thumb = vec![0xFF, 0xD8, 1, 2, 3, 0xFF, 0xD9];
        c.set_thumbnail_jpeg(thumb.clone());
        c.set_tag(Tag::ThumbnailCompression, Value::Short(vec![6]));

        let first = ExifContainer::parse(&c.to_bytes().unwrap()).unwrap();
        assert_eq!(first.thumbnail_jpeg(), Some(thumb.as_slice()));

        let mut second = first.clone();
        second.clear(Tag::Make.key()).unwrap();
        let back = ExifContainer::parse(&second.to_bytes().unwrap()).unwrap();
        assert_eq!(back.thumbnail_jpeg(), Some(thumb.as_slice()));
    }

    #[test]
    fn clearing_thumbnail_offset_drops_payload() {
        let mut c = ExifContainer::new(ByteOrder::Little);
        c.set_thumbnail_jpeg(vec![0xFF, 0xD8, 0xFF, 0xD9]);
        assert!(c.clear(Tag::ThumbnailOffset.key()).unwrap());
        assert!(c.thumbnail_jpeg().is_none());
    }

    #[test]
    fn unknown_entries_round_trip_untouched() {
        let mut c = ExifContainer::new(ByteOrder::Little);
        let key = FieldKey::new(IfdGroup::Exif, 0xEA1C);
        c.set(key, Value::Undefined(vec![1, 2, 3, 4, 5, 6, 7]));
        let back = ExifContainer::parse(&c.to_bytes().unwrap()).unwrap();
        assert_eq!(back.entry(key).map(|e| e.raw().to_vec()), Some(vec![1, 2, 3, 4, 5, 6, 7]));
    }

    // ── editing ────────────────────────────────────────────────────────

    #[test]
    fn clear_reports_presence() {
        let mut c = sample(ByteOrder::Little);
        assert!(c.clear(Tag::Make.key()).unwrap());
        assert!(!c.clear(Tag::Make.key()).unwrap());
        assert!(!c.clear(Tag::Software.key()).unwrap());
    }

    #[test]
    fn protected_field_rejects_clear() {
        let mut c = sample(ByteOrder::Little);
        c.protect([Tag::Make.key()]);
        let err = c.clear(Tag::Make.key()).unwrap_err();
        assert!(matches!(err, CleanError::PartialTagFailure { ref tag, .. } if tag == "Make"));
        assert!(c.contains(Tag::Make.key()));
        // Absent protected fields are simply absent.
        c.protect([Tag::Software.key()]);
        assert!(!c.clear(Tag::Software.key()).unwrap());
    }

    #[test]
    fn pointers_cannot_be_set() {
        let mut c = ExifContainer::new(ByteOrder::Little);
        c.set(FieldKey::new(IfdGroup::Primary, TAG_GPS_IFD), Value::Long(vec![99]));
        assert!(c.is_empty());
    }
}

//! Where image bytes come from.

use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A readable image handle plus its original file name.
///
/// Sources are opened once per inspection or rewrite and dropped as soon as
/// the bytes are read. Only sources backed by a local file can be
/// overwritten in place.
pub trait Source: Send + Sync {
    /// Original file name, used for reporting and destination naming.
    fn name(&self) -> &str;

    /// Opaque identifier reported back as `original_path`.
    fn locator(&self) -> String;

    fn open(&self) -> io::Result<Box<dyn Read + Send + '_>>;

    /// Byte size if known without reading.
    fn size_hint(&self) -> Option<u64> {
        None
    }

    /// Backing file, if the source can be overwritten.
    fn local_path(&self) -> Option<&Path> {
        None
    }
}

/// An image on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Source for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn locator(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(File::open(&self.path)?))
    }

    fn size_hint(&self) -> Option<u64> {
        std::fs::metadata(&self.path).ok().map(|m| m.len())
    }

    fn local_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// An image already in memory, e.g. handed over by a content provider.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    bytes: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl Source for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn locator(&self) -> String {
        format!("memory:{}", self.name)
    }

    fn open(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(Cursor::new(&self.bytes[..])))
    }

    fn size_hint(&self) -> Option<u64> {
        Some(self.bytes.len() as u64)
    }
}

/// Read a whole source, mapping open failures to a readable error.
pub(crate) fn read_all(source: &dyn Source) -> crate::error::Result<Vec<u8>> {
    let mut reader = source
        .open()
        .map_err(|e| crate::error::CleanError::unreadable(source.locator(), e))?;
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| crate::error::CleanError::unreadable(source.locator(), e))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_source_reports_name_and_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("holiday.jpg");
        std::fs::write(&path, b"12345").unwrap();

        let src = FileSource::new(&path);
        assert_eq!(src.name(), "holiday.jpg");
        assert_eq!(src.size_hint(), Some(5));
        assert_eq!(src.local_path(), Some(path.as_path()));
        assert_eq!(read_all(&src).unwrap(), b"12345");
    }

    #[test]
    fn missing_file_is_unreadable() {
        let src = FileSource::new("/nonexistent/photo.jpg");
        let err = read_all(&src).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnreadableSource);
        assert_eq!(src.size_hint(), None);
    }

    #[test]
    fn memory_source_cannot_be_overwritten() {
        let src = MemorySource::new("shared.png", b"abc".to_vec());
        assert!(src.local_path().is_none());
        assert_eq!(src.locator(), "memory:shared.png");
        assert_eq!(read_all(&src).unwrap(), b"abc");
    }
}

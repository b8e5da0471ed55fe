//! ZIP container access for EPUB files.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::io::{ByteSource, ByteSourceCursor, FileSource, MemorySource};
use crate::util::normalize_archive_path;

/// An opened EPUB container.
///
/// Entry names are normalized on open (`\` to `/`, `.`/`..` resolved), so
/// lookups use the same form as paths resolved from OPF and NCX hrefs.
pub struct EpubArchive {
    zip: ZipArchive<ByteSourceCursor>,
    /// Normalized path -> raw entry name.
    entries: HashMap<String, String>,
    /// Lower-cased normalized path -> normalized path.
    folded: HashMap<String, String>,
    /// Normalized file paths, sorted.
    files: Vec<String>,
}

impl EpubArchive {
    /// Open an EPUB file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let source = FileSource::open(path)?;
        Self::from_source(Arc::new(source))
    }

    /// Open an EPUB held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_source(Arc::new(MemorySource::new(bytes)))
    }

    pub fn from_source(source: Arc<dyn ByteSource>) -> Result<Self> {
        let zip = ZipArchive::new(ByteSourceCursor::new(source))?;

        let mut entries = HashMap::new();
        let mut folded = HashMap::new();
        for raw in zip.file_names() {
            if raw.ends_with('/') {
                continue;
            }
            let path = normalize_archive_path(raw);
            if path.is_empty() {
                continue;
            }
            folded
                .entry(path.to_lowercase())
                .or_insert_with(|| path.clone());
            entries.insert(path, raw.to_string());
        }

        let mut files: Vec<String> = entries.keys().cloned().collect();
        files.sort();

        Ok(Self {
            zip,
            entries,
            folded,
            files,
        })
    }

    /// All file paths in the archive, sorted lexically.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Read an entry by its normalized path.
    ///
    /// Falls back to a case-insensitive match, which covers archives whose
    /// manifest and entry names disagree in case.
    pub fn read(&mut self, path: &str) -> Result<Vec<u8>> {
        let raw = self
            .lookup(path)
            .ok_or(Error::Zip(zip::result::ZipError::FileNotFound))?
            .to_string();

        let mut file = self.zip.by_name(&raw)?;
        let mut contents = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut contents)?;
        Ok(contents)
    }

    fn lookup(&self, path: &str) -> Option<&str> {
        let path = normalize_archive_path(path);
        self.entries
            .get(&path)
            .or_else(|| {
                self.folded
                    .get(&path.to_lowercase())
                    .and_then(|p| self.entries.get(p))
            })
            .map(String::as_str)
    }
}

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use thiserror::Error;
use zip::ZipArchive;

/// Errors raised while opening a workbook package.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("duplicate part name after normalization (possible invalid zip): {0}")]
    DuplicatePart(String),
}

/// An opened workbook package: part name → raw bytes.
///
/// Part names are normalized (forward slashes, no leading `/`) so lookups like
/// `xl/workbook.xml` work regardless of how the producing tool spelled them.
#[derive(Debug)]
pub struct WorkbookArchive {
    parts: BTreeMap<String, Vec<u8>>,
}

impl WorkbookArchive {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path)?;
        let mut zip = ZipArchive::new(file)?;
        Self::read_zip(&mut zip)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let cursor = Cursor::new(bytes);
        let mut zip = ZipArchive::new(cursor)?;
        Self::read_zip(&mut zip)
    }

    fn read_zip<R: Read + Seek>(zip: &mut ZipArchive<R>) -> Result<Self, ArchiveError> {
        let mut parts = BTreeMap::new();
        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = normalize_part_name(file.name());
            // Do not trust the declared size for allocation; ZIP metadata is
            // untrusted and can advertise enormous uncompressed sizes.
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)?;
            if parts.insert(name.clone(), buf).is_some() {
                return Err(ArchiveError::DuplicatePart(name));
            }
        }
        Ok(Self { parts })
    }

    /// Fetch a part by normalized name.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(|v| v.as_slice())
    }

    /// Iterate all parts.
    pub fn parts(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.parts.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

fn normalize_part_name(name: &str) -> String {
    let name = name.replace('\\', "/");
    name.trim_start_matches('/').to_string()
}

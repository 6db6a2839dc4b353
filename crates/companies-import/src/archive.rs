//! Zip archive access
//!
//! The daily archive holds a single CSV file. Its first entry is taken as
//! the data file regardless of its name and is streamed straight into the
//! decoder instead of being unpacked to disk.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use crate::error::{ImportError, Result};

/// An opened company data archive
pub struct CompanyArchive {
    path: PathBuf,
    zip: ZipArchive<BufReader<File>>,
}

impl CompanyArchive {
    /// Open the archive at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| ImportError::Archive(e.into()))?;
        let zip = ZipArchive::new(BufReader::new(file))?;

        debug!(path = %path.display(), entries = zip.len(), "Opened archive");

        Ok(Self {
            path: path.to_path_buf(),
            zip,
        })
    }

    /// Number of entries in the archive
    pub fn len(&self) -> usize {
        self.zip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zip.is_empty()
    }

    /// Stream the entry at index 0
    ///
    /// The returned reader borrows the archive; both stay open until the
    /// reader is dropped.
    pub fn first_entry(&mut self) -> Result<impl Read + '_> {
        if self.zip.is_empty() {
            return Err(ImportError::EmptyArchive(self.path.display().to_string()));
        }

        let entry = self.zip.by_index(0)?;
        debug!(
            name = entry.name(),
            size = entry.size(),
            compressed = entry.compressed_size(),
            "Reading first archive entry"
        );

        Ok(entry)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Write a zip with the given `(name, contents)` entries
    pub(crate) fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        for (name, contents) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_first_entry_ignores_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.zip");
        write_zip(
            &path,
            &[
                ("whatever-name.txt", b"first"),
                ("BasicCompanyData.csv", b"second"),
            ],
        );

        let mut archive = CompanyArchive::open(&path).unwrap();
        assert_eq!(archive.len(), 2);

        let mut contents = String::new();
        archive
            .first_entry()
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "first");
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.zip");
        std::fs::write(&path, b"<html>not found</html>").unwrap();

        assert!(matches!(
            CompanyArchive::open(&path),
            Err(ImportError::Archive(_))
        ));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CompanyArchive::open(&dir.path().join("absent.zip")),
            Err(ImportError::Archive(_))
        ));
    }

    #[test]
    fn test_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.zip");
        write_zip(&path, &[]);

        let mut archive = CompanyArchive::open(&path).unwrap();
        assert!(archive.is_empty());
        assert!(matches!(
            archive.first_entry(),
            Err(ImportError::EmptyArchive(_))
        ));
    }
}

//! In-memory container store: every archive entry as path -> bytes.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::container::Container;
use super::encryption::Encryption;
use crate::error::{Error, Result};
use crate::util::percent_decoded;

pub const MIMETYPE_PATH: &str = "mimetype";
pub const EPUB_MIMETYPE: &str = "application/epub+zip";
pub const META_INF_DIR: &str = "META-INF";
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Files reserved under `META-INF/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedFile {
    Container,
    Encryption,
    Manifest,
    Metadata,
    Rights,
    Signatures,
}

impl ReservedFile {
    pub const ALL: [ReservedFile; 6] = [
        ReservedFile::Container,
        ReservedFile::Encryption,
        ReservedFile::Manifest,
        ReservedFile::Metadata,
        ReservedFile::Rights,
        ReservedFile::Signatures,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ReservedFile::Container => "container.xml",
            ReservedFile::Encryption => "encryption.xml",
            ReservedFile::Manifest => "manifest.xml",
            ReservedFile::Metadata => "metadata.xml",
            ReservedFile::Rights => "rights.xml",
            ReservedFile::Signatures => "signatures.xml",
        }
    }

    pub fn path(self) -> String {
        format!("{}/{}", META_INF_DIR, self.file_name())
    }

    pub fn is_required(self) -> bool {
        matches!(self, ReservedFile::Container)
    }
}

/// Parsed and raw `META-INF` contents.
#[derive(Debug, Clone, Default)]
pub struct MetaInf {
    pub container: Container,
    pub encryption: Option<Encryption>,
    raw: HashMap<ReservedFile, Vec<u8>>,
}

impl MetaInf {
    fn parse(files: &HashMap<String, Vec<u8>>) -> Result<Self> {
        let mut raw = HashMap::new();
        for reserved in ReservedFile::ALL {
            match files.get(&reserved.path()) {
                Some(data) => {
                    raw.insert(reserved, data.clone());
                }
                None if reserved.is_required() => {
                    return Err(Error::MissingDescriptor(reserved.path()));
                }
                None => {}
            }
        }

        let container = match raw.get(&ReservedFile::Container) {
            Some(data) => Container::parse(data)?,
            None => return Err(Error::MissingDescriptor(CONTAINER_PATH.into())),
        };

        // A broken encryption.xml should not make the rest unreadable
        let encryption = raw
            .get(&ReservedFile::Encryption)
            .and_then(|data| match Encryption::parse(data) {
                Ok(enc) => Some(enc),
                Err(e) => {
                    warn!("ignoring unreadable encryption.xml: {}", e);
                    None
                }
            });

        Ok(Self {
            container,
            encryption,
            raw,
        })
    }

    /// Raw bytes of a reserved file, if the archive had it.
    pub fn raw(&self, file: ReservedFile) -> Option<&[u8]> {
        self.raw.get(&file).map(Vec::as_slice)
    }
}

/// Every non-directory entry of an OCF archive, held in memory.
#[derive(Debug, Clone, Default)]
pub struct ContainerStore {
    files: HashMap<String, Vec<u8>>,
    meta_inf: MetaInf,
}

impl ContainerStore {
    /// An empty store, used when assembling a new archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an archive from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Read an archive from an in-memory buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Read an archive from any [`Read`] + [`Seek`] source.
    ///
    /// Fails when the archive is unreadable, `META-INF/container.xml` is
    /// missing, or the `mimetype` entry is not `application/epub+zip`.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut files = HashMap::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::with_capacity(initial_capacity(entry.size()));
            entry.read_to_end(&mut data)?;
            files.insert(name, data);
        }
        debug!("read {} archive entries", files.len());

        let meta_inf = MetaInf::parse(&files)?;
        let store = Self { files, meta_inf };

        match store.mimetype() {
            Some(EPUB_MIMETYPE) => Ok(store),
            Some(other) => Err(Error::InvalidContainer(format!(
                "Mimetype mismatch: {}",
                other
            ))),
            None => Err(Error::InvalidContainer("Missing mimetype entry".into())),
        }
    }

    /// Contents of the `mimetype` entry, whitespace-trimmed.
    pub fn mimetype(&self) -> Option<&str> {
        self.files
            .get(MIMETYPE_PATH)
            .and_then(|data| std::str::from_utf8(data).ok())
            .map(str::trim)
    }

    pub fn meta_inf(&self) -> &MetaInf {
        &self.meta_inf
    }

    pub fn container(&self) -> &Container {
        &self.meta_inf.container
    }

    pub fn encryption(&self) -> Option<&Encryption> {
        self.meta_inf.encryption.as_ref()
    }

    /// Look up a file by container path.
    ///
    /// Falls back to the percent-decoded path, since hrefs in package
    /// documents are URL-encoded while archive entry names often are not.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        if let Some(data) = self.files.get(path) {
            return Some(data.as_slice());
        }
        percent_decoded(path)
            .and_then(|decoded| self.files.get(&decoded))
            .map(Vec::as_slice)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), data.into());
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// All paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.files.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Files outside `META-INF/` (the `mimetype` entry included).
    pub fn non_meta_inf_files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files
            .iter()
            .filter(|(path, _)| !path.starts_with("META-INF/"))
            .map(|(path, data)| (path.as_str(), data.as_slice()))
    }

    /// Write the store as an OCF zip archive.
    ///
    /// `mimetype` is written first and stored uncompressed; the container
    /// descriptor follows, then every other entry in path order, deflated.
    pub fn write_to<W: Write + Seek>(&self, writer: W, compression_level: i64) -> Result<W> {
        let mut zip = ZipWriter::new(writer);

        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level));

        zip.start_file(MIMETYPE_PATH, stored)?;
        zip.write_all(EPUB_MIMETYPE.as_bytes())?;

        if let Some(container) = self.files.get(CONTAINER_PATH) {
            zip.start_file(CONTAINER_PATH, deflated)?;
            zip.write_all(container)?;
        }

        for path in self.paths() {
            if path == MIMETYPE_PATH || path == CONTAINER_PATH {
                continue;
            }
            zip.start_file(path, deflated)?;
            zip.write_all(&self.files[path])?;
        }

        Ok(zip.finish()?)
    }

    /// Write the store to an in-memory archive.
    pub fn to_bytes(&self, compression_level: i64) -> Result<Vec<u8>> {
        Ok(self
            .write_to(Cursor::new(Vec::new()), compression_level)?
            .into_inner())
    }
}

/// Read buffer size for an entry; the size in the archive header is untrusted.
fn initial_capacity(claimed: u64) -> usize {
    const LIMIT: u64 = 1 << 20;
    claimed.min(LIMIT) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_open_minimal_archive() {
        let bytes = build_zip(&[
            ("mimetype", b"application/epub+zip"),
            ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
            ("OEBPS/Text/a b.xhtml", b"<html/>"),
        ]);
        let store = ContainerStore::from_bytes(&bytes).unwrap();

        assert_eq!(store.mimetype(), Some(EPUB_MIMETYPE));
        assert_eq!(store.container().root_files[0].full_path, "OEBPS/content.opf");
        assert!(store.meta_inf().raw(ReservedFile::Container).is_some());
        assert!(store.meta_inf().raw(ReservedFile::Rights).is_none());
        assert!(store.encryption().is_none());
        assert_eq!(store.get("OEBPS/Text/a%20b.xhtml"), Some(&b"<html/>"[..]));
        assert_eq!(store.non_meta_inf_files().count(), 2);
    }

    #[test]
    fn test_missing_container_is_distinct_error() {
        let bytes = build_zip(&[("mimetype", b"application/epub+zip")]);
        assert!(matches!(
            ContainerStore::from_bytes(&bytes),
            Err(Error::MissingDescriptor(_))
        ));
    }

    #[test]
    fn test_wrong_mimetype_rejected() {
        let bytes = build_zip(&[
            ("mimetype", b"application/zip"),
            ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
        ]);
        assert!(matches!(
            ContainerStore::from_bytes(&bytes),
            Err(Error::InvalidContainer(_))
        ));
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            ContainerStore::from_bytes(b"definitely not a zip"),
            Err(Error::Zip(_))
        ));
    }

    #[test]
    fn test_write_puts_mimetype_first_and_stored() {
        let mut store = ContainerStore::new();
        store.insert("OEBPS/b.xhtml", b"b".to_vec());
        store.insert(CONTAINER_PATH, CONTAINER_XML.as_bytes().to_vec());
        store.insert("OEBPS/a.xhtml", b"a".to_vec());

        let bytes = store.to_bytes(6).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(&bytes)).unwrap();

        let first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
        drop(first);

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            ["mimetype", CONTAINER_PATH, "OEBPS/a.xhtml", "OEBPS/b.xhtml"]
        );

        let reopened = ContainerStore::from_bytes(&bytes).unwrap();
        assert_eq!(reopened.get("OEBPS/a.xhtml"), Some(&b"a"[..]));
    }

    #[test]
    fn test_header_size_does_not_drive_allocation() {
        assert_eq!(initial_capacity(12), 12);
        assert_eq!(initial_capacity(u64::MAX), 1 << 20);

        let large = vec![b'x'; (1 << 20) + 17];
        let bytes = build_zip(&[
            ("mimetype", b"application/epub+zip"),
            (CONTAINER_PATH, CONTAINER_XML.as_bytes()),
            ("OEBPS/big.xhtml", large.as_slice()),
        ]);
        let store = ContainerStore::from_bytes(&bytes).unwrap();
        assert_eq!(store.get("OEBPS/big.xhtml").map(<[u8]>::len), Some(large.len()));
    }
}

//! Physical package access.
//!
//! The merge engine never touches zip bytes directly. It talks to an
//! [`Archive`]: a flat map of member names to bytes with XML-aware read and
//! write helpers. [`PackageArchive`] is the in-memory implementation backed by
//! the `zip` crate: it inflates every member when opened, keeps parsed XML
//! trees that were written back through [`Archive::write_xml`], and
//! serializes deterministically when the package is saved.
//!
//! Member names are used without a leading slash (`ppt/slides/slide1.xml`);
//! a leading slash is accepted and stripped everywhere.

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::xml::XmlDocument;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

/// Byte and XML level access to one package.
pub trait Archive: Send {
    /// Human readable name used in log fields and error messages.
    fn label(&self) -> &str;

    /// Raw bytes of a member.
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Replace or create a member with raw bytes.
    fn write(&mut self, path: &str, data: Vec<u8>);

    /// Parsed tree of an XML member.
    fn read_xml(&self, path: &str) -> Result<XmlDocument>;

    /// Replace or create an XML member.
    fn write_xml(&mut self, path: &str, doc: &XmlDocument);

    fn file_exists(&self, path: &str) -> bool;

    /// Member names below `prefix`, sorted.
    fn folder(&self, prefix: &str) -> Vec<String>;

    fn remove(&mut self, path: &str);

    /// Open a member that is itself a zip package (embedded workbook).
    fn extract(&self, path: &str) -> Result<Box<dyn Archive>>;

    /// Serialize the whole package.
    fn to_bytes(&self) -> Result<Vec<u8>>;
}

#[inline]
fn normalize(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// In-memory zip package.
pub struct PackageArchive {
    label: String,
    entries: BTreeMap<String, Vec<u8>>,
    /// Trees written through `write_xml`; authoritative over `entries`.
    xml: HashMap<String, XmlDocument>,
}

impl PackageArchive {
    /// Create an empty archive.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: BTreeMap::new(),
            xml: HashMap::new(),
        }
    }

    /// Open a package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(OpcError::PackageNotFound(path.display().to_string()));
        }
        let data = std::fs::read(path)?;
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(label, &data)
    }

    /// Inflate every member of a zip package held in memory.
    pub fn from_bytes(label: impl Into<String>, data: &[u8]) -> Result<Self> {
        let mut zip = zip::ZipArchive::new(Cursor::new(data))?;
        let mut entries = BTreeMap::new();

        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)?;
            entries.insert(normalize(file.name()).to_string(), content);
        }

        Ok(Self {
            label: label.into(),
            entries,
            xml: HashMap::new(),
        })
    }

    /// Write the package to disk.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.member_names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.xml.is_empty()
    }

    fn member_names(&self) -> BTreeSet<&str> {
        self.entries
            .keys()
            .map(String::as_str)
            .chain(self.xml.keys().map(String::as_str))
            .collect()
    }
}

impl Archive for PackageArchive {
    fn label(&self) -> &str {
        &self.label
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let path = normalize(path);
        if let Some(doc) = self.xml.get(path) {
            return Ok(doc.to_bytes());
        }
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| OpcError::PartNotFound(format!("{}:{}", self.label, path)))
    }

    fn write(&mut self, path: &str, data: Vec<u8>) {
        let path = normalize(path);
        self.xml.remove(path);
        self.entries.insert(path.to_string(), data);
    }

    fn read_xml(&self, path: &str) -> Result<XmlDocument> {
        let path = normalize(path);
        if let Some(doc) = self.xml.get(path) {
            return Ok(doc.clone());
        }
        let bytes = self
            .entries
            .get(path)
            .ok_or_else(|| OpcError::PartNotFound(format!("{}:{}", self.label, path)))?;
        XmlDocument::parse(bytes)
            .map_err(|e| OpcError::XmlError(format!("{}:{}: {}", self.label, path, e)))
    }

    fn write_xml(&mut self, path: &str, doc: &XmlDocument) {
        let path = normalize(path);
        self.entries.remove(path);
        self.xml.insert(path.to_string(), doc.clone());
    }

    fn file_exists(&self, path: &str) -> bool {
        let path = normalize(path);
        self.xml.contains_key(path) || self.entries.contains_key(path)
    }

    fn folder(&self, prefix: &str) -> Vec<String> {
        let prefix = normalize(prefix);
        let prefix = if prefix.is_empty() || prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{}/", prefix)
        };
        self.member_names()
            .into_iter()
            .filter(|name| name.starts_with(&prefix))
            .map(str::to_string)
            .collect()
    }

    fn remove(&mut self, path: &str) {
        let path = normalize(path);
        self.xml.remove(path);
        self.entries.remove(path);
    }

    fn extract(&self, path: &str) -> Result<Box<dyn Archive>> {
        let data = self.read(path)?;
        let label = format!("{}:{}", self.label, normalize(path));
        Ok(Box::new(PackageArchive::from_bytes(label, &data)?))
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        // Producers expect the content types part to lead the archive
        let content_types = crate::ooxml::opc::packuri::CONTENT_TYPES_URI.trim_start_matches('/');
        let mut names: Vec<&str> = self.member_names().into_iter().collect();
        names.sort_by_key(|name| (*name != content_types, *name));

        for name in names {
            writer.start_file(name, options)?;
            match self.xml.get(name) {
                Some(doc) => writer.write_all(&doc.to_bytes())?,
                None => {
                    if let Some(bytes) = self.entries.get(name) {
                        writer.write_all(bytes)?;
                    }
                },
            }
        }

        Ok(writer.finish()?.into_inner())
    }
}

impl std::fmt::Debug for PackageArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageArchive")
            .field("label", &self.label)
            .field("members", &self.len())
            .finish()
    }
}

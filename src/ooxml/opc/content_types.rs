//! Editing of the package-level `[Content_Types].xml` part.
//!
//! Every part must be covered either by a `Default` entry keyed by file
//! extension or by an `Override` entry keyed by part name. Imported XML parts
//! get an `Override` with their exact OOXML MIME string; binary media get a
//! `Default` for their extension.

use crate::ooxml::opc::constants::{content_type_for_extension, namespace};
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::packuri::CONTENT_TYPES_URI;
use crate::ooxml::opc::phys_pkg::Archive;
use crate::ooxml::xml::XmlDocument;

/// In-memory view of `[Content_Types].xml`.
pub struct ContentTypes {
    doc: XmlDocument,
}

impl ContentTypes {
    /// Load the content types part, creating an empty one if missing.
    pub fn load(archive: &dyn Archive) -> Result<Self> {
        if !archive.file_exists(CONTENT_TYPES_URI) {
            let mut doc = XmlDocument::new("Types");
            let root = doc.root();
            doc.set_attr(root, "xmlns", namespace::OPC_CONTENT_TYPES);
            return Ok(Self { doc });
        }
        Ok(Self {
            doc: archive.read_xml(CONTENT_TYPES_URI)?,
        })
    }

    /// Write the part back.
    pub fn store(&self, archive: &mut dyn Archive) {
        archive.write_xml(CONTENT_TYPES_URI, &self.doc);
    }

    /// Content type registered for a part name (leading slash optional).
    pub fn content_type_of(&self, part_name: &str) -> Option<&str> {
        let part_name = absolute(part_name);
        let root = self.doc.root();
        if let Some(found) = self
            .doc
            .children_named(root, "Override")
            .into_iter()
            .find(|o| self.doc.attr(*o, "PartName") == Some(part_name.as_str()))
        {
            return self.doc.attr(found, "ContentType");
        }
        let ext = part_name.rsplit('.').next().unwrap_or("");
        self.default_for(ext)
    }

    fn default_for(&self, ext: &str) -> Option<&str> {
        let root = self.doc.root();
        self.doc
            .children_named(root, "Default")
            .into_iter()
            .find(|d| {
                self.doc
                    .attr(*d, "Extension")
                    .is_some_and(|e| e.eq_ignore_ascii_case(ext))
            })
            .and_then(|d| self.doc.attr(d, "ContentType"))
    }

    /// Register an `Override` for a part. Existing entries are updated.
    pub fn add_override(&mut self, part_name: &str, content_type: &str) {
        let part_name = absolute(part_name);
        let root = self.doc.root();
        let existing = self
            .doc
            .children_named(root, "Override")
            .into_iter()
            .find(|o| self.doc.attr(*o, "PartName") == Some(part_name.as_str()));
        match existing {
            Some(node) => self.doc.set_attr(node, "ContentType", content_type),
            None => {
                let node = self.doc.create_element_with(
                    "Override",
                    &[("PartName", part_name.as_str()), ("ContentType", content_type)],
                );
                self.doc.append_child(root, node);
            },
        }
    }

    /// Register a `Default` for an extension unless one exists already.
    ///
    /// Defaults must precede overrides, so new entries are inserted after
    /// the last existing `Default`.
    pub fn add_default(&mut self, ext: &str, content_type: &str) {
        if self.default_for(ext).is_some() {
            return;
        }
        let root = self.doc.root();
        let node = self
            .doc
            .create_element_with("Default", &[("Extension", ext), ("ContentType", content_type)]);
        match self.doc.children_named(root, "Default").last() {
            Some(last) => self.doc.insert_after(*last, node),
            None => self.doc.prepend_child(root, node),
        }
    }

    /// Register the extension default for a binary part, falling back to an
    /// override when the extension is unknown.
    pub fn add_default_for_part(&mut self, part_name: &str, fallback: &str) {
        let ext = part_name.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
        match content_type_for_extension(&ext) {
            Some(ct) => self.add_default(&ext, ct),
            None => self.add_override(part_name, fallback),
        }
    }

    pub fn remove_override(&mut self, part_name: &str) {
        let part_name = absolute(part_name);
        let root = self.doc.root();
        for node in self.doc.children_named(root, "Override") {
            if self.doc.attr(node, "PartName") == Some(part_name.as_str()) {
                self.doc.detach(node);
            }
        }
    }

    /// Part names of every override entry.
    pub fn override_part_names(&self) -> Vec<String> {
        let root = self.doc.root();
        self.doc
            .children_named(root, "Override")
            .into_iter()
            .filter_map(|o| self.doc.attr(o, "PartName").map(str::to_string))
            .collect()
    }
}

fn absolute(part_name: &str) -> String {
    format!("/{}", part_name.trim_start_matches('/'))
}

/// Load, mutate and store the content types part in one step.
pub fn update_content_types<F>(archive: &mut dyn Archive, f: F) -> Result<()>
where
    F: FnOnce(&mut ContentTypes),
{
    let mut cts = ContentTypes::load(archive)?;
    f(&mut cts);
    cts.store(archive);
    Ok(())
}

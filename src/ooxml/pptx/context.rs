//! State shared by every importer while one destination part is built.

use crate::ooxml::error::Result;
use crate::ooxml::opc::content_types::ContentTypes;
use crate::ooxml::opc::phys_pkg::Archive;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::pptx::counter::CounterAllocator;
use crate::ooxml::pptx::options::MergeOptions;
use crate::ooxml::pptx::package::{LayoutMemo, Package};
use crate::ooxml::pptx::report::ImportReport;
use crate::ooxml::pptx::template::Template;
use crate::ooxml::xml::XmlDocument;
use std::collections::HashMap;

/// Mutable view of the destination package during one import.
///
/// Holding the context means holding the only `&mut` to the destination,
/// which serializes imports per package. Content types are edited in memory
/// and written back by [`ImportContext::finish`].
pub struct ImportContext<'a> {
    pub archive: &'a mut dyn Archive,
    pub counters: &'a mut CounterAllocator,
    pub content_types: ContentTypes,
    pub report: &'a mut ImportReport,
    pub options: &'a MergeOptions,
    /// Member name of the destination presentation part
    pub main_part: String,
    /// Layouts imported by earlier imports into the same package
    pub(crate) imported_layouts: &'a mut LayoutMemo,
    /// Binary parts copied during this import, keyed by (source, member)
    copied_media: HashMap<(String, String), String>,
    /// Diagram numbers allocated during this import, keyed by (source, number)
    diagram_numbers: HashMap<(String, u32), u32>,
}

impl<'a> ImportContext<'a> {
    pub fn new(
        package: &'a mut Package,
        report: &'a mut ImportReport,
        options: &'a MergeOptions,
    ) -> Result<Self> {
        package.initialize_counters();
        let main_part = package.main_part().to_string();
        let (archive, counters, imported_layouts) = package.split_mut();
        let content_types = ContentTypes::load(archive)?;
        Ok(Self {
            archive,
            counters,
            content_types,
            report,
            options,
            main_part,
            imported_layouts,
            copied_media: HashMap::new(),
            diagram_numbers: HashMap::new(),
        })
    }

    /// Write back the content types edited during the import.
    pub fn finish(self) {
        self.content_types.store(self.archive);
    }

    pub(crate) fn copied_media(&self, source: &str, member: &str) -> Option<&String> {
        self.copied_media
            .get(&(source.to_string(), member.to_string()))
    }

    pub(crate) fn remember_media(&mut self, source: &str, member: &str, copy: &str) {
        self.copied_media
            .insert((source.to_string(), member.to_string()), copy.to_string());
    }

    pub(crate) fn diagram_number(&self, source: &str, number: u32) -> Option<u32> {
        self.diagram_numbers
            .get(&(source.to_string(), number))
            .copied()
    }

    pub(crate) fn remember_diagram(&mut self, source: &str, number: u32, copy: u32) {
        self.diagram_numbers
            .insert((source.to_string(), number), copy);
    }
}

/// A source part with its relationships, read from a template.
pub struct SourcePart<'t> {
    pub template: &'t Template,
    pub member: String,
    pub doc: XmlDocument,
    pub rels: Relationships,
}

impl<'t> SourcePart<'t> {
    pub fn load(template: &'t Template, member: &str) -> Result<Self> {
        let archive = template.archive();
        Ok(Self {
            template,
            member: member.to_string(),
            doc: archive.read_xml(member)?,
            rels: Relationships::load(archive, member)?,
        })
    }

    /// Source slide by 1-based number.
    pub fn slide(template: &'t Template, number: usize) -> Result<Self> {
        let member = template.slide_part(number)?;
        Self::load(template, &member)
    }
}

/// A destination part under construction.
pub struct TargetPart {
    pub member: String,
    pub doc: XmlDocument,
    pub rels: Relationships,
}

impl TargetPart {
    pub fn load(archive: &dyn Archive, member: &str) -> Result<Self> {
        Ok(Self {
            member: member.to_string(),
            doc: archive.read_xml(member)?,
            rels: Relationships::load(archive, member)?,
        })
    }

    pub fn store(&self, archive: &mut dyn Archive) {
        archive.write_xml(&self.member, &self.doc);
        self.rels.store(archive);
    }
}

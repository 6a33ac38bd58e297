//! Source presentations.
//!
//! A [`Template`] is a read-only package that slides, elements, masters and
//! layouts are imported from. [`Template::inspect`] lists what a template
//! contains so callers can pick elements by name or creation id.

use crate::ooxml::error::Result;
use crate::ooxml::opc::content_types::ContentTypes;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::phys_pkg::Archive;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::pptx::package::Package;
use crate::ooxml::pptx::shapes::{ShapeKind, creation_id, shape_elements, shape_id, shape_name};
use crate::ooxml::xml::XmlDocument;
use serde::Serialize;
use std::path::Path;

/// A named source package.
pub struct Template {
    name: String,
    package: Package,
    content_types: ContentTypes,
}

/// One element on a template slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementInfo {
    pub name: String,
    pub id: Option<u32>,
    pub creation_id: Option<String>,
    pub kind: ShapeKind,
}

/// One slide of a template.
#[derive(Debug, Clone, Serialize)]
pub struct SlideInfo {
    /// 1-based position in the presentation
    pub number: usize,
    pub part: String,
    pub layout: Option<String>,
    pub layout_name: Option<String>,
    pub elements: Vec<ElementInfo>,
}

/// Summary of a template's slides and masters.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub name: String,
    pub slides: Vec<SlideInfo>,
    pub masters: Vec<String>,
}

impl TemplateInfo {
    /// Slide whose elements include one with the given name.
    pub fn find_element(&self, name: &str) -> Option<(&SlideInfo, &ElementInfo)> {
        self.slides
            .iter()
            .find_map(|s| s.elements.iter().find(|e| e.name == name).map(|e| (s, e)))
    }
}

impl Template {
    /// Open a template from disk. The file name becomes its name.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let package = Package::open(&path)?;
        let name = package.label().to_string();
        Self::from_package(name, package)
    }

    pub fn from_bytes(name: impl Into<String>, data: &[u8]) -> Result<Self> {
        let name = name.into();
        let package = Package::from_bytes(name.clone(), data)?;
        Self::from_package(name, package)
    }

    pub fn from_package(name: impl Into<String>, package: Package) -> Result<Self> {
        let content_types = ContentTypes::load(package.archive())?;
        Ok(Self {
            name: name.into(),
            package,
            content_types,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn package(&self) -> &Package {
        &self.package
    }

    #[inline]
    pub fn archive(&self) -> &dyn Archive {
        self.package.archive()
    }

    /// Content type the template declares for one of its parts.
    pub fn content_type_of(&self, member: &str) -> Option<&str> {
        self.content_types.content_type_of(member)
    }

    pub fn slide_part(&self, number: usize) -> Result<String> {
        self.package.slide_part(number)
    }

    pub fn slide_count(&self) -> Result<usize> {
        self.package.slide_count()
    }

    /// List slides, their layouts and their elements.
    pub fn inspect(&self) -> Result<TemplateInfo> {
        let archive = self.archive();
        let mut slides = Vec::new();
        for (i, part) in self.package.slide_parts()?.into_iter().enumerate() {
            let doc = archive.read_xml(&part)?;
            let rels = Relationships::load(archive, &part)?;

            let layout = rels
                .targets_by_type(rt::SLIDE_LAYOUT)
                .into_iter()
                .find(|t| t.rel_type == rt::SLIDE_LAYOUT)
                .and_then(|t| t.part_uri(rels.base_uri()).ok())
                .map(|uri| uri.membername().to_string());
            let layout_name = match &layout {
                Some(member) if archive.file_exists(member) => {
                    part_name(&archive.read_xml(member)?).map(str::to_string)
                },
                _ => None,
            };

            let elements = shape_elements(&doc)
                .into_iter()
                .map(|shape| ElementInfo {
                    name: shape_name(&doc, shape).unwrap_or_default().to_string(),
                    id: shape_id(&doc, shape),
                    creation_id: creation_id(&doc, shape).map(str::to_string),
                    kind: ShapeKind::detect(&doc, shape),
                })
                .collect();

            slides.push(SlideInfo {
                number: i + 1,
                part,
                layout,
                layout_name,
                elements,
            });
        }

        Ok(TemplateInfo {
            name: self.name.clone(),
            slides,
            masters: self.package.master_parts()?,
        })
    }
}

/// `p:cSld/@name` of a slide, layout or master.
pub(crate) fn part_name(doc: &XmlDocument) -> Option<&str> {
    doc.first_child_named(doc.root(), "p:cSld")
        .and_then(|c| doc.attr(c, "name"))
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::test_support::PackageBuilder;

    #[test]
    fn test_inspect_lists_elements() {
        let template = PackageBuilder::new("source")
            .slide("Intro")
            .chart_slide("Revenue")
            .template();
        let info = template.inspect().unwrap();

        assert_eq!(info.name, "source");
        assert_eq!(info.slides.len(), 2);
        assert_eq!(info.masters, vec!["ppt/slideMasters/slideMaster1.xml"]);

        let first = &info.slides[0];
        assert_eq!(first.layout_name.as_deref(), Some("Title Slide"));
        assert_eq!(first.elements[0].name, "Title 1");
        assert_eq!(first.elements[0].kind, ShapeKind::Generic);
        assert!(first.elements[0].creation_id.is_some());

        let (slide, chart) = info.find_element("Revenue").unwrap();
        assert_eq!(slide.number, 2);
        assert_eq!(chart.kind, ShapeKind::Chart);
    }
}

/// Hyperlink relationships.
///
/// An element with exactly one hyperlink goes through [`HyperlinkImporter`].
/// Elements with several (typically tables) are handled by their owning
/// importer, which routes every hyperlink through a [`LinkRegistry`] so
/// links to the same place share one destination relationship.
use crate::ooxml::error::{MergeError, Result};
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::rel::{NewRelId, Target};
use crate::ooxml::pptx::context::{ImportContext, SourcePart, TargetPart};
use crate::ooxml::pptx::parts::{RelAction, default_action};
use crate::ooxml::pptx::shapes::{
    HYPERLINK_TAGS, Prepared, ShapeImporter, ShapeKind, import_references, link_part, subtree,
};
use crate::ooxml::xml::{NodeId, XmlDocument};
use std::collections::HashMap;
use tracing::debug;

/// `r:id` of every hyperlink occurrence in a subtree, duplicates included.
pub fn hyperlink_ids(doc: &XmlDocument, node: NodeId) -> Vec<String> {
    subtree(doc, node)
        .into_iter()
        .filter(|n| doc.is_element(*n) && HYPERLINK_TAGS.contains(&doc.name(*n)))
        .filter_map(|n| doc.attr(n, "r:id"))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Destination relationships created during one element import, keyed by
/// the source `(type, target, external)` triple.
#[derive(Debug, Default)]
pub struct LinkRegistry {
    created: HashMap<(String, String, bool), NewRelId>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.created.len()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }

    /// Destination id for a source relationship, creating the entry the
    /// first time its triple is seen.
    pub fn link(
        &mut self,
        ctx: &mut ImportContext<'_>,
        source: &SourcePart<'_>,
        target: &mut TargetPart,
        rel: &Target,
    ) -> Result<NewRelId> {
        let triple = rel.triple();
        if let Some(existing) = self.created.get(&triple) {
            debug!(r_id = %rel.r_id, reused = %existing, "relationship de-duplicated");
            return Ok(existing.clone());
        }

        let id = if rel.is_external {
            target.rels.add(&rel.rel_type, &rel.file, true)
        } else {
            let member = rel.part_uri(source.rels.base_uri())?.membername().to_string();
            let action = match rel.rel_type.as_str() {
                // Slide jumps keep their text; the integrity scan flags them
                rt::SLIDE => RelAction::Keep,
                _ => default_action(ctx, source.template, rel, &member)?,
            };
            match action {
                RelAction::Retarget(dest) => link_part(target, &rel.rel_type, &dest),
                _ => target.rels.add(&rel.rel_type, &rel.file, false),
            }
        };
        self.created.insert(triple, id.clone());
        Ok(id)
    }
}

/// Importer for elements carrying exactly one hyperlink.
#[derive(Debug, Clone, Copy)]
pub struct HyperlinkImporter;

impl ShapeImporter for HyperlinkImporter {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Hyperlink
    }

    fn prepare(
        &self,
        ctx: &mut ImportContext<'_>,
        source: &SourcePart<'_>,
        target: &mut TargetPart,
        element: NodeId,
    ) -> Result<Prepared> {
        let ids = hyperlink_ids(&source.doc, element);
        let [r_id] = ids.as_slice() else {
            return Err(MergeError::Xml(format!(
                "expected one hyperlink in {}, found {}",
                source.member,
                ids.len()
            )));
        };
        let rel = source.rels.require(r_id)?;
        let mut registry = LinkRegistry::new();
        let new_id = registry.link(ctx, source, target, &rel)?;

        let mut prepared = Prepared::default();
        prepared.rel_map.insert(r_id.clone(), new_id);
        import_references(ctx, source, target, element, &mut prepared.rel_map)?;
        Ok(prepared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::target_mode;
    use crate::ooxml::pptx::options::MergeOptions;
    use crate::ooxml::pptx::report::ImportReport;
    use crate::ooxml::pptx::shapes::{ElementImport, import_element};
    use crate::ooxml::pptx::test_support::PackageBuilder;

    #[test]
    fn test_single_hyperlink() {
        let source = PackageBuilder::new("src").hyperlink_slide("Link").template();
        let mut dest = PackageBuilder::new("dest").slide("A").package();
        let mut report = ImportReport::new();
        let options = MergeOptions::default();
        let mut ctx = ImportContext::new(&mut dest, &mut report, &options).unwrap();

        let src = SourcePart::slide(&source, 1).unwrap();
        let mut target = TargetPart::load(ctx.archive, "ppt/slides/slide1.xml").unwrap();
        let before = target.rels.len();
        let copy = import_element(&mut ctx, &src, &mut target, &mut ElementImport::new(1, "Link")).unwrap();

        let ids = hyperlink_ids(&target.doc, copy);
        assert_eq!(ids.len(), 1);
        let rel = target.rels.require(&ids[0]).unwrap();
        assert_eq!(rel.rel_type, rt::HYPERLINK);
        assert_eq!(rel.file, "https://example.com/");
        assert!(rel.is_external);
        assert_eq!(target.rels.len(), before + 1);
        let element = rel.element;
        assert_eq!(target.rels.document().attr(element, "TargetMode"), Some(target_mode::EXTERNAL));
    }

    #[test]
    fn test_identical_hyperlinks_share_one_relationship() {
        let source = PackageBuilder::new("src").hyperlink_slide("Link").template();
        let mut dest = PackageBuilder::new("dest").slide("A").package();
        let mut report = ImportReport::new();
        let options = MergeOptions::default();
        let mut ctx = ImportContext::new(&mut dest, &mut report, &options).unwrap();

        let src = SourcePart::slide(&source, 1).unwrap();
        let table = crate::ooxml::pptx::shapes::ElementSelector::name("Link Table")
            .find(&src.doc)
            .unwrap();
        // two different source ids for the same URL
        let source_ids = hyperlink_ids(&src.doc, table);
        assert_eq!(source_ids.len(), 2);
        assert_ne!(source_ids[0], source_ids[1]);

        let mut target = TargetPart::load(ctx.archive, "ppt/slides/slide1.xml").unwrap();
        let before = target.rels.len();
        let copy =
            import_element(&mut ctx, &src, &mut target, &mut ElementImport::new(1, "Link Table")).unwrap();

        let ids = hyperlink_ids(&target.doc, copy);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], ids[1]);
        assert_eq!(target.rels.len(), before + 1);
    }
}

/// Embedded OLE objects.
///
/// `p:oleObj/@r:id` points at one embedded binary. It is copied under a new
/// number; the extension comes from the source target (`.bin` when it has
/// none) and the content type from the source package, falling back to the
/// extension default. The preview picture inside `p:oleObj` is an ordinary
/// image reference.
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::pptx::context::{ImportContext, SourcePart, TargetPart};
use crate::ooxml::pptx::parts::chart::copy_embedding;
use crate::ooxml::pptx::shapes::{Prepared, ShapeImporter, ShapeKind, import_references, link_part};
use crate::ooxml::xml::NodeId;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct OleImporter;

impl ShapeImporter for OleImporter {
    fn kind(&self) -> ShapeKind {
        ShapeKind::OleObject
    }

    fn prepare(
        &self,
        ctx: &mut ImportContext<'_>,
        source: &SourcePart<'_>,
        target: &mut TargetPart,
        element: NodeId,
    ) -> Result<Prepared> {
        let mut prepared = Prepared::default();

        // Choice and fallback branches may both name the object
        for ole in source.doc.descendants_named(element, "p:oleObj") {
            let Some(r_id) = source.doc.attr(ole, "r:id").filter(|id| !id.is_empty()) else {
                continue;
            };
            if prepared.rel_map.contains(r_id) {
                continue;
            }
            let rel = source.rels.require(r_id)?;
            let new_id = if rel.is_external {
                target.rels.add(&rel.rel_type, &rel.file, true)
            } else {
                let member = rel.part_uri(source.rels.base_uri())?.membername().to_string();
                let stem = match rel.rel_type.as_str() {
                    rt::PACKAGE if !rel.file_base.is_empty() => rel.file_base.as_str(),
                    _ => "oleObject",
                };
                let copy = copy_embedding(ctx, source.template, &member, stem)?;
                link_part(target, &rel.rel_type, &copy)
            };
            debug!(from = %r_id, to = %new_id, "embedding linked");
            prepared.rel_map.insert(r_id, new_id);
        }

        import_references(ctx, source, target, element, &mut prepared.rel_map)?;
        Ok(prepared)
    }
}

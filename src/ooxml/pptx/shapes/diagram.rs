/// SmartArt graphic frames.
///
/// `dgm:relIds` names four parts through `r:dm`, `r:lo`, `r:qs` and `r:cs`.
/// All four and the drawing part are copied under one diagram number. The
/// drawing has no attribute on the frame: the slide links it, and the data
/// part names that link in `dsp:dataModelExt/@relId`, which is rewritten in
/// the copied data part.
use crate::ooxml::error::{MergeError, Result};
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::pptx::context::{ImportContext, SourcePart, TargetPart};
use crate::ooxml::pptx::counter::PartFamily;
use crate::ooxml::pptx::parts::diagram::{DIAGRAM_PARTS, copy_diagram_part_as};
use crate::ooxml::pptx::shapes::{Prepared, ShapeImporter, ShapeKind, import_references, link_part};
use crate::ooxml::xml::NodeId;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct DiagramImporter;

impl ShapeImporter for DiagramImporter {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Diagram
    }

    fn prepare(
        &self,
        ctx: &mut ImportContext<'_>,
        source: &SourcePart<'_>,
        target: &mut TargetPart,
        element: NodeId,
    ) -> Result<Prepared> {
        let rel_ids = source
            .doc
            .find_first(element, "dgm:relIds")
            .ok_or_else(|| MergeError::not_found(format!("dgm:relIds in {}", source.member)))?;
        let number = ctx.counters.increment(PartFamily::Diagram)?;
        let mut prepared = Prepared::default();
        let mut data_part = None;

        for (attr, rel_type, stem) in DIAGRAM_PARTS {
            let r_id = source
                .doc
                .attr(rel_ids, attr)
                .ok_or_else(|| MergeError::not_found(format!("{} on dgm:relIds in {}", attr, source.member)))?;
            let rel = source.rels.require(r_id)?;
            let member = rel.part_uri(source.rels.base_uri())?.membername().to_string();
            let copy = copy_diagram_part_as(ctx, source.template, &member, stem, number)?;
            let new_id = link_part(target, rel_type, &copy);
            if rel_type == rt::DIAGRAM_DATA {
                data_part = Some((member, copy));
            }
            prepared.rel_map.insert(r_id, new_id);
        }

        if let Some((source_data, dest_data)) = data_part {
            link_drawing(ctx, source, target, &source_data, &dest_data, number)?;
        }
        debug!(number, parts = prepared.rel_map.len(), "diagram copied");

        import_references(ctx, source, target, element, &mut prepared.rel_map)?;
        Ok(prepared)
    }
}

/// Copy the drawing named by the data part and point the copy's
/// `dsp:dataModelExt` at the new slide relationship.
fn link_drawing(
    ctx: &mut ImportContext<'_>,
    source: &SourcePart<'_>,
    target: &mut TargetPart,
    source_data: &str,
    dest_data: &str,
    number: u32,
) -> Result<()> {
    let data = source.template.archive().read_xml(source_data)?;
    let Some(ext) = data.find_first(data.root(), "dsp:dataModelExt") else {
        return Ok(());
    };
    let Some(drawing_rel) = data.attr(ext, "relId").and_then(|id| source.rels.get(id)) else {
        debug!(part = source_data, "diagram without drawing");
        return Ok(());
    };
    let member = drawing_rel.part_uri(source.rels.base_uri())?.membername().to_string();
    let copy = copy_diagram_part_as(ctx, source.template, &member, "drawing", number)?;
    let new_id = link_part(target, rt::DIAGRAM_DRAWING, &copy);

    let mut dest = ctx.archive.read_xml(dest_data)?;
    if let Some(dest_ext) = dest.find_first(dest.root(), "dsp:dataModelExt") {
        dest.set_attr(dest_ext, "relId", new_id.as_str());
        ctx.archive.write_xml(dest_data, &dest);
    }
    Ok(())
}

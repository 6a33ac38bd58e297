/// Pictures, including SVG pictures and audio/video frames.
///
/// The main `a:blip` binary is copied first. Everything else the picture
/// points at (the SVG behind an `asvg:svgBlip`, the media file behind
/// `a:videoFile`/`a:audioFile` and `p14:media`) follows in a second pass
/// over the same element. Audio and video are linked twice, once with the
/// typed relationship and once as generic media; both resolve to one copy.
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::pptx::context::{ImportContext, SourcePart, TargetPart};
use crate::ooxml::pptx::parts::copy_media;
use crate::ooxml::pptx::shapes::{Prepared, ShapeImporter, ShapeKind, import_references, link_part};
use crate::ooxml::xml::NodeId;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct ImageImporter;

impl ShapeImporter for ImageImporter {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Image
    }

    fn prepare(
        &self,
        ctx: &mut ImportContext<'_>,
        source: &SourcePart<'_>,
        target: &mut TargetPart,
        element: NodeId,
    ) -> Result<Prepared> {
        let mut prepared = Prepared::default();

        let blip = source.doc.find_first(element, "a:blip");
        let main = blip.and_then(|b| source.doc.attr(b, "r:embed").or_else(|| source.doc.attr(b, "r:link")));
        if let Some(r_id) = main.filter(|id| !id.is_empty()) {
            let rel = source.rels.require(r_id)?;
            let new_id = if rel.is_external {
                target.rels.add(rt::IMAGE, &rel.file, true)
            } else {
                let member = rel.part_uri(source.rels.base_uri())?.membername().to_string();
                let copy = copy_media(ctx, source.template, &member)?;
                link_part(target, rt::IMAGE, &copy)
            };
            debug!(from = %r_id, to = %new_id, "image linked");
            prepared.rel_map.insert(r_id, new_id);
        }

        import_references(ctx, source, target, element, &mut prepared.rel_map)?;
        Ok(prepared)
    }
}

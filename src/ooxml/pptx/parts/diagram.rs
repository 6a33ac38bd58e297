/// SmartArt diagram parts.
///
/// One diagram is five parts sharing a number: data, layout, quick style,
/// colors and the pre-rendered drawing. The graphic frame references the
/// first four through `dgm:relIds`; the drawing is linked from the slide
/// and named by `dsp:dataModelExt/@relId` inside the data part.
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::pptx::context::ImportContext;
use crate::ooxml::pptx::counter::PartFamily;
use crate::ooxml::pptx::parts::{RelAction, copy_part, copy_relationships};
use crate::ooxml::pptx::template::Template;

/// `(attribute on dgm:relIds, relationship type, filename stem)`
pub const DIAGRAM_PARTS: [(&str, &str, &str); 4] = [
    ("r:dm", rt::DIAGRAM_DATA, "data"),
    ("r:lo", rt::DIAGRAM_LAYOUT, "layout"),
    ("r:qs", rt::DIAGRAM_QUICK_STYLE, "quickStyle"),
    ("r:cs", rt::DIAGRAM_COLORS, "colors"),
];

pub fn is_diagram_relationship(rel_type: &str) -> bool {
    rel_type == rt::DIAGRAM_DRAWING || DIAGRAM_PARTS.iter().any(|(_, t, _)| *t == rel_type)
}

/// Copy one diagram part as `ppt/diagrams/<stem>N.xml`.
///
/// `number` is the destination diagram number; parts of the same diagram
/// must share it.
pub(crate) fn copy_diagram_part_as(
    ctx: &mut ImportContext<'_>,
    source: &Template,
    source_member: &str,
    stem: &str,
    number: u32,
) -> Result<String> {
    let dest = format!("ppt/diagrams/{}{}.xml", stem, number);
    copy_part(ctx, source, source_member, &dest)?;
    copy_relationships(ctx, source, source_member, &dest, |_, _, _| Ok(RelAction::Default))?;
    Ok(dest)
}

/// Copy one diagram part while copying a whole slide.
///
/// Parts whose source number was seen before in this import reuse the same
/// destination number, so the five parts of a diagram stay together.
pub(crate) fn copy_diagram_part(
    ctx: &mut ImportContext<'_>,
    source: &Template,
    source_member: &str,
) -> Result<String> {
    let uri = PackURI::from_member(source_member);
    let stem = uri
        .filename()
        .trim_end_matches(".xml")
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_string();
    let source_number = uri.idx().unwrap_or(0);

    let number = match ctx.diagram_number(source.name(), source_number) {
        Some(number) => number,
        None => {
            let number = ctx.counters.increment(PartFamily::Diagram)?;
            ctx.remember_diagram(source.name(), source_number, number);
            number
        },
    };
    copy_diagram_part_as(ctx, source, source_member, &stem, number)
}

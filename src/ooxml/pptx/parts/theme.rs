/// Theme parts.
use crate::ooxml::error::Result;
use crate::ooxml::pptx::context::ImportContext;
use crate::ooxml::pptx::counter::PartFamily;
use crate::ooxml::pptx::parts::{RelAction, copy_part, copy_relationships};
use crate::ooxml::pptx::template::Template;

/// Copy a theme (and the images it references) as `ppt/theme/themeN.xml`.
pub(crate) fn copy_theme(
    ctx: &mut ImportContext<'_>,
    source: &Template,
    source_member: &str,
) -> Result<String> {
    let number = ctx.counters.increment(PartFamily::Theme)?;
    let dest = format!("ppt/theme/theme{}.xml", number);
    copy_part(ctx, source, source_member, &dest)?;
    copy_relationships(ctx, source, source_member, &dest, |_, _, _| Ok(RelAction::Default))?;
    Ok(dest)
}

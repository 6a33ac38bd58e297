/// Copying parts from a template into the destination package.
///
/// Every copied part keeps the content type its source package declares
/// for it. Relationship parts are rebuilt entry by entry: each internal
/// target is either handed to a caller-supplied rule or copied with the
/// default rule for its type, and the entry is pointed at the copy.
pub mod chart;
pub mod diagram;
pub mod theme;

use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::{content_type as ct, content_type_for_extension, relationship_type as rt};
use crate::ooxml::opc::packuri::{PackURI, file_stem};
use crate::ooxml::opc::rel::{Relationships, Target};
use crate::ooxml::pptx::context::ImportContext;
use crate::ooxml::pptx::counter::PartFamily;
use crate::ooxml::pptx::template::Template;
use tracing::{debug, warn};

/// What to do with one relationship of a copied part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelAction {
    /// Apply the default rule for the relationship type
    Default,
    /// Point the entry at this destination member
    Retarget(String),
    /// Keep the source target text unchanged
    Keep,
    /// Leave the entry out
    Drop,
}

/// Copy a part's bytes and register its content type.
pub(crate) fn copy_part(
    ctx: &mut ImportContext<'_>,
    source: &Template,
    source_member: &str,
    dest_member: &str,
) -> Result<()> {
    let bytes = source.archive().read(source_member)?;
    ctx.archive.write(dest_member, bytes);
    register_like_source(ctx, source, source_member, dest_member);
    debug!(from = source_member, to = dest_member, source = source.name(), "part copied");
    Ok(())
}

/// Give `dest_member` the content type `source_member` has in the source.
pub(crate) fn register_like_source(
    ctx: &mut ImportContext<'_>,
    source: &Template,
    source_member: &str,
    dest_member: &str,
) {
    let ext = PackURI::from_member(dest_member).ext().to_ascii_lowercase();
    match source.content_type_of(source_member) {
        Some(content_type) if content_type_for_extension(&ext) == Some(content_type) => {
            ctx.content_types.add_default(&ext, content_type)
        },
        Some(content_type) => ctx.content_types.add_override(dest_member, content_type),
        None => ctx.content_types.add_default_for_part(dest_member, ct::OFC_OLE_OBJECT),
    }
}

fn is_image_extension(ext: &str) -> bool {
    content_type_for_extension(ext).is_some_and(|ct| ct.starts_with("image/"))
}

/// Copy an image or media binary under a fresh number.
///
/// Images become `imageN.ext`, audio and video `mediaN.ext`. A binary that
/// was already copied during the current import is reused.
pub(crate) fn copy_media(
    ctx: &mut ImportContext<'_>,
    source: &Template,
    source_member: &str,
) -> Result<String> {
    if let Some(existing) = ctx.copied_media(source.name(), source_member) {
        return Ok(existing.clone());
    }

    let uri = PackURI::from_member(source_member);
    let ext = uri.ext().to_string();
    let stem = if is_image_extension(&ext.to_ascii_lowercase()) {
        "image"
    } else {
        "media"
    };
    let number = ctx.counters.increment(PartFamily::Image)?;
    let dest = format!("ppt/media/{}{}.{}", stem, number, ext);

    copy_part(ctx, source, source_member, &dest)?;
    ctx.remember_media(source.name(), source_member, &dest);
    Ok(dest)
}

/// Copy a part of unknown family into the same folder under a free name.
pub(crate) fn copy_generic(
    ctx: &mut ImportContext<'_>,
    source: &Template,
    source_member: &str,
) -> Result<String> {
    let dest = unique_member(ctx, source_member);
    copy_part(ctx, source, source_member, &dest)?;
    copy_relationships(ctx, source, source_member, &dest, |_, _, _| Ok(RelAction::Default))?;
    Ok(dest)
}

/// `wanted` if it is free, else the first free `stem-N.ext` beside it.
pub(crate) fn unique_member(ctx: &ImportContext<'_>, wanted: &str) -> String {
    if !ctx.archive.file_exists(wanted) {
        return wanted.to_string();
    }
    let uri = PackURI::from_member(wanted);
    let filename = uri.filename();
    let stem = file_stem(filename);
    let ext = &filename[stem.len()..];
    let base = uri.base_uri().trim_start_matches('/');
    (2u32..)
        .map(|n| {
            if base.is_empty() {
                format!("{}-{}{}", stem, n, ext)
            } else {
                format!("{}/{}-{}{}", base, stem, n, ext)
            }
        })
        .find(|candidate| !ctx.archive.file_exists(candidate))
        .unwrap_or_else(|| wanted.to_string())
}

/// Rebuild the relationships of `source_part` for its copy `dest_part`.
///
/// Entry ids are preserved so the copied XML stays valid. `rule` is asked
/// first for every internal target; [`RelAction::Default`] falls back to
/// [`default_action`]. The rebuilt part is stored when it has entries.
pub(crate) fn copy_relationships<'a, F>(
    ctx: &mut ImportContext<'a>,
    source: &Template,
    source_part: &str,
    dest_part: &str,
    mut rule: F,
) -> Result<Relationships>
where
    F: FnMut(&mut ImportContext<'a>, &Target, &str) -> Result<RelAction>,
{
    let source_rels = Relationships::load(source.archive(), source_part)?;
    let mut dest_rels = Relationships::new(dest_part);

    for target in source_rels.all() {
        if target.is_external {
            dest_rels.insert_with_id(&target.r_id, &target.rel_type, &target.file, true);
            continue;
        }
        let source_member = target.part_uri(source_rels.base_uri())?.membername().to_string();

        let mut action = rule(ctx, &target, &source_member)?;
        if action == RelAction::Default {
            action = default_action(ctx, source, &target, &source_member)?;
        }

        match action {
            RelAction::Retarget(member) => {
                let relative = PackURI::from_member(&member).relative_ref(dest_rels.base_uri());
                dest_rels.insert_with_id(&target.r_id, &target.rel_type, &relative, false);
            },
            RelAction::Keep | RelAction::Default => {
                dest_rels.insert_with_id(&target.r_id, &target.rel_type, &target.file, false);
            },
            RelAction::Drop => {
                warn!(part = dest_part, r_id = %target.r_id, rel_type = %target.rel_type, "relationship dropped");
                ctx.report
                    .dropped_relations
                    .push((dest_rels.path().to_string(), target.rel_type.clone()));
            },
        }
    }

    if !dest_rels.is_empty() {
        dest_rels.store(ctx.archive);
    }
    Ok(dest_rels)
}

/// Default copy rule per relationship type.
pub(crate) fn default_action(
    ctx: &mut ImportContext<'_>,
    source: &Template,
    target: &Target,
    source_member: &str,
) -> Result<RelAction> {
    if !source.archive().file_exists(source_member) {
        // Dangling in the source; the integrity scan decides what to do
        return Ok(RelAction::Keep);
    }
    let dest = match target.rel_type.as_str() {
        rt::IMAGE | rt::AUDIO | rt::VIDEO | rt::MEDIA => copy_media(ctx, source, source_member)?,
        rt::THEME_OVERRIDE => {
            let number = ctx.counters.increment(PartFamily::Theme)?;
            let dest = format!("ppt/theme/themeOverride{}.xml", number);
            copy_part(ctx, source, source_member, &dest)?;
            copy_relationships(ctx, source, source_member, &dest, |_, _, _| Ok(RelAction::Default))?;
            dest
        },
        rt::SLIDE | rt::SLIDE_LAYOUT | rt::SLIDE_MASTER | rt::NOTES_SLIDE => {
            // Structural links are resolved by the container importers
            return Ok(RelAction::Keep);
        },
        _ => copy_generic(ctx, source, source_member)?,
    };
    Ok(RelAction::Retarget(dest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::options::MergeOptions;
    use crate::ooxml::pptx::report::ImportReport;
    use crate::ooxml::pptx::test_support::PackageBuilder;

    #[test]
    fn test_copy_media_renumbers_and_reuses() {
        let source = PackageBuilder::new("src").image_slide("Logo").template();
        let mut dest = PackageBuilder::new("dest").image_slide("Existing").package();
        let mut report = ImportReport::new();
        let options = MergeOptions::default();
        let mut ctx = ImportContext::new(&mut dest, &mut report, &options).unwrap();

        let first = copy_media(&mut ctx, &source, "ppt/media/image1.png").unwrap();
        let again = copy_media(&mut ctx, &source, "ppt/media/image1.png").unwrap();
        assert_eq!(first, "ppt/media/image2.png");
        assert_eq!(first, again);
        assert!(ctx.archive.file_exists("ppt/media/image2.png"));
        assert_eq!(ctx.content_types.content_type_of(&first), Some(ct::PNG));
    }

    #[test]
    fn test_unique_member() {
        let mut dest = PackageBuilder::new("dest").slide("A").package();
        dest.archive_mut().write("ppt/tags/tag1.xml", Vec::new());
        dest.archive_mut().write("ppt/tags/tag1-2.xml", Vec::new());
        let mut report = ImportReport::new();
        let options = MergeOptions::default();
        let ctx = ImportContext::new(&mut dest, &mut report, &options).unwrap();
        assert_eq!(unique_member(&ctx, "ppt/tags/tag1.xml"), "ppt/tags/tag1-3.xml");
        assert_eq!(unique_member(&ctx, "ppt/tags/tag2.xml"), "ppt/tags/tag2.xml");
    }
}

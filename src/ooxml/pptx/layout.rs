//! Slide layouts.
//!
//! Layouts belong to exactly one master and are listed in its
//! `p:sldLayoutIdLst`. This module finds destination layouts for imported
//! slides according to [`LayoutStrategy`] and imports single layouts into
//! an existing destination master.

use crate::ooxml::error::{MergeError, Result};
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::phys_pkg::Archive;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::pptx::context::ImportContext;
use crate::ooxml::pptx::counter::PartFamily;
use crate::ooxml::pptx::master::{import_master, master_of_layout};
use crate::ooxml::pptx::options::LayoutStrategy;
use crate::ooxml::pptx::parts::{RelAction, copy_part, copy_relationships};
use crate::ooxml::pptx::presentation;
use crate::ooxml::pptx::template::{Template, part_name};
use crate::ooxml::xml::NodeId;
use tracing::{debug, info, warn};

/// Children of `p:sldMaster` that follow `p:sldLayoutIdLst`.
const AFTER_LAYOUT_LIST: &[&str] = &["p:transition", "p:timing", "p:hf", "p:txStyles", "p:extLst"];

/// Layout parts of a master, in `p:sldLayoutIdLst` order.
pub fn layout_parts(archive: &dyn Archive, master_part: &str) -> Result<Vec<String>> {
    let doc = archive.read_xml(master_part)?;
    let rels = Relationships::load(archive, master_part)?;
    let Some(list) = doc.first_child_named(doc.root(), "p:sldLayoutIdLst") else {
        return Ok(Vec::new());
    };
    doc.children_named(list, "p:sldLayoutId")
        .into_iter()
        .map(|node| {
            let r_id = doc.attr(node, "r:id").unwrap_or_default();
            let target = rels.require(r_id)?;
            Ok(target.part_uri(rels.base_uri())?.membername().to_string())
        })
        .collect()
}

/// Every layout of every master of a presentation.
pub fn all_layouts(archive: &dyn Archive, pres_part: &str) -> Result<Vec<String>> {
    let mut layouts = Vec::new();
    for master in presentation::master_parts(archive, pres_part)? {
        layouts.extend(layout_parts(archive, &master)?);
    }
    Ok(layouts)
}

/// First destination layout whose `p:cSld/@name` is `name`.
pub fn find_layout_by_name(archive: &dyn Archive, pres_part: &str, name: &str) -> Result<Option<String>> {
    for layout in all_layouts(archive, pres_part)? {
        if part_name(&archive.read_xml(&layout)?) == Some(name) {
            return Ok(Some(layout));
        }
    }
    Ok(None)
}

fn first_layout(ctx: &ImportContext<'_>) -> Result<String> {
    all_layouts(ctx.archive, &ctx.main_part)?
        .into_iter()
        .next()
        .ok_or_else(|| MergeError::not_found(format!("slide layout in {}", ctx.archive.label())))
}

/// Destination layout for a slide whose source layout is `source_layout`.
pub(crate) fn resolve_layout(
    ctx: &mut ImportContext<'_>,
    source: &Template,
    source_layout: &str,
) -> Result<String> {
    let layout = match ctx.options.layout_strategy {
        LayoutStrategy::KeepTarget => {
            if ctx.archive.file_exists(source_layout) {
                source_layout.to_string()
            } else {
                first_layout(ctx)?
            }
        },
        LayoutStrategy::ByName => {
            let name = part_name(&source.archive().read_xml(source_layout)?).map(str::to_string);
            let found = match &name {
                Some(name) => find_layout_by_name(ctx.archive, &ctx.main_part, name)?,
                None => None,
            };
            match found {
                Some(layout) => layout,
                None => {
                    warn!(layout = source_layout, name = ?name, "no destination layout with this name, using the first");
                    first_layout(ctx)?
                },
            }
        },
        LayoutStrategy::Import => {
            let key = (source.name().to_string(), source_layout.to_string());
            if let Some(imported) = ctx.imported_layouts.get(&key) {
                imported.clone()
            } else {
                let master = master_of_layout(source.archive(), source_layout)?;
                import_master(ctx, source, &master)?;
                ctx.imported_layouts
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| MergeError::not_found(format!("layout {} in master {}", source_layout, master)))?
            }
        },
    };
    debug!(from = source_layout, to = %layout, strategy = ?ctx.options.layout_strategy, "layout resolved");
    Ok(layout)
}

/// Copy a layout as `ppt/slideLayouts/slideLayoutN.xml`, pointing its master
/// relationship at `dest_master`. The copy is not registered anywhere.
pub(crate) fn copy_layout(
    ctx: &mut ImportContext<'_>,
    source: &Template,
    source_layout: &str,
    dest_master: &str,
) -> Result<String> {
    let number = ctx.counters.increment(PartFamily::Layout)?;
    let dest = format!("ppt/slideLayouts/slideLayout{}.xml", number);
    copy_part(ctx, source, source_layout, &dest)?;
    copy_relationships(ctx, source, source_layout, &dest, |_, target, _| {
        Ok(match target.rel_type.as_str() {
            rt::SLIDE_MASTER => RelAction::Retarget(dest_master.to_string()),
            _ => RelAction::Default,
        })
    })?;
    Ok(dest)
}

/// `p:sldLayoutIdLst` of a master, created in schema position if missing.
pub(crate) fn layout_list(doc: &mut crate::ooxml::xml::XmlDocument) -> NodeId {
    let root = doc.root();
    if let Some(list) = doc.first_child_named(root, "p:sldLayoutIdLst") {
        return list;
    }
    let list = doc.create_element("p:sldLayoutIdLst");
    let anchor = doc
        .element_children(root)
        .find(|c| AFTER_LAYOUT_LIST.contains(&doc.name(*c)));
    match anchor {
        Some(anchor) => doc.insert_before(anchor, list),
        None => doc.append_child(root, list),
    }
    list
}

/// Import one source layout into an existing destination master.
///
/// Returns the new layout member. The layout gets the next free id of the
/// shared master/layout id space.
pub fn import_layout(
    ctx: &mut ImportContext<'_>,
    source: &Template,
    source_layout: &str,
    dest_master: &str,
) -> Result<String> {
    if !ctx.archive.file_exists(dest_master) {
        return Err(MergeError::not_found(format!("master {} in {}", dest_master, ctx.archive.label())));
    }
    let layout = copy_layout(ctx, source, source_layout, dest_master)?;

    let id = presentation::next_master_or_layout_id(ctx.archive, &ctx.main_part)?;
    let mut master = ctx.archive.read_xml(dest_master)?;
    let mut rels = Relationships::load(ctx.archive, dest_master)?;
    let relative = PackURI::from_member(&layout).relative_ref(rels.base_uri());
    let r_id = rels.add(rt::SLIDE_LAYOUT, &relative, false);

    let list = layout_list(&mut master);
    let mut buf = itoa::Buffer::new();
    let node = master.create_element_with("p:sldLayoutId", &[("id", buf.format(id)), ("r:id", r_id.as_str())]);
    master.append_child(list, node);

    ctx.archive.write_xml(dest_master, &master);
    rels.store(ctx.archive);
    info!(from = source_layout, to = %layout, master = dest_master, id, "layout imported");
    Ok(layout)
}

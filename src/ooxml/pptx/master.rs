//! Slide masters.
//!
//! Importing a master copies it together with its theme and every layout it
//! lists. Layout ids are reassigned from the destination's shared
//! master/layout id space before the master is registered in the
//! presentation part.

use crate::ooxml::error::{MergeError, Result};
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::phys_pkg::Archive;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::pptx::context::ImportContext;
use crate::ooxml::pptx::counter::PartFamily;
use crate::ooxml::pptx::layout::copy_layout;
use crate::ooxml::pptx::parts::theme::copy_theme;
use crate::ooxml::pptx::parts::{RelAction, copy_part, copy_relationships};
use crate::ooxml::pptx::presentation;
use crate::ooxml::pptx::template::Template;
use tracing::info;

/// A master copied into the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedMaster {
    pub master: String,
    /// `p:sldMasterId/@id` in the destination
    pub id: u32,
    /// `(source layout, destination layout)` in list order
    pub layouts: Vec<(String, String)>,
}

impl ImportedMaster {
    /// Destination copy of a source layout.
    pub fn layout_for(&self, source_layout: &str) -> Option<&str> {
        self.layouts
            .iter()
            .find(|(from, _)| from == source_layout)
            .map(|(_, to)| to.as_str())
    }
}

/// The master a layout belongs to.
pub fn master_of_layout(archive: &dyn Archive, layout: &str) -> Result<String> {
    let rels = Relationships::load(archive, layout)?;
    let master = rels
        .targets_by_type(rt::SLIDE_MASTER)
        .into_iter()
        .find(|t| t.rel_type == rt::SLIDE_MASTER)
        .ok_or_else(|| MergeError::not_found(format!("master of layout {}", layout)))?;
    Ok(master.part_uri(rels.base_uri())?.membername().to_string())
}

/// Copy a source master with its theme and layouts and register it.
pub fn import_master(ctx: &mut ImportContext<'_>, source: &Template, source_master: &str) -> Result<ImportedMaster> {
    let number = ctx.counters.increment(PartFamily::Master)?;
    let dest = format!("ppt/slideMasters/slideMaster{}.xml", number);
    copy_part(ctx, source, source_master, &dest)?;

    let mut layouts = Vec::new();
    let rels = copy_relationships(ctx, source, source_master, &dest, |ctx, target, member| {
        let action = match target.rel_type.as_str() {
            rt::THEME => RelAction::Retarget(copy_theme(ctx, source, member)?),
            rt::SLIDE_LAYOUT => {
                let layout = copy_layout(ctx, source, member, &dest)?;
                layouts.push((member.to_string(), layout.clone()));
                RelAction::Retarget(layout)
            },
            _ => RelAction::Default,
        };
        Ok(action)
    })?;

    let mut doc = ctx.archive.read_xml(&dest)?;
    // Layouts the source master listed but could not be copied are dropped
    for node in doc.descendants_named(doc.root(), "p:sldLayoutId") {
        let listed = doc.attr(node, "r:id").is_some_and(|id| rels.get(id).is_some());
        if !listed {
            doc.detach(node);
        }
    }
    // Layout ids must be unique across every master of the destination
    let mut next = presentation::next_master_or_layout_id(ctx.archive, &ctx.main_part)?;
    let mut buf = itoa::Buffer::new();
    for node in doc.descendants_named(doc.root(), "p:sldLayoutId") {
        doc.set_attr(node, "id", buf.format(next));
        next += 1;
    }
    ctx.archive.write_xml(&dest, &doc);

    let id = presentation::add_master(ctx.archive, &ctx.main_part, &dest)?;
    for (from, to) in &layouts {
        ctx.imported_layouts
            .insert((source.name().to_string(), from.clone()), to.clone());
    }
    info!(from = source_master, to = %dest, id, layouts = layouts.len(), source = source.name(), "master imported");
    Ok(ImportedMaster {
        master: dest,
        id,
        layouts,
    })
}

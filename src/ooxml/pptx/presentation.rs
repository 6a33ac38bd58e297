//! Maintenance of the presentation part's slide and master lists.
//!
//! `ppt/presentation.xml` owns the order of slides (`p:sldIdLst`) and the
//! list of masters (`p:sldMasterIdLst`). Each entry pairs a numeric id with
//! a relationship id in `ppt/_rels/presentation.xml.rels`. Slide ids start
//! at 256; master and layout ids share one space starting at 2^31.

use crate::ooxml::error::{MergeError, Result};
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::phys_pkg::Archive;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::xml::{NodeId, XmlDocument};
use tracing::debug;

const MIN_SLIDE_ID: u32 = 256;
const MIN_MASTER_ID: u32 = 2_147_483_648;
const APP_PROPERTIES: &str = "docProps/app.xml";

/// Children of `p:presentation` that must precede `p:sldIdLst`.
const BEFORE_SLIDE_LIST: &[&str] = &["p:sldMasterIdLst", "p:notesMasterIdLst", "p:handoutMasterIdLst"];

fn id_of(doc: &XmlDocument, node: NodeId) -> u32 {
    doc.attr(node, "id")
        .and_then(|v| atoi_simd::parse::<u32, false, false>(v.as_bytes()).ok())
        .unwrap_or(0)
}

/// Slide parts in presentation order, as member names.
pub fn slide_parts(archive: &dyn Archive, pres_part: &str) -> Result<Vec<String>> {
    let doc = archive.read_xml(pres_part)?;
    let rels = Relationships::load(archive, pres_part)?;
    let Some(list) = doc.first_child_named(doc.root(), "p:sldIdLst") else {
        return Ok(Vec::new());
    };

    let mut parts = Vec::new();
    for sld_id in doc.children_named(list, "p:sldId") {
        let r_id = doc.attr(sld_id, "r:id").unwrap_or_default();
        let target = rels.require(r_id)?;
        parts.push(target.part_uri(rels.base_uri())?.membername().to_string());
    }
    Ok(parts)
}

/// Slide master parts in list order.
pub fn master_parts(archive: &dyn Archive, pres_part: &str) -> Result<Vec<String>> {
    let doc = archive.read_xml(pres_part)?;
    let rels = Relationships::load(archive, pres_part)?;
    let Some(list) = doc.first_child_named(doc.root(), "p:sldMasterIdLst") else {
        return Ok(Vec::new());
    };
    doc.children_named(list, "p:sldMasterId")
        .into_iter()
        .map(|node| {
            let r_id = doc.attr(node, "r:id").unwrap_or_default();
            let target = rels.require(r_id)?;
            Ok(target.part_uri(rels.base_uri())?.membername().to_string())
        })
        .collect()
}

fn slide_list(doc: &mut XmlDocument) -> NodeId {
    let root = doc.root();
    if let Some(list) = doc.first_child_named(root, "p:sldIdLst") {
        return list;
    }
    let list = doc.create_element("p:sldIdLst");
    let anchor = doc
        .element_children(root)
        .filter(|c| BEFORE_SLIDE_LIST.contains(&doc.name(*c)))
        .last();
    match anchor {
        Some(anchor) => doc.insert_after(anchor, list),
        None => doc.prepend_child(root, list),
    }
    list
}

/// Register a slide part in the slide list.
///
/// The slide is appended, or inserted before the slide currently at
/// `position` (0-based) when one is given and in range. Returns the new
/// `p:sldId/@id`.
pub fn add_slide(
    archive: &mut dyn Archive,
    pres_part: &str,
    slide_part: &str,
    position: Option<usize>,
) -> Result<u32> {
    let mut doc = archive.read_xml(pres_part)?;
    let mut rels = Relationships::load(archive, pres_part)?;

    let target = PackURI::from_member(slide_part).relative_ref(rels.base_uri());
    let r_id = rels.add(rt::SLIDE, &target, false);

    let list = slide_list(&mut doc);
    let existing = doc.children_named(list, "p:sldId");
    let id = existing
        .iter()
        .map(|n| id_of(&doc, *n))
        .max()
        .map_or(MIN_SLIDE_ID, |max| (max + 1).max(MIN_SLIDE_ID));

    let node = doc.create_element_with("p:sldId", &[("id", &id.to_string()), ("r:id", r_id.as_str())]);
    match position.and_then(|p| existing.get(p)) {
        Some(anchor) => doc.insert_before(*anchor, node),
        None => doc.append_child(list, node),
    }
    let count = existing.len() + 1;

    archive.write_xml(pres_part, &doc);
    rels.store(archive);
    update_slide_count(archive, count)?;
    debug!(slide = slide_part, id, r_id = %r_id, "slide registered");
    Ok(id)
}

/// Remove a slide from the slide list and drop its presentation relationship.
/// The slide part itself is left to the caller.
pub fn remove_slide(archive: &mut dyn Archive, pres_part: &str, slide_part: &str) -> Result<()> {
    let mut doc = archive.read_xml(pres_part)?;
    let mut rels = Relationships::load(archive, pres_part)?;
    let wanted = PackURI::from_member(slide_part);

    let r_id = rels
        .targets_by_type(rt::SLIDE)
        .into_iter()
        .find(|t| t.part_uri(rels.base_uri()).is_ok_and(|uri| uri == wanted))
        .map(|t| t.r_id)
        .ok_or_else(|| MergeError::not_found(format!("slide {} in {}", slide_part, pres_part)))?;

    let mut count = 0;
    if let Some(list) = doc.first_child_named(doc.root(), "p:sldIdLst") {
        for node in doc.children_named(list, "p:sldId") {
            if doc.attr(node, "r:id") == Some(r_id.as_str()) {
                doc.detach(node);
            } else {
                count += 1;
            }
        }
    }
    rels.remove(&r_id);

    archive.write_xml(pres_part, &doc);
    rels.store(archive);
    update_slide_count(archive, count)
}

/// Next id free for a master or a layout.
///
/// Master ids and layout ids share one space, so every master's layout list
/// is scanned as well.
pub fn next_master_or_layout_id(archive: &dyn Archive, pres_part: &str) -> Result<u32> {
    let doc = archive.read_xml(pres_part)?;
    let mut max = MIN_MASTER_ID - 1;
    if let Some(list) = doc.first_child_named(doc.root(), "p:sldMasterIdLst") {
        for node in doc.children_named(list, "p:sldMasterId") {
            max = max.max(id_of(&doc, node));
        }
    }
    for master in master_parts(archive, pres_part)? {
        let master_doc = archive.read_xml(&master)?;
        for node in master_doc.descendants_named(master_doc.root(), "p:sldLayoutId") {
            max = max.max(id_of(&master_doc, node));
        }
    }
    Ok(max + 1)
}

/// Register a master part in the master list. Returns the new
/// `p:sldMasterId/@id`.
///
/// The master's layouts must already carry ids from
/// [`next_master_or_layout_id`]; the master gets the next id above both the
/// registered ones and its own layouts.
pub fn add_master(archive: &mut dyn Archive, pres_part: &str, master_part: &str) -> Result<u32> {
    let master_doc = archive.read_xml(master_part)?;
    let own_layouts = master_doc
        .descendants_named(master_doc.root(), "p:sldLayoutId")
        .into_iter()
        .map(|node| id_of(&master_doc, node).saturating_add(1))
        .max()
        .unwrap_or(0);
    let id = next_master_or_layout_id(archive, pres_part)?.max(own_layouts);
    let mut doc = archive.read_xml(pres_part)?;
    let mut rels = Relationships::load(archive, pres_part)?;

    let target = PackURI::from_member(master_part).relative_ref(rels.base_uri());
    let r_id = rels.add(rt::SLIDE_MASTER, &target, false);

    let root = doc.root();
    let list = match doc.first_child_named(root, "p:sldMasterIdLst") {
        Some(list) => list,
        None => {
            let list = doc.create_element("p:sldMasterIdLst");
            doc.prepend_child(root, list);
            list
        },
    };
    let node = doc.create_element_with(
        "p:sldMasterId",
        &[("id", &id.to_string()), ("r:id", r_id.as_str())],
    );
    doc.append_child(list, node);

    archive.write_xml(pres_part, &doc);
    rels.store(archive);
    debug!(master = master_part, id, r_id = %r_id, "master registered");
    Ok(id)
}

/// Keep `docProps/app.xml` in step with the slide list, when present.
fn update_slide_count(archive: &mut dyn Archive, count: usize) -> Result<()> {
    if !archive.file_exists(APP_PROPERTIES) {
        return Ok(());
    }
    let mut doc = archive.read_xml(APP_PROPERTIES)?;
    if let Some(slides) = doc.first_child_named(doc.root(), "Slides") {
        let mut buf = itoa::Buffer::new();
        doc.set_text(slides, buf.format(count));
        archive.write_xml(APP_PROPERTIES, &doc);
    }
    Ok(())
}

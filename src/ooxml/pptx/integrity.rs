//! Relationship integrity.
//!
//! Some producers write relationships to parts they never ship, or ship
//! related parts under names that collide once copied. After an import the
//! parts reachable from the new part are checked; depending on
//! [`IntegrityMode`] a missing target is only reported, or copied from the
//! source under a disambiguating suffix with the relationship relinked.
//!
//! [`analyze`] runs the same check over a whole package, and
//! [`prune_orphans`] removes binary and chart parts nothing points at.

use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::content_types::{ContentTypes, update_content_types};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PackURI, file_stem};
use crate::ooxml::opc::phys_pkg::Archive;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::pptx::context::ImportContext;
use crate::ooxml::pptx::options::IntegrityMode;
use crate::ooxml::pptx::parts::{RelAction, copy_part, copy_relationships};
use crate::ooxml::pptx::report::IntegrityIssue;
use crate::ooxml::pptx::template::Template;
use sha2::{Digest, Sha256};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};

/// Folders whose unreferenced parts [`prune_orphans`] deletes.
pub const PRUNABLE_FOLDERS: &[&str] = &["ppt/media", "ppt/charts", "ppt/embeddings", "ppt/diagrams"];

/// Links into parts the destination owns; the scan does not follow them.
const STRUCTURAL: &[&str] = &[rt::SLIDE, rt::SLIDE_LAYOUT, rt::SLIDE_MASTER, rt::NOTES_SLIDE];

/// Source part of a relationships member.
///
/// `ppt/slides/_rels/slide1.xml.rels` gives `ppt/slides/slide1.xml`, the
/// package relationships `_rels/.rels` give the empty string.
pub fn source_of_rels(rels_member: &str) -> Option<String> {
    let rels_member = rels_member.trim_start_matches('/');
    let (dir, file) = rels_member.rsplit_once("_rels/")?;
    let name = file.strip_suffix(".rels")?;
    if dir.contains("_rels/") {
        return None;
    }
    Some(format!("{}{}", dir, name))
}

fn rels_members(archive: &dyn Archive) -> Vec<String> {
    archive
        .folder("")
        .into_iter()
        .filter(|m| m.ends_with(".rels"))
        .collect()
}

/// Every dangling internal relationship, content-type override without a
/// part, and part without a content type.
pub fn analyze(archive: &dyn Archive) -> Result<Vec<IntegrityIssue>> {
    let mut issues = Vec::new();
    for member in rels_members(archive) {
        let Some(source) = source_of_rels(&member) else {
            continue;
        };
        let rels = Relationships::load(archive, &source)?;
        for target in rels.all().into_iter().filter(|t| !t.is_external) {
            let resolved = target.part_uri(rels.base_uri()).ok();
            let exists = resolved
                .as_ref()
                .is_some_and(|uri| archive.file_exists(uri.membername()));
            if !exists {
                issues.push(IntegrityIssue::MissingPart {
                    rels: member.clone(),
                    r_id: target.r_id.clone(),
                    target: resolved.map_or(target.file.clone(), |uri| uri.membername().to_string()),
                });
            }
        }
    }

    let content_types = ContentTypes::load(archive)?;
    for part in content_types.override_part_names() {
        if !archive.file_exists(&part) {
            issues.push(IntegrityIssue::OrphanOverride { part });
        }
    }
    let content_types_member = CONTENT_TYPES_URI.trim_start_matches('/');
    for member in archive.folder("") {
        if member != content_types_member && content_types.content_type_of(&member).is_none() {
            issues.push(IntegrityIssue::MissingContentType { part: member });
        }
    }

    debug!(package = archive.label(), issues = issues.len(), "package analyzed");
    Ok(issues)
}

/// Suffix distinguishing a repaired copy from the part it stands in for.
pub(crate) fn repair_suffix(reproducible: bool, source: &str, member: &str) -> String {
    if reproducible {
        let digest = Sha256::digest(format!("{}\0{}", source, member).as_bytes());
        digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
    } else {
        format!("{:08x}", rand::random::<u32>())
    }
}

/// `ppt/notesSlides/notesSlide1.xml` to `ppt/notesSlides/notesSlide1-<suffix>.xml`.
pub(crate) fn suffixed_member(member: &str, suffix: &str) -> String {
    let uri = PackURI::from_member(member);
    let filename = uri.filename();
    let stem = file_stem(filename);
    let ext = &filename[stem.len()..];
    let base = uri.base_uri().trim_start_matches('/');
    if base.is_empty() {
        format!("{}-{}{}", stem, suffix, ext)
    } else {
        format!("{}/{}-{}{}", base, stem, suffix, ext)
    }
}

/// Check the parts reachable from a freshly imported `part`.
///
/// Findings go to the import report. In [`IntegrityMode::Assert`] a target
/// missing from the destination but present in `source` is copied under a
/// suffixed name and the relationship pointed at the copy.
pub(crate) fn check_imported(ctx: &mut ImportContext<'_>, source: &Template, part: &str) -> Result<()> {
    let mode = ctx.options.integrity;
    if mode == IntegrityMode::Off {
        return Ok(());
    }

    let mut queue = VecDeque::from([part.to_string()]);
    let mut visited = HashSet::new();
    while let Some(current) = queue.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        let mut rels = Relationships::load(ctx.archive, &current)?;
        let mut relinked = false;

        for target in rels.all().into_iter().filter(|t| !t.is_external) {
            let member = target.part_uri(rels.base_uri())?.membername().to_string();
            if ctx.archive.file_exists(&member) {
                if !STRUCTURAL.contains(&target.rel_type.as_str()) {
                    queue.push_back(member);
                }
                continue;
            }

            if mode == IntegrityMode::Assert && source.archive().file_exists(&member) {
                let suffix = repair_suffix(ctx.options.reproducible_suffixes, source.name(), &member);
                let copy = suffixed_member(&member, &suffix);
                copy_part(ctx, source, &member, &copy)?;
                copy_relationships(ctx, source, &member, &copy, |_, _, _| Ok(RelAction::Default))?;
                let relative = PackURI::from_member(&copy).relative_ref(rels.base_uri());
                rels.set_target(&target.r_id, &relative)?;
                relinked = true;
                info!(rels = rels.path(), r_id = %target.r_id, from = %member, to = %copy, "missing part repaired");
                ctx.report.integrity.push(IntegrityIssue::Repaired {
                    rels: rels.path().to_string(),
                    r_id: target.r_id.clone(),
                    from: member,
                    to: copy,
                });
            } else {
                warn!(rels = rels.path(), r_id = %target.r_id, target = %member, "relationship points at a missing part");
                ctx.report.integrity.push(IntegrityIssue::MissingPart {
                    rels: rels.path().to_string(),
                    r_id: target.r_id.clone(),
                    target: member,
                });
            }
        }

        if relinked {
            rels.store(ctx.archive);
        }
    }
    Ok(())
}

/// Delete media, chart, embedding and diagram parts no relationship targets.
///
/// Runs until nothing changes, since removing a chart can orphan its
/// workbook. Returns the removed members.
pub fn prune_orphans(archive: &mut dyn Archive) -> Result<Vec<String>> {
    let mut pruned = Vec::new();
    loop {
        let mut referenced = HashSet::new();
        for member in rels_members(archive) {
            let Some(source) = source_of_rels(&member) else {
                continue;
            };
            let rels = Relationships::load(archive, &source)?;
            for target in rels.all().into_iter().filter(|t| !t.is_external) {
                if let Ok(uri) = target.part_uri(rels.base_uri()) {
                    referenced.insert(uri.membername().to_string());
                }
            }
        }

        let orphans: Vec<String> = PRUNABLE_FOLDERS
            .iter()
            .flat_map(|folder| archive.folder(folder))
            .filter(|m| !m.contains("/_rels/") && !referenced.contains(m))
            .collect();
        if orphans.is_empty() {
            break;
        }
        for orphan in orphans {
            let rels = PackURI::from_member(&orphan).rels_uri();
            archive.remove(rels.membername());
            archive.remove(&orphan);
            debug!(part = %orphan, "orphan removed");
            pruned.push(orphan);
        }
    }

    if !pruned.is_empty() {
        update_content_types(archive, |cts| {
            for part in &pruned {
                cts.remove_override(part);
            }
        })?;
        info!(package = archive.label(), count = pruned.len(), "orphans pruned");
    }
    Ok(pruned)
}

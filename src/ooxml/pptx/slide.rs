//! Whole-slide import.
//!
//! A slide is copied under the next free slide number together with every
//! part it references. Charts, diagrams, embeddings and media are
//! renumbered, the layout is resolved per [`LayoutStrategy`], and the copy
//! is registered in the destination slide list. Element edits and caller
//! callbacks then run against the copy before it is written.
//!
//! [`LayoutStrategy`]: crate::ooxml::pptx::options::LayoutStrategy

use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::pptx::context::{ImportContext, SourcePart, TargetPart};
use crate::ooxml::pptx::counter::PartFamily;
use crate::ooxml::pptx::integrity;
use crate::ooxml::pptx::layout::resolve_layout;
use crate::ooxml::pptx::parts::chart::{copy_chart, copy_embedding};
use crate::ooxml::pptx::parts::diagram::{copy_diagram_part, is_diagram_relationship};
use crate::ooxml::pptx::parts::{RelAction, copy_part, copy_relationships, unique_member};
use crate::ooxml::pptx::presentation;
use crate::ooxml::pptx::shapes::{
    ElementImport, ElementSelector, HYPERLINK_TAGS, ShapeCallback, import_element, modify_element, remove_element,
};
use crate::ooxml::pptx::template::Template;
use crate::ooxml::xml::XmlDocument;
use tracing::{debug, info, warn};

pub type SlideFn = Box<dyn FnMut(&mut XmlDocument) -> Result<()>>;
pub type SlideRelationsFn = Box<dyn FnMut(&mut XmlDocument, &mut Relationships) -> Result<()>>;

/// Caller modification of a whole imported slide.
pub enum SlideCallback {
    /// `(slide)`
    Slide(SlideFn),
    /// `(slide, slide relationships)`
    WithRelations(SlideRelationsFn),
}

impl SlideCallback {
    pub fn slide<F>(f: F) -> Self
    where
        F: FnMut(&mut XmlDocument) -> Result<()> + 'static,
    {
        SlideCallback::Slide(Box::new(f))
    }

    pub fn with_relations<F>(f: F) -> Self
    where
        F: FnMut(&mut XmlDocument, &mut Relationships) -> Result<()> + 'static,
    {
        SlideCallback::WithRelations(Box::new(f))
    }
}

impl std::fmt::Debug for SlideCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            SlideCallback::Slide(_) => "Slide",
            SlideCallback::WithRelations(_) => "WithRelations",
        };
        f.debug_tuple("SlideCallback").field(&kind).finish()
    }
}

/// Callbacks for one element of the copied slide.
#[derive(Debug)]
pub struct ElementModification {
    pub selector: ElementSelector,
    pub callbacks: Vec<ShapeCallback>,
}

/// One slide to import, with the edits to make on the copy.
///
/// Edits run in this order: removals, element modifications, extra element
/// imports, slide callbacks.
#[derive(Debug)]
pub struct SlideImport {
    /// 1-based source slide number
    pub slide: usize,
    /// 0-based destination position; appended when `None`
    pub position: Option<usize>,
    pub removals: Vec<ElementSelector>,
    pub modifications: Vec<ElementModification>,
    /// Elements from other slides of the same template placed on the copy
    pub elements: Vec<ElementImport>,
    pub callbacks: Vec<SlideCallback>,
}

impl SlideImport {
    pub fn new(slide: usize) -> Self {
        Self {
            slide,
            position: None,
            removals: Vec::new(),
            modifications: Vec::new(),
            elements: Vec::new(),
            callbacks: Vec::new(),
        }
    }

    /// Insert before the destination slide currently at `position`.
    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn remove(mut self, selector: impl Into<ElementSelector>) -> Self {
        self.removals.push(selector.into());
        self
    }

    /// Add a callback for an element; callbacks for the same element run in
    /// the order they were added.
    pub fn modify(mut self, selector: impl Into<ElementSelector>, callback: ShapeCallback) -> Self {
        let selector = selector.into();
        match self.modifications.iter_mut().find(|m| m.selector == selector) {
            Some(existing) => existing.callbacks.push(callback),
            None => self.modifications.push(ElementModification {
                selector,
                callbacks: vec![callback],
            }),
        }
        self
    }

    pub fn with_element(mut self, element: ElementImport) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_callback(mut self, callback: SlideCallback) -> Self {
        self.callbacks.push(callback);
        self
    }
}

/// A slide copied into the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedSlide {
    pub part: String,
    /// `p:sldId/@id` in the destination
    pub id: u32,
    pub layout: Option<String>,
}

/// Run slide callbacks, recording each outcome.
pub(crate) fn run_slide_callbacks(ctx: &mut ImportContext<'_>, target: &mut TargetPart, callbacks: &mut [SlideCallback]) {
    for (index, callback) in callbacks.iter_mut().enumerate() {
        let result = match callback {
            SlideCallback::Slide(f) => f(&mut target.doc),
            SlideCallback::WithRelations(f) => f(&mut target.doc, &mut target.rels),
        };
        ctx.report.record_callback(&target.member, "slide", index, result);
    }
}

/// Copy a notes slide for `dest_slide`.
///
/// Notes point back at their slide and at the notes master; without a
/// destination notes master they are dropped.
fn copy_notes(
    ctx: &mut ImportContext<'_>,
    source: &Template,
    source_member: &str,
    dest_slide: &str,
) -> Result<RelAction> {
    let pres_rels = Relationships::load(ctx.archive, &ctx.main_part)?;
    let notes_master = match pres_rels
        .targets_by_type(rt::NOTES_MASTER)
        .into_iter()
        .find(|t| t.rel_type == rt::NOTES_MASTER)
    {
        Some(target) => target.part_uri(pres_rels.base_uri())?.membername().to_string(),
        None => {
            warn!(notes = source_member, "destination has no notes master, notes dropped");
            return Ok(RelAction::Drop);
        },
    };

    let number = PackURI::from_member(dest_slide).idx().unwrap_or(0);
    let dest = unique_member(ctx, &format!("ppt/notesSlides/notesSlide{}.xml", number));
    copy_part(ctx, source, source_member, &dest)?;
    copy_relationships(ctx, source, source_member, &dest, |_, target, _| {
        Ok(match target.rel_type.as_str() {
            rt::SLIDE => RelAction::Retarget(dest_slide.to_string()),
            rt::NOTES_MASTER => RelAction::Retarget(notes_master.clone()),
            _ => RelAction::Default,
        })
    })?;
    Ok(RelAction::Retarget(dest))
}

/// Remove the hyperlink elements pointing at `r_ids`.
///
/// Jumps to other slides name a slide of the source package; the matching
/// destination slide, if any, is unrelated.
fn unlink_slide_jumps(doc: &mut XmlDocument, r_ids: &[String]) -> usize {
    let links: Vec<_> = doc
        .descendants(doc.root())
        .into_iter()
        .filter(|n| doc.is_element(*n) && HYPERLINK_TAGS.contains(&doc.name(*n)))
        .filter(|n| doc.attr(*n, "r:id").is_some_and(|id| r_ids.iter().any(|r| r == id)))
        .collect();
    for link in &links {
        doc.detach(*link);
    }
    links.len()
}

/// Copy one source slide into the destination.
pub(crate) fn import_slide(
    ctx: &mut ImportContext<'_>,
    source: &Template,
    request: &mut SlideImport,
) -> Result<ImportedSlide> {
    let source_member = source.slide_part(request.slide)?;
    let number = ctx.counters.increment(PartFamily::Slide)?;
    let dest = format!("ppt/slides/slide{}.xml", number);
    debug!(from = %source_member, to = %dest, source = source.name(), "slide prepare");
    copy_part(ctx, source, &source_member, &dest)?;

    let drop_unsupported = ctx.options.drop_unsupported_relations;
    let mut layout = None;
    let mut slide_jumps = Vec::new();
    copy_relationships(ctx, source, &source_member, &dest, |ctx, target, member| {
        let rel_type = target.rel_type.as_str();
        let action = match rel_type {
            rt::SLIDE_LAYOUT => {
                let resolved = resolve_layout(ctx, source, member)?;
                layout = Some(resolved.clone());
                RelAction::Retarget(resolved)
            },
            rt::SLIDE => {
                slide_jumps.push(target.r_id.clone());
                RelAction::Drop
            },
            rt::NOTES_SLIDE | rt::COMMENTS | rt::TAGS if drop_unsupported => RelAction::Drop,
            rt::NOTES_SLIDE => copy_notes(ctx, source, member, &dest)?,
            rt::CHART | rt::CHART_EX => RelAction::Retarget(copy_chart(ctx, source, member)?),
            rt::PACKAGE | rt::OLE_OBJECT => {
                let stem = match rel_type {
                    rt::PACKAGE if !target.file_base.is_empty() => target.file_base.as_str(),
                    _ => "oleObject",
                };
                RelAction::Retarget(copy_embedding(ctx, source, member, stem)?)
            },
            _ if is_diagram_relationship(rel_type) => RelAction::Retarget(copy_diagram_part(ctx, source, member)?),
            _ => RelAction::Default,
        };
        Ok(action)
    })?;

    let mut target = TargetPart::load(ctx.archive, &dest)?;
    if !slide_jumps.is_empty() {
        let unlinked = unlink_slide_jumps(&mut target.doc, &slide_jumps);
        debug!(slide = %dest, unlinked, "slide jumps unlinked");
    }
    for selector in &request.removals {
        remove_element(&mut target, selector)?;
    }
    for modification in &mut request.modifications {
        modify_element(ctx, &mut target, &modification.selector, &mut modification.callbacks)?;
    }
    for element in &mut request.elements {
        let part = SourcePart::slide(source, element.slide)?;
        import_element(ctx, &part, &mut target, element)?;
    }
    run_slide_callbacks(ctx, &mut target, &mut request.callbacks);
    target.store(ctx.archive);

    let id = presentation::add_slide(ctx.archive, &ctx.main_part, &dest, request.position)?;
    integrity::check_imported(ctx, source, &dest)?;
    info!(from = %source_member, to = %dest, id, source = source.name(), "slide imported");
    Ok(ImportedSlide {
        part: dest,
        id,
        layout,
    })
}

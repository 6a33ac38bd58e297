/// Element importers.
///
/// Importing one element from a source slide into a destination slide runs
/// four phases in a fixed order:
///
/// 1. **prepare**: copy the parts the element points at under new numbers
///    and create the destination relationships ([`ShapeImporter::prepare`])
/// 2. **clone**: copy the element subtree into the destination tree
/// 3. **rewire**: rewrite every `r:*` attribute of the copy from source to
///    destination relationship ids, then run the caller's callbacks
/// 4. **place**: append the copy or put it where a named element was
///
/// Every element kind has its own `prepare`; the other phases are shared.
pub mod chart;
pub mod diagram;
pub mod generic;
pub mod hyperlink;
pub mod image;
pub mod ole;

use crate::ooxml::error::{MergeError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::rel::{NewRelId, Relationships};
use crate::ooxml::pptx::context::{ImportContext, SourcePart, TargetPart};
use crate::ooxml::pptx::patch::chart::ChartFill;
use crate::ooxml::pptx::patch::table::TableData;
use crate::ooxml::pptx::patch::worksheet::Workbook;
use crate::ooxml::xml::{NodeId, XmlDocument};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Element tags that can sit in a shape tree.
pub const SHAPE_TAGS: &[&str] = &["p:sp", "p:pic", "p:graphicFrame", "p:grpSp", "p:cxnSp"];

/// Tags carrying a hyperlink relationship.
pub const HYPERLINK_TAGS: &[&str] = &["a:hlinkClick", "a:hlinkHover"];

/// Kind of a slide element, deciding which importer handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Generic,
    Image,
    Chart,
    Diagram,
    /// A shape with exactly one hyperlink
    Hyperlink,
    OleObject,
    Table,
}

impl ShapeKind {
    pub fn detect(doc: &XmlDocument, node: NodeId) -> Self {
        match doc.name(node) {
            "p:pic" => return ShapeKind::Image,
            "p:graphicFrame" => {
                let uri = doc
                    .find_first(node, "a:graphicData")
                    .and_then(|g| doc.attr(g, "uri"))
                    .unwrap_or_default();
                if uri.ends_with("/chart") || uri.ends_with("/chartex") {
                    return ShapeKind::Chart;
                }
                if uri.ends_with("/diagram") {
                    return ShapeKind::Diagram;
                }
                if uri.ends_with("/ole") {
                    return ShapeKind::OleObject;
                }
                if uri.ends_with("/table") {
                    return ShapeKind::Table;
                }
            },
            _ => {},
        }
        if hyperlink::hyperlink_ids(doc, node).len() == 1 {
            ShapeKind::Hyperlink
        } else {
            ShapeKind::Generic
        }
    }
}

/// `p:cSld/p:spTree` of a slide, layout or master.
pub fn shape_tree(doc: &XmlDocument) -> Option<NodeId> {
    doc.find_path(doc.root(), &["p:cSld", "p:spTree"])
}

/// Top-level elements of the shape tree, in z-order.
pub fn shape_elements(doc: &XmlDocument) -> Vec<NodeId> {
    let Some(tree) = shape_tree(doc) else {
        return Vec::new();
    };
    doc.element_children(tree)
        .filter_map(|child| match doc.name(child) {
            name if SHAPE_TAGS.contains(&name) => Some(child),
            "mc:AlternateContent" => doc
                .first_child_named(child, "mc:Choice")
                .and_then(|choice| doc.element_children(choice).find(|c| SHAPE_TAGS.contains(&doc.name(*c)))),
            _ => None,
        })
        .collect()
}

/// `p:cNvPr` inside the element's `p:nv*Pr` block.
fn non_visual_props(doc: &XmlDocument, shape: NodeId) -> Option<NodeId> {
    doc.element_children(shape)
        .find(|c| doc.local_name(*c).starts_with("nv"))
        .and_then(|nv| doc.first_child_named(nv, "p:cNvPr"))
}

pub fn shape_name(doc: &XmlDocument, shape: NodeId) -> Option<&str> {
    non_visual_props(doc, shape).and_then(|c| doc.attr(c, "name"))
}

pub fn shape_id(doc: &XmlDocument, shape: NodeId) -> Option<u32> {
    non_visual_props(doc, shape)
        .and_then(|c| doc.attr(c, "id"))
        .and_then(|v| atoi_simd::parse::<u32, false, false>(v.as_bytes()).ok())
}

/// `a16:creationId/@id` of an element, stable across producer edits.
pub fn creation_id(doc: &XmlDocument, shape: NodeId) -> Option<&str> {
    non_visual_props(doc, shape)
        .and_then(|c| doc.find_first(c, "a16:creationId"))
        .and_then(|c| doc.attr(c, "id"))
}

/// How an element is picked out of a shape tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementSelector {
    Name(String),
    CreationId(String),
}

impl ElementSelector {
    pub fn name(name: impl Into<String>) -> Self {
        ElementSelector::Name(name.into())
    }

    pub fn creation_id(id: impl Into<String>) -> Self {
        ElementSelector::CreationId(id.into())
    }

    /// First matching element anywhere in the slide's shape tree.
    pub fn find(&self, doc: &XmlDocument) -> Option<NodeId> {
        let tree = shape_tree(doc)?;
        doc.descendants(tree)
            .into_iter()
            .filter(|n| SHAPE_TAGS.contains(&doc.name(*n)))
            .find(|n| match self {
                ElementSelector::Name(name) => shape_name(doc, *n) == Some(name.as_str()),
                ElementSelector::CreationId(id) => creation_id(doc, *n) == Some(id.as_str()),
            })
    }

    /// Like [`find`](Self::find), failing with `NotFound`.
    pub fn require(&self, doc: &XmlDocument, part: &str) -> Result<NodeId> {
        self.find(doc)
            .ok_or_else(|| MergeError::not_found(format!("element {} in {}", self, part)))
    }
}

impl std::fmt::Display for ElementSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementSelector::Name(name) => write!(f, "'{}'", name),
            ElementSelector::CreationId(id) => write!(f, "creationId {}", id),
        }
    }
}

impl From<&str> for ElementSelector {
    fn from(name: &str) -> Self {
        ElementSelector::Name(name.to_string())
    }
}

/// An element wrapped in `mc:AlternateContent` is copied with its wrapper.
fn outermost(doc: &XmlDocument, node: NodeId) -> NodeId {
    match doc.parent(node) {
        Some(branch) if matches!(doc.name(branch), "mc:Choice" | "mc:Fallback") => doc
            .parent(branch)
            .filter(|p| doc.name(*p) == "mc:AlternateContent")
            .unwrap_or(node),
        _ => node,
    }
}

pub type ElementFn = Box<dyn FnMut(&mut XmlDocument, NodeId) -> Result<()>>;
pub type RelationsFn = Box<dyn FnMut(&mut XmlDocument, NodeId, &mut Relationships) -> Result<()>>;
pub type ChartFn = Box<dyn FnMut(&mut XmlDocument, NodeId, &mut XmlDocument, &mut Workbook) -> Result<()>>;

/// Caller modification of an imported element.
///
/// Callbacks run against the destination copy after its relationship ids
/// are rewritten. A failing callback is recorded in the import report and
/// the import carries on.
pub enum ShapeCallback {
    /// `(slide, element)`
    Element(ElementFn),
    /// `(slide, element, slide relationships)`
    WithRelations(RelationsFn),
    /// `(slide, element, chart, workbook)`; chart and workbook are stored
    /// only when the callback succeeds
    Chart(ChartFn),
}

impl ShapeCallback {
    pub fn element<F>(f: F) -> Self
    where
        F: FnMut(&mut XmlDocument, NodeId) -> Result<()> + 'static,
    {
        ShapeCallback::Element(Box::new(f))
    }

    pub fn with_relations<F>(f: F) -> Self
    where
        F: FnMut(&mut XmlDocument, NodeId, &mut Relationships) -> Result<()> + 'static,
    {
        ShapeCallback::WithRelations(Box::new(f))
    }

    pub fn chart<F>(f: F) -> Self
    where
        F: FnMut(&mut XmlDocument, NodeId, &mut XmlDocument, &mut Workbook) -> Result<()> + 'static,
    {
        ShapeCallback::Chart(Box::new(f))
    }

    /// Project chart data onto the chart and its embedded workbook.
    pub fn chart_data<D: ChartFill + 'static>(data: D) -> Self {
        Self::chart(move |_, _, chart, workbook| data.apply_to(chart, workbook))
    }

    /// Project rows onto the element's `a:tbl`.
    pub fn table_data(data: TableData) -> Self {
        Self::element(move |doc, node| data.apply_to(doc, node))
    }
}

impl std::fmt::Debug for ShapeCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            ShapeCallback::Element(_) => "Element",
            ShapeCallback::WithRelations(_) => "WithRelations",
            ShapeCallback::Chart(_) => "Chart",
        };
        f.debug_tuple("ShapeCallback").field(&kind).finish()
    }
}

/// Where the imported copy goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Placement {
    /// On top of the shape tree
    #[default]
    Append,
    /// In place of an existing destination element
    Replace(ElementSelector),
}

/// One element to import from a source slide.
#[derive(Debug)]
pub struct ElementImport {
    /// 1-based source slide number
    pub slide: usize,
    pub selector: ElementSelector,
    pub placement: Placement,
    pub callbacks: Vec<ShapeCallback>,
}

impl ElementImport {
    pub fn new(slide: usize, selector: impl Into<ElementSelector>) -> Self {
        Self {
            slide,
            selector: selector.into(),
            placement: Placement::Append,
            callbacks: Vec::new(),
        }
    }

    pub fn replacing(mut self, selector: impl Into<ElementSelector>) -> Self {
        self.placement = Placement::Replace(selector.into());
        self
    }

    pub fn with_callback(mut self, callback: ShapeCallback) -> Self {
        self.callbacks.push(callback);
        self
    }
}

/// Source relationship id to destination relationship id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelIdMap {
    ids: HashMap<String, NewRelId>,
}

impl RelIdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, dest: NewRelId) {
        self.ids.insert(source.into(), dest);
    }

    pub fn get(&self, source: &str) -> Option<&NewRelId> {
        self.ids.get(source)
    }

    pub fn contains(&self, source: &str) -> bool {
        self.ids.contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Rewrite every mapped `r:*` attribute in the subtree at `node`.
    pub fn rewrite(&self, doc: &mut XmlDocument, node: NodeId) {
        for n in subtree(doc, node) {
            let updates: Vec<(String, String)> = doc
                .attrs(n)
                .iter()
                .filter(|a| a.name.starts_with("r:"))
                .filter_map(|a| self.ids.get(&a.value).map(|id| (a.name.clone(), id.as_str().to_string())))
                .collect();
            for (name, value) in updates {
                doc.set_attr(n, &name, value);
            }
        }
    }
}

/// `node` followed by its descendants in document order.
pub(crate) fn subtree(doc: &XmlDocument, node: NodeId) -> Vec<NodeId> {
    let mut nodes = vec![node];
    nodes.extend(doc.descendants(node));
    nodes
}

/// Relationship ids referenced by `r:*` attributes in a subtree, first
/// occurrence order.
pub fn relationship_ids(doc: &XmlDocument, node: NodeId) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for n in subtree(doc, node) {
        if !doc.is_element(n) {
            continue;
        }
        for attr in doc.attrs(n) {
            if attr.name.starts_with("r:") && !attr.value.is_empty() && seen.insert(attr.value.clone()) {
                ids.push(attr.value.clone());
            }
        }
    }
    ids
}

/// Result of the prepare phase.
#[derive(Debug, Default)]
pub struct Prepared {
    pub rel_map: RelIdMap,
    /// Destination chart part, handed to chart callbacks
    pub chart_part: Option<String>,
}

/// The per-kind part of an element import.
pub trait ShapeImporter {
    fn kind(&self) -> ShapeKind;

    /// Copy the parts `element` depends on and create destination
    /// relationships for them.
    fn prepare(
        &self,
        ctx: &mut ImportContext<'_>,
        source: &SourcePart<'_>,
        target: &mut TargetPart,
        element: NodeId,
    ) -> Result<Prepared>;
}

/// Importer responsible for a kind.
pub fn importer_for(kind: ShapeKind) -> &'static dyn ShapeImporter {
    match kind {
        ShapeKind::Generic => &generic::GenericImporter::GENERIC,
        ShapeKind::Table => &generic::GenericImporter::TABLE,
        ShapeKind::Image => &image::ImageImporter,
        ShapeKind::Chart => &chart::ChartImporter,
        ShapeKind::Diagram => &diagram::DiagramImporter,
        ShapeKind::Hyperlink => &hyperlink::HyperlinkImporter,
        ShapeKind::OleObject => &ole::OleImporter,
    }
}

/// Append a relationship from the destination part to a copied member.
pub(crate) fn link_part(target: &mut TargetPart, rel_type: &str, member: &str) -> NewRelId {
    let relative = PackURI::from_member(member).relative_ref(target.rels.base_uri());
    target.rels.add(rel_type, &relative, false)
}

/// Import every relationship of the subtree not already in `map`.
///
/// External and hyperlink relationships are de-duplicated by their
/// `(type, target, mode)` triple; internal parts are copied with the
/// default rule for their type.
pub(crate) fn import_references(
    ctx: &mut ImportContext<'_>,
    source: &SourcePart<'_>,
    target: &mut TargetPart,
    element: NodeId,
    map: &mut RelIdMap,
) -> Result<()> {
    let mut links = hyperlink::LinkRegistry::new();
    for r_id in relationship_ids(&source.doc, element) {
        if map.contains(&r_id) {
            continue;
        }
        let rel = source.rels.require(&r_id)?;
        let new_id = links.link(ctx, source, target, &rel)?;
        debug!(part = %target.member, from = %r_id, to = %new_id, rel_type = %rel.rel_type, "relationship imported");
        map.insert(r_id, new_id);
    }
    Ok(())
}

/// Import one element from `source` into `target`.
///
/// Returns the placed copy. Missing source elements or relationships abort
/// the import; callback failures only end up in the report.
pub(crate) fn import_element(
    ctx: &mut ImportContext<'_>,
    source: &SourcePart<'_>,
    target: &mut TargetPart,
    request: &mut ElementImport,
) -> Result<NodeId> {
    let found = request.selector.require(&source.doc, &source.member)?;
    let kind = ShapeKind::detect(&source.doc, found);
    let element = outermost(&source.doc, found);
    let label = shape_name(&source.doc, found).unwrap_or_default().to_string();
    let importer = importer_for(kind);

    debug!(element = %label, kind = ?importer.kind(), from = %source.member, to = %target.member, "prepare");
    let prepared = importer.prepare(ctx, source, target, element)?;

    let copy = target.doc.import_node(&source.doc, element);
    debug!(element = %label, relationships = prepared.rel_map.len(), "rewire");
    prepared.rel_map.rewrite(&mut target.doc, copy);
    run_callbacks(ctx, target, copy, prepared.chart_part.as_deref(), &label, &mut request.callbacks);

    debug!(element = %label, placement = ?request.placement, "place");
    place(target, copy, &request.placement)?;
    declare_namespaces(&mut target.doc, &source.doc);
    Ok(copy)
}

/// Run callbacks against an element already in the destination slide.
pub(crate) fn modify_element(
    ctx: &mut ImportContext<'_>,
    target: &mut TargetPart,
    selector: &ElementSelector,
    callbacks: &mut [ShapeCallback],
) -> Result<()> {
    let element = selector.require(&target.doc, &target.member)?;
    let chart_part = chart::chart_part_of(&target.doc, element, &target.rels)?;
    let label = shape_name(&target.doc, element).unwrap_or_default().to_string();
    run_callbacks(ctx, target, element, chart_part.as_deref(), &label, callbacks);
    Ok(())
}

fn run_callbacks(
    ctx: &mut ImportContext<'_>,
    target: &mut TargetPart,
    element: NodeId,
    chart_part: Option<&str>,
    label: &str,
    callbacks: &mut [ShapeCallback],
) {
    for (index, callback) in callbacks.iter_mut().enumerate() {
        let result = match callback {
            ShapeCallback::Element(f) => f(&mut target.doc, element),
            ShapeCallback::WithRelations(f) => f(&mut target.doc, element, &mut target.rels),
            ShapeCallback::Chart(f) => match chart_part {
                Some(part) => chart::with_chart(ctx.archive, part, |chart, workbook| {
                    f(&mut target.doc, element, chart, workbook)
                }),
                None => Err(MergeError::not_found(format!("chart behind element '{}'", label))),
            },
        };
        ctx.report.record_callback(&target.member, label, index, result);
    }
}

/// Remove an element and the relationships only it referenced.
pub fn remove_element(target: &mut TargetPart, selector: &ElementSelector) -> Result<()> {
    let found = selector.require(&target.doc, &target.member)?;
    let element = outermost(&target.doc, found);
    let ids = relationship_ids(&target.doc, element);
    target.doc.detach(element);

    let root = target.doc.root();
    let still_used: HashSet<String> = relationship_ids(&target.doc, root).into_iter().collect();
    for r_id in ids.into_iter().filter(|id| !still_used.contains(id)) {
        target.rels.remove(&r_id);
    }
    debug!(part = %target.member, element = %selector, "element removed");
    Ok(())
}

fn place(target: &mut TargetPart, copy: NodeId, placement: &Placement) -> Result<()> {
    match placement {
        Placement::Append => {
            let tree = shape_tree(&target.doc)
                .ok_or_else(|| MergeError::not_found(format!("p:spTree in {}", target.member)))?;
            target.doc.append_child(tree, copy);
        },
        Placement::Replace(selector) => {
            let found = selector.require(&target.doc, &target.member)?;
            let old = outermost(&target.doc, found);
            target.doc.replace(old, copy);
        },
    }
    renumber_shape_ids(&mut target.doc, copy);
    Ok(())
}

/// Give every `p:cNvPr` in `placed` an id no other element of the slide uses.
pub(crate) fn renumber_shape_ids(doc: &mut XmlDocument, placed: NodeId) {
    let root = doc.root();
    let placed_nodes: HashSet<NodeId> = subtree(doc, placed).into_iter().collect();
    let parse = |doc: &XmlDocument, n: NodeId| {
        doc.attr(n, "id")
            .and_then(|v| atoi_simd::parse::<u32, false, false>(v.as_bytes()).ok())
    };

    let mut used: HashSet<u32> = doc
        .descendants_named(root, "p:cNvPr")
        .into_iter()
        .filter(|n| !placed_nodes.contains(n))
        .filter_map(|n| parse(doc, n))
        .collect();
    let mut next = used.iter().copied().max().unwrap_or(1) + 1;

    let mut props = doc.descendants_named(placed, "p:cNvPr");
    if doc.name(placed) == "p:cNvPr" {
        props.insert(0, placed);
    }
    for node in props {
        match parse(doc, node) {
            Some(id) if id != 0 && !used.contains(&id) => {
                used.insert(id);
            },
            _ => {
                while used.contains(&next) {
                    next += 1;
                }
                let mut buf = itoa::Buffer::new();
                doc.set_attr(node, "id", buf.format(next));
                used.insert(next);
            },
        }
    }
}

/// Copy `xmlns:*` declarations of the source root missing on the target root.
pub(crate) fn declare_namespaces(target: &mut XmlDocument, source: &XmlDocument) {
    let (source_root, target_root) = (source.root(), target.root());
    let missing: Vec<(String, String)> = source
        .attrs(source_root)
        .iter()
        .filter(|a| a.name.starts_with("xmlns:") && target.attr(target_root, &a.name).is_none())
        .map(|a| (a.name.clone(), a.value.clone()))
        .collect();
    for (name, value) in missing {
        target.set_attr(target_root, &name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::options::MergeOptions;
    use crate::ooxml::pptx::report::ImportReport;
    use crate::ooxml::pptx::test_support::PackageBuilder;

    #[test]
    fn test_detect_kinds() {
        let template = PackageBuilder::new("src")
            .chart_slide("Revenue")
            .image_slide("Logo")
            .diagram_slide("Flow")
            .hyperlink_slide("Link")
            .ole_slide("Sheet")
            .template();
        let kind_of = |slide: usize, name: &str| {
            let source = SourcePart::slide(&template, slide).unwrap();
            let node = ElementSelector::name(name).find(&source.doc).unwrap();
            ShapeKind::detect(&source.doc, node)
        };
        assert_eq!(kind_of(1, "Revenue"), ShapeKind::Chart);
        assert_eq!(kind_of(1, "Title 1"), ShapeKind::Generic);
        assert_eq!(kind_of(2, "Logo"), ShapeKind::Image);
        assert_eq!(kind_of(3, "Flow"), ShapeKind::Diagram);
        assert_eq!(kind_of(4, "Link"), ShapeKind::Hyperlink);
        assert_eq!(kind_of(4, "Link Table"), ShapeKind::Table);
        assert_eq!(kind_of(5, "Sheet"), ShapeKind::OleObject);
    }

    #[test]
    fn test_selector_by_creation_id() {
        let template = PackageBuilder::new("src").slide("Intro").template();
        let source = SourcePart::slide(&template, 1).unwrap();
        let by_name = ElementSelector::name("Title 1").find(&source.doc).unwrap();
        let id = creation_id(&source.doc, by_name).unwrap().to_string();
        let by_id = ElementSelector::creation_id(id).find(&source.doc).unwrap();
        assert_eq!(by_name, by_id);
        assert!(ElementSelector::name("Nope").require(&source.doc, "slide1").is_err());
    }

    #[test]
    fn test_rel_id_map_rewrite() {
        let mut doc = XmlDocument::parse_str(
            r#"<p:pic><p:blipFill><a:blip r:embed="rId2"><a:extLst/></a:blip></p:blipFill><a:hlinkClick r:id="rId9"/></p:pic>"#,
        )
        .unwrap();
        let root = doc.root();
        let mut map = RelIdMap::new();
        let mut rels = Relationships::new("ppt/slides/slide1.xml");
        map.insert("rId2", rels.add("t", "a.png", false));
        map.insert("rId9", rels.add("t", "b.png", false));
        map.rewrite(&mut doc, root);
        assert_eq!(
            doc.to_xml_string(),
            r#"<p:pic><p:blipFill><a:blip r:embed="rId1"><a:extLst/></a:blip></p:blipFill><a:hlinkClick r:id="rId2"/></p:pic>"#
        );
        assert_eq!(relationship_ids(&doc, root), vec!["rId1", "rId2"]);
    }

    #[test]
    fn test_import_generic_appends_and_renumbers() {
        let source = PackageBuilder::new("src").slide("Intro").template();
        let mut dest = PackageBuilder::new("dest").slide("Existing").package();
        let mut report = ImportReport::new();
        let options = MergeOptions::default();
        let mut ctx = ImportContext::new(&mut dest, &mut report, &options).unwrap();

        let src = SourcePart::slide(&source, 1).unwrap();
        let mut target = TargetPart::load(ctx.archive, "ppt/slides/slide1.xml").unwrap();
        let mut request = ElementImport::new(1, "Title 1").with_callback(ShapeCallback::element(|doc, node| {
            let t = doc.find_first(node, "a:t").ok_or_else(|| MergeError::Callback("no text".into()))?;
            doc.set_text(t, "Changed");
            Ok(())
        }));
        let copy = import_element(&mut ctx, &src, &mut target, &mut request).unwrap();

        let names: Vec<_> = shape_elements(&target.doc)
            .into_iter()
            .map(|n| shape_name(&target.doc, n).unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["Title 1", "Title 1"]);
        let ids: HashSet<_> = shape_elements(&target.doc)
            .into_iter()
            .filter_map(|n| shape_id(&target.doc, n))
            .collect();
        assert_eq!(ids.len(), 2);
        let text = target.doc.find_first(copy, "a:t").unwrap();
        assert_eq!(target.doc.text(text), "Changed");
        assert_eq!(ctx.report.callbacks.len(), 1);
        assert!(!ctx.report.has_failures());
    }

    #[test]
    fn test_failing_callback_does_not_abort() {
        let source = PackageBuilder::new("src").slide("Intro").template();
        let mut dest = PackageBuilder::new("dest").slide("Existing").package();
        let mut report = ImportReport::new();
        let options = MergeOptions::default();
        let mut ctx = ImportContext::new(&mut dest, &mut report, &options).unwrap();

        let src = SourcePart::slide(&source, 1).unwrap();
        let mut target = TargetPart::load(ctx.archive, "ppt/slides/slide1.xml").unwrap();
        let mut request = ElementImport::new(1, "Title 1")
            .replacing("Title 1")
            .with_callback(ShapeCallback::element(|_, _| Err(MergeError::Callback("boom".into()))))
            .with_callback(ShapeCallback::element(|doc, node| {
                doc.set_attr(node, "checked", "1");
                Ok(())
            }));
        let copy = import_element(&mut ctx, &src, &mut target, &mut request).unwrap();

        assert_eq!(shape_elements(&target.doc), vec![copy]);
        assert_eq!(target.doc.attr(copy, "checked"), Some("1"));
        assert_eq!(ctx.report.failed_callbacks().count(), 1);
        assert_eq!(ctx.report.callbacks.len(), 2);
    }

    #[test]
    fn test_missing_element_is_fatal() {
        let source = PackageBuilder::new("src").slide("Intro").template();
        let mut dest = PackageBuilder::new("dest").slide("Existing").package();
        let mut report = ImportReport::new();
        let options = MergeOptions::default();
        let mut ctx = ImportContext::new(&mut dest, &mut report, &options).unwrap();
        let src = SourcePart::slide(&source, 1).unwrap();
        let mut target = TargetPart::load(ctx.archive, "ppt/slides/slide1.xml").unwrap();
        let mut request = ElementImport::new(1, "Missing");
        assert!(matches!(
            import_element(&mut ctx, &src, &mut target, &mut request),
            Err(MergeError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_element_drops_unused_relationships() {
        let mut dest = PackageBuilder::new("dest").image_slide("Logo").package();
        let archive = dest.archive_mut();
        let mut target = TargetPart::load(archive, "ppt/slides/slide1.xml").unwrap();
        let before = target.rels.len();
        remove_element(&mut target, &ElementSelector::name("Logo")).unwrap();
        assert!(ElementSelector::name("Logo").find(&target.doc).is_none());
        assert_eq!(target.rels.len(), before - 2);
        assert!(remove_element(&mut target, &ElementSelector::name("Logo")).is_err());
    }
}

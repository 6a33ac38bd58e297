//! Declarative tree patching.
//!
//! Chart, worksheet and table parts repeat sibling elements in a fixed,
//! schema-defined order (`c:ser`, `c:pt`, `row`, `c`, `a:tr`, `a:tc`). Caller
//! data rarely has the same shape as the template, so the target XML has to
//! be grown or shrunk before it can be filled.
//!
//! A [`PatchSpec`] describes the change as a tree of tag-keyed
//! [`Modifier`]s. [`apply`] interprets it:
//!
//! 1. each tag is resolved to the `index`-th matching descendant of the
//!    current root, in document order;
//! 2. missing elements are materialized by cloning a pristine copy of the
//!    last existing match and inserting it after that match, so authored
//!    formatting carries over;
//! 3. mutations are applied to the resolved element;
//! 4. nested specs recurse with the resolved element as root.
//!
//! Truncation ([`CollectionOp`]) runs after every indexed entry of the same
//! level, so growth and slicing never interleave. Applying the same spec
//! twice yields the same tree.

pub mod chart;
pub mod table;
pub mod worksheet;

use crate::ooxml::error::{MergeError, Result};
use crate::ooxml::xml::{NodeId, XmlDocument};
use std::collections::HashMap;

/// Leaf elements that may be created from nothing when no template exists.
pub const FABRICABLE_LEAVES: &[&str] = &[
    "c:v",
    "c:f",
    "c:ptCount",
    "c:idx",
    "c:order",
    "c:formatCode",
    "a:t",
    "v",
    "t",
];

/// An edit applied to one resolved element.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SetAttribute { name: String, value: String },
    RemoveAttribute(String),
    SetText(String),
    /// Text content formatted as a spreadsheet number
    SetNumber(f64),
    /// Set an attribute to the element's resolved index plus `offset`
    StampIndex { attr: String, offset: u32 },
}

/// Operation on the whole set of matches for a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOp {
    /// Keep the first `n` matches and detach the rest
    Truncate(usize),
}

/// How to find and change the element for one tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Modifier {
    pub index: usize,
    /// Caller-facing name of the data row or column, used in errors
    pub label: Option<String>,
    pub mutations: Vec<Mutation>,
    pub children: PatchSpec,
    pub collection: Option<CollectionOp>,
    /// Markup used as the template when no match exists yet
    pub fallback: Option<String>,
    /// Match direct children only instead of all descendants
    pub direct: bool,
    /// A first element is inserted before the first child with one of these tags
    pub before: Vec<String>,
}

impl Modifier {
    pub fn at(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// A modifier that only truncates the matches of its tag.
    pub fn truncate(len: usize) -> Self {
        Self {
            collection: Some(CollectionOp::Truncate(len)),
            ..Self::default()
        }
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn set_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.mutations.push(Mutation::SetAttribute {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn remove_attr(mut self, name: impl Into<String>) -> Self {
        self.mutations.push(Mutation::RemoveAttribute(name.into()));
        self
    }

    pub fn set_text(mut self, text: impl Into<String>) -> Self {
        self.mutations.push(Mutation::SetText(text.into()));
        self
    }

    pub fn set_number(mut self, value: f64) -> Self {
        self.mutations.push(Mutation::SetNumber(value));
        self
    }

    pub fn stamp_index(self, attr: impl Into<String>) -> Self {
        self.stamp_index_from(attr, 0)
    }

    /// Stamp the index plus `offset` (1-based ids, row numbers).
    pub fn stamp_index_from(mut self, attr: impl Into<String>, offset: u32) -> Self {
        self.mutations.push(Mutation::StampIndex {
            attr: attr.into(),
            offset,
        });
        self
    }

    pub fn child(mut self, tag: impl Into<String>, modifier: Modifier) -> Self {
        self.children.push(tag, modifier);
        self
    }

    pub fn with_fallback(mut self, markup: impl Into<String>) -> Self {
        self.fallback = Some(markup.into());
        self
    }

    pub fn direct(mut self) -> Self {
        self.direct = true;
        self
    }

    /// Keep schema order when the element has to be created from nothing.
    pub fn before(mut self, tags: &[&str]) -> Self {
        self.before.extend(tags.iter().map(|t| t.to_string()));
        self
    }
}

/// Ordered tag-to-modifier entries for one level of the tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchSpec {
    entries: Vec<(String, Modifier)>,
}

impl PatchSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tag: impl Into<String>, modifier: Modifier) -> Self {
        self.push(tag, modifier);
        self
    }

    pub fn push(&mut self, tag: impl Into<String>, modifier: Modifier) {
        self.entries.push((tag.into(), modifier));
    }

    pub fn extend(&mut self, other: PatchSpec) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Apply `spec` below `root`.
pub fn apply(doc: &mut XmlDocument, root: NodeId, spec: &PatchSpec) -> Result<()> {
    Interpreter::new(doc).apply(root, spec)
}

struct Interpreter<'d> {
    doc: &'d mut XmlDocument,
    /// Pristine clone of the first sibling seen per (parent, tag)
    pristine: HashMap<(NodeId, String), NodeId>,
    /// Any pristine clone per tag, for parents that have no match left
    by_tag: HashMap<String, NodeId>,
}

impl<'d> Interpreter<'d> {
    fn new(doc: &'d mut XmlDocument) -> Self {
        Self {
            doc,
            pristine: HashMap::new(),
            by_tag: HashMap::new(),
        }
    }

    fn apply(&mut self, root: NodeId, spec: &PatchSpec) -> Result<()> {
        let (indexed, collections): (Vec<_>, Vec<_>) = spec
            .entries
            .iter()
            .partition(|(_, modifier)| modifier.collection.is_none());

        for (tag, modifier) in indexed {
            let element = self.resolve(root, tag, modifier)?;
            for mutation in &modifier.mutations {
                self.mutate(element, mutation, modifier.index);
            }
            if !modifier.children.is_empty() {
                self.apply(element, &modifier.children)?;
            }
        }

        for (tag, modifier) in collections {
            if let Some(CollectionOp::Truncate(len)) = modifier.collection {
                for extra in self.matches(root, tag, modifier).into_iter().skip(len) {
                    self.doc.detach(extra);
                }
            }
        }
        Ok(())
    }

    fn matches(&self, root: NodeId, tag: &str, modifier: &Modifier) -> Vec<NodeId> {
        if modifier.direct {
            self.doc.children_named(root, tag)
        } else {
            self.doc.descendants_named(root, tag)
        }
    }

    fn resolve(&mut self, root: NodeId, tag: &str, modifier: &Modifier) -> Result<NodeId> {
        let mut matches = self.matches(root, tag, modifier);
        if let Some(found) = matches.get(modifier.index) {
            self.remember(tag, &matches);
            return Ok(*found);
        }

        if matches.is_empty() {
            let first = self.materialize_first(root, tag, modifier)?;
            matches.push(first);
        }
        self.remember(tag, &matches);

        while matches.len() <= modifier.index {
            let last = matches[matches.len() - 1];
            let template = self.template_for(last, tag);
            let clone = self.doc.deep_clone(template);
            self.doc.insert_after(last, clone);
            matches.push(clone);
        }
        Ok(matches[modifier.index])
    }

    /// Keep an untouched copy of the last match before anything mutates it.
    fn remember(&mut self, tag: &str, matches: &[NodeId]) {
        let Some(last) = matches.last() else {
            return;
        };
        let Some(parent) = self.doc.parent(*last) else {
            return;
        };
        let key = (parent, tag.to_string());
        if !self.pristine.contains_key(&key) {
            let copy = self.doc.deep_clone(*last);
            self.pristine.insert(key, copy);
            self.by_tag.entry(tag.to_string()).or_insert(copy);
        }
    }

    fn template_for(&self, last: NodeId, tag: &str) -> NodeId {
        self.doc
            .parent(last)
            .and_then(|parent| self.pristine.get(&(parent, tag.to_string())))
            .copied()
            .unwrap_or(last)
    }

    fn materialize_first(&mut self, root: NodeId, tag: &str, modifier: &Modifier) -> Result<NodeId> {
        let node = if let Some(template) = self.by_tag.get(tag).copied() {
            self.doc.deep_clone(template)
        } else if let Some(markup) = &modifier.fallback {
            let fragment = XmlDocument::parse_str(markup)
                .map_err(|e| MergeError::Xml(format!("fallback for <{}>: {}", tag, e)))?;
            self.doc.import_node(&fragment, fragment.root())
        } else if FABRICABLE_LEAVES.contains(&tag) {
            self.doc.create_element(tag)
        } else {
            return Err(MergeError::SchemaShape {
                tag: tag.to_string(),
                label: modifier
                    .label
                    .clone()
                    .unwrap_or_else(|| format!("#{}", modifier.index)),
            });
        };
        let anchor = self
            .doc
            .element_children(root)
            .find(|c| modifier.before.iter().any(|t| t == self.doc.name(*c)));
        match anchor {
            Some(anchor) => self.doc.insert_before(anchor, node),
            None => self.doc.append_child(root, node),
        }
        Ok(node)
    }

    fn mutate(&mut self, element: NodeId, mutation: &Mutation, index: usize) {
        match mutation {
            Mutation::SetAttribute { name, value } => self.doc.set_attr(element, name, value.as_str()),
            Mutation::RemoveAttribute(name) => {
                self.doc.remove_attr(element, name);
            },
            Mutation::SetText(text) => self.doc.set_text(element, text),
            Mutation::SetNumber(value) => self.doc.set_text(element, &format_number(*value)),
            Mutation::StampIndex { attr, offset } => {
                let mut buf = itoa::Buffer::new();
                let value = index as u64 + u64::from(*offset);
                self.doc.set_attr(element, attr, buf.format(value));
            },
        }
    }
}

/// Format a number the way spreadsheet producers write cell values.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        let mut buf = itoa::Buffer::new();
        buf.format(value as i64).to_string()
    } else {
        let mut buf = ryu::Buffer::new();
        buf.format(value).to_string()
    }
}

/// Parse a cell or cache value written by [`format_number`] or a producer.
pub fn parse_number(text: &str) -> Option<f64> {
    fast_float2::parse(text.trim()).ok()
}

/// Spreadsheet column letters for a 0-based column index (0 -> `A`, 26 -> `AA`).
pub fn column_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;

    loop {
        let remainder = n % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }

    result
}

/// Absolute cell reference, `$B$3` for column 1 and row 3.
pub fn absolute_cell(col: u32, row: u32) -> String {
    format!("${}${}", column_letter(col), row)
}

/// Absolute range between two cells, collapsed when they are equal.
pub fn absolute_range(from: (u32, u32), to: (u32, u32)) -> String {
    if from == to {
        absolute_cell(from.0, from.1)
    } else {
        format!("{}:{}", absolute_cell(from.0, from.1), absolute_cell(to.0, to.1))
    }
}

/// Relative range (`A1:C3`) as used by worksheet dimensions and tables.
pub fn relative_range(from: (u32, u32), to: (u32, u32)) -> String {
    format!("{}{}:{}{}", column_letter(from.0), from.1, column_letter(to.0), to.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERIES: &str = r#"<c:plotArea><c:barChart><c:ser><c:idx val="0"/><c:tx><c:v>old</c:v></c:tx><c:spPr><a:solidFill/></c:spPr></c:ser></c:barChart></c:plotArea>"#;

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(1), "B");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn test_ranges() {
        assert_eq!(absolute_range((1, 2), (1, 4)), "$B$2:$B$4");
        assert_eq!(absolute_range((0, 1), (0, 1)), "$A$1");
        assert_eq!(relative_range((0, 1), (2, 3)), "A1:C3");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(parse_number(" 2.5 "), Some(2.5));
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_growth_clones_template_and_mutates_by_index() {
        let mut doc = XmlDocument::parse_str(SERIES).unwrap();
        let root = doc.root();
        let mut spec = PatchSpec::new();
        for (i, label) in ["a", "b", "c"].iter().enumerate() {
            spec.push(
                "c:ser",
                Modifier::at(i)
                    .child("c:idx", Modifier::at(0).set_attr("val", i.to_string()))
                    .child("c:tx", Modifier::at(0).child("c:v", Modifier::at(0).set_text(*label))),
            );
        }
        apply(&mut doc, root, &spec).unwrap();

        let series = doc.descendants_named(root, "c:ser");
        assert_eq!(series.len(), 3);
        let labels: Vec<String> = series
            .iter()
            .map(|s| doc.text(doc.find_first(*s, "c:v").unwrap()))
            .collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
        for s in &series {
            assert!(doc.find_first(*s, "a:solidFill").is_some());
        }
    }

    #[test]
    fn test_truncate_after_fill() {
        let xml = r#"<r><p>1</p><p>2</p><p>3</p><p>4</p></r>"#;
        let mut doc = XmlDocument::parse_str(xml).unwrap();
        let root = doc.root();
        let spec = PatchSpec::new()
            .with("p", Modifier::truncate(2))
            .with("p", Modifier::at(0).set_text("x"));
        apply(&mut doc, root, &spec).unwrap();
        assert_eq!(doc.node_to_string(root), "<r><p>x</p><p>2</p></r>");
    }

    #[test]
    fn test_missing_template_is_schema_shape_error() {
        let mut doc = XmlDocument::parse_str("<a:tbl/>").unwrap();
        let root = doc.root();
        let spec = PatchSpec::new().with("a:tr", Modifier::at(0).labeled("Row 1"));
        match apply(&mut doc, root, &spec) {
            Err(MergeError::SchemaShape { tag, label }) => {
                assert_eq!(tag, "a:tr");
                assert_eq!(label, "Row 1");
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_whitelisted_leaf_and_fallback() {
        let mut doc = XmlDocument::parse_str("<c><a:p/></c>").unwrap();
        let root = doc.root();
        let spec = PatchSpec::new()
            .with("v", Modifier::at(0).set_number(7.0))
            .with(
                "a:r",
                Modifier::at(0)
                    .with_fallback("<a:r><a:t/></a:r>")
                    .child("a:t", Modifier::at(0).set_text("hi")),
            );
        apply(&mut doc, root, &spec).unwrap();
        assert_eq!(doc.node_to_string(root), "<c><a:p/><v>7</v><a:r><a:t>hi</a:t></a:r></c>");
    }

    #[test]
    fn test_reapply_is_identical() {
        let mut doc = XmlDocument::parse_str(SERIES).unwrap();
        let root = doc.root();
        let spec = PatchSpec::new()
            .with("c:ser", Modifier::at(2).child("c:idx", Modifier::at(0).stamp_index("val")))
            .with("c:ser", Modifier::truncate(3));
        apply(&mut doc, root, &spec).unwrap();
        let once = doc.to_xml_string();
        apply(&mut doc, root, &spec).unwrap();
        assert_eq!(once, doc.to_xml_string());
    }

    /// Growing to K siblings from one template yields K structurally equal
    /// siblings, each carrying only its own mutation.
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn prop_growth_yields_k_siblings(k in 1usize..24) {
                let mut doc = XmlDocument::parse_str(
                    r#"<c:numCache><c:ptCount val="1"/><c:pt idx="0"><c:v>9</c:v></c:pt></c:numCache>"#,
                ).unwrap();
                let root = doc.root();
                let mut spec = PatchSpec::new();
                for i in 0..k {
                    spec.push(
                        "c:pt",
                        Modifier::at(i)
                            .stamp_index("idx")
                            .child("c:v", Modifier::at(0).set_number(i as f64)),
                    );
                }
                apply(&mut doc, root, &spec).unwrap();

                let points = doc.descendants_named(root, "c:pt");
                prop_assert_eq!(points.len(), k);
                for (i, pt) in points.iter().enumerate() {
                    let expected = i.to_string();
                    prop_assert_eq!(doc.attr(*pt, "idx"), Some(expected.as_str()));
                    let v = doc.first_child_named(*pt, "c:v").unwrap();
                    prop_assert_eq!(doc.text(v), format_number(i as f64));
                    prop_assert_eq!(doc.element_children(*pt).count(), 1);
                }
            }
        }
    }
}

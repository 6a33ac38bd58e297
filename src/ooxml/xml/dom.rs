//! Arena-backed XML tree.
//!
//! Every node of a document lives in one `Vec`, addressed by [`NodeId`].
//! Parent and child links are indices into that vector, so a subtree can be
//! detached, re-attached or cloned without touching any other node. Nodes
//! that are detached simply stay in the arena until the document is dropped.
//!
//! Cross-document copies go through [`XmlDocument::import_node`], which reads
//! the source document through a shared borrow and allocates fresh nodes in
//! the destination arena. No node id is ever valid in two documents.

use crate::ooxml::opc::error::{OpcError, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;
use std::borrow::Cow;

/// Index of a node inside one [`XmlDocument`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single `name="value"` pair on an element, stored unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element {
        name: String,
        attrs: SmallVec<[Attribute; 4]>,
    },
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An XML document held as an arena of nodes.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<Node>,
    declaration: Option<String>,
}

const DOCUMENT: NodeId = NodeId(0);

/// Standard declaration written by Office producers.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

impl XmlDocument {
    /// Create a document containing a single empty root element.
    pub fn new(root_name: &str) -> Self {
        let mut doc = Self::empty();
        doc.declaration = Some(XML_DECLARATION.to_string());
        let root = doc.create_element(root_name);
        doc.append_child(DOCUMENT, root);
        doc
    }

    fn empty() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            declaration: None,
        }
    }

    /// Parse a document from raw bytes.
    ///
    /// Whitespace-only text is preserved so that serializing an untouched
    /// document reproduces its structure.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(false);

        let mut doc = Self::empty();
        let mut stack: Vec<NodeId> = vec![DOCUMENT];
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf)?;
            let parent = *stack.last().unwrap_or(&DOCUMENT);
            match event {
                Event::Decl(decl) => {
                    let raw = std::str::from_utf8(&decl)?;
                    doc.declaration = Some(format!("<?{}?>", raw.trim()));
                },
                Event::Start(ref e) => {
                    let id = doc.element_from_start(e)?;
                    doc.append_child(parent, id);
                    stack.push(id);
                },
                Event::Empty(ref e) => {
                    let id = doc.element_from_start(e)?;
                    doc.append_child(parent, id);
                },
                Event::End(_) => {
                    if stack.len() > 1 {
                        stack.pop();
                    }
                },
                Event::Text(ref t) => {
                    // Text outside the root element is insignificant
                    if parent != DOCUMENT {
                        let raw = t.decode()?;
                        let value = if raw.contains('&') {
                            quick_xml::escape::unescape(&raw)?.into_owned()
                        } else {
                            raw.into_owned()
                        };
                        doc.push_text(parent, &value);
                    }
                },
                Event::GeneralRef(ref r) => {
                    let name = r.decode()?;
                    let resolved = resolve_entity(&name).ok_or_else(|| {
                        OpcError::XmlError(format!("Unknown entity reference &{};", name))
                    })?;
                    doc.push_text(parent, &resolved);
                },
                Event::CData(ref c) => {
                    let value = String::from_utf8_lossy(c).into_owned();
                    let id = doc.alloc(NodeKind::CData(value));
                    doc.append_child(parent, id);
                },
                Event::Comment(ref c) => {
                    let value = String::from_utf8_lossy(c).into_owned();
                    let id = doc.alloc(NodeKind::Comment(value));
                    doc.append_child(parent, id);
                },
                Event::PI(ref p) => {
                    let value = String::from_utf8_lossy(p).into_owned();
                    let id = doc.alloc(NodeKind::ProcessingInstruction(value));
                    doc.append_child(parent, id);
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        if !doc.nodes[DOCUMENT.index()]
            .children
            .iter()
            .any(|c| doc.is_element(*c))
        {
            return Err(OpcError::XmlError("Document has no root element".to_string()));
        }

        Ok(doc)
    }

    /// Parse a document from a string slice.
    #[inline]
    pub fn parse_str(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    fn element_from_start(&mut self, e: &BytesStart<'_>) -> Result<NodeId> {
        let name = std::str::from_utf8(e.name().as_ref())?.to_string();
        let mut attrs = SmallVec::new();
        for attr in e.attributes() {
            let attr = attr?;
            attrs.push(Attribute {
                name: std::str::from_utf8(attr.key.as_ref())?.to_string(),
                value: attr.unescape_value()?.into_owned(),
            });
        }
        Ok(self.alloc(NodeKind::Element { name, attrs }))
    }

    /// Append text to `parent`, merging with a trailing text node so that
    /// entity references do not split one logical string in two.
    fn push_text(&mut self, parent: NodeId, value: &str) {
        if let Some(&last) = self.nodes[parent.index()].children.last()
            && let NodeKind::Text(existing) = &mut self.nodes[last.index()].kind
        {
            existing.push_str(value);
            return;
        }
        let id = self.alloc(NodeKind::Text(value.to_string()));
        self.append_child(parent, id);
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// The document (root) element.
    pub fn root(&self) -> NodeId {
        self.nodes[DOCUMENT.index()]
            .children
            .iter()
            .copied()
            .find(|c| self.is_element(*c))
            .unwrap_or(DOCUMENT)
    }

    #[inline]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.index()].kind, NodeKind::Element { .. })
    }

    /// Qualified tag name (`p:sp`), or an empty string for non-elements.
    pub fn name(&self, id: NodeId) -> &str {
        match &self.nodes[id.index()].kind {
            NodeKind::Element { name, .. } => name,
            _ => "",
        }
    }

    /// Tag name without its namespace prefix.
    pub fn local_name(&self, id: NodeId) -> &str {
        let name = self.name(id);
        name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
    }

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        match &self.nodes[id.index()].kind {
            NodeKind::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id.index()].kind {
            let value = value.into();
            match attrs.iter_mut().find(|a| a.name == name) {
                Some(existing) => existing.value = value,
                None => attrs.push(Attribute {
                    name: name.to_string(),
                    value,
                }),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id.index()].kind
            && let Some(pos) = attrs.iter().position(|a| a.name == name)
        {
            return Some(attrs.remove(pos).value);
        }
        None
    }

    /// Parent element, or `None` for the root and detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent.filter(|p| *p != DOCUMENT)
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(|c| self.is_element(*c))
    }

    /// Direct children with the given qualified name.
    pub fn children_named(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.element_children(id)
            .filter(|c| self.name(*c) == tag)
            .collect()
    }

    pub fn first_child_named(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.element_children(id).find(|c| self.name(*c) == tag)
    }

    /// All descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Descendant elements with the given qualified name, in document order.
    pub fn descendants_named(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| self.name(*n) == tag)
            .collect()
    }

    /// First descendant element with the given qualified name.
    pub fn find_first(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.name(node) == tag {
                return Some(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        None
    }

    /// Follow a path of direct-child tag names, taking the first match at each step.
    pub fn find_path(&self, id: NodeId, path: &[&str]) -> Option<NodeId> {
        path.iter()
            .try_fold(id, |node, tag| self.first_child_named(node, tag))
    }

    /// Concatenated text content of the node and its descendants.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.index()].kind {
            NodeKind::Text(t) | NodeKind::CData(t) => out.push_str(t),
            NodeKind::Element { .. } | NodeKind::Document => {
                for child in self.children(id) {
                    self.collect_text(*child, out);
                }
            },
            _ => {},
        }
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        for child in std::mem::take(&mut self.nodes[id.index()].children) {
            self.nodes[child.index()].parent = None;
        }
        let text_id = self.alloc(NodeKind::Text(text.to_string()));
        self.append_child(id, text_id);
    }

    /// Allocate a new, detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            name: name.to_string(),
            attrs: SmallVec::new(),
        })
    }

    /// Allocate a detached element with attributes.
    pub fn create_element_with(&mut self, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.create_element(name);
        for (key, value) in attrs {
            self.set_attr(id, key, *value);
        }
        id
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Insert `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.insert(0, child);
    }

    /// Insert `node` directly after `anchor` under the same parent.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        self.insert_relative(anchor, node, 1);
    }

    /// Insert `node` directly before `anchor` under the same parent.
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) {
        self.insert_relative(anchor, node, 0);
    }

    fn insert_relative(&mut self, anchor: NodeId, node: NodeId, offset: usize) {
        self.detach(node);
        let Some(parent) = self.nodes[anchor.index()].parent else {
            return;
        };
        let siblings = &mut self.nodes[parent.index()].children;
        let pos = siblings
            .iter()
            .position(|c| *c == anchor)
            .map(|p| p + offset)
            .unwrap_or(siblings.len());
        siblings.insert(pos, node);
        self.nodes[node.index()].parent = Some(parent);
    }

    /// Remove `id` from its parent. The node and its subtree stay usable.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|c| *c != id);
        }
    }

    /// Put `new` where `old` is and detach `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        self.insert_before(old, new);
        self.detach(old);
    }

    /// Whether the node is reachable from the document root.
    pub fn is_attached(&self, mut id: NodeId) -> bool {
        loop {
            if id == DOCUMENT {
                return true;
            }
            match self.nodes[id.index()].parent {
                Some(p) => id = p,
                None => return false,
            }
        }
    }

    /// Clone a subtree inside this arena. The clone is detached.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let kind = self.nodes[id.index()].kind.clone();
        let clone = self.alloc(kind);
        let children = self.nodes[id.index()].children.clone();
        for child in children {
            let child_clone = self.deep_clone(child);
            self.nodes[child_clone.index()].parent = Some(clone);
            self.nodes[clone.index()].children.push(child_clone);
        }
        clone
    }

    /// Copy a subtree out of another document into this arena.
    ///
    /// The source is only borrowed; the returned node is detached and owned
    /// exclusively by `self`.
    pub fn import_node(&mut self, source: &XmlDocument, id: NodeId) -> NodeId {
        let kind = source.nodes[id.index()].kind.clone();
        let copy = self.alloc(kind);
        for child in source.children(id) {
            let child_copy = self.import_node(source, *child);
            self.nodes[child_copy.index()].parent = Some(copy);
            self.nodes[copy.index()].children.push(child_copy);
        }
        copy
    }

    /// Serialize the whole document.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::with_capacity(self.nodes.len() * 32);
        if let Some(decl) = &self.declaration {
            out.push_str(decl);
            out.push_str("\r\n");
        }
        for child in self.children(DOCUMENT) {
            self.write_node(*child, &mut out);
        }
        out
    }

    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_xml_string().into_bytes()
    }

    /// Serialize one subtree without a declaration.
    pub fn node_to_string(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.index()];
        match &node.kind {
            NodeKind::Document => {
                for child in &node.children {
                    self.write_node(*child, out);
                }
            },
            NodeKind::Element { name, attrs } => {
                out.push('<');
                out.push_str(name);
                for attr in attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    out.push_str(&quick_xml::escape::escape(attr.value.as_str()));
                    out.push('"');
                }
                if node.children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for child in &node.children {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            },
            NodeKind::Text(t) => out.push_str(&quick_xml::escape::partial_escape(t.as_str())),
            NodeKind::CData(t) => {
                out.push_str("<![CDATA[");
                out.push_str(t);
                out.push_str("]]>");
            },
            NodeKind::Comment(t) => {
                out.push_str("<!--");
                out.push_str(t);
                out.push_str("-->");
            },
            NodeKind::ProcessingInstruction(t) => {
                out.push_str("<?");
                out.push_str(t);
                out.push_str("?>");
            },
        }
    }
}

fn resolve_entity(name: &str) -> Option<Cow<'static, str>> {
    let predefined = match name {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        _ => None,
    };
    if let Some(s) = predefined {
        return Some(Cow::Borrowed(s));
    }
    let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        name.strip_prefix('#')?.parse::<u32>().ok()?
    };
    char::from_u32(code).map(|c| Cow::Owned(c.to_string()))
}

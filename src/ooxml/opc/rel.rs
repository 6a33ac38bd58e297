//! Relationship parts (`_rels/*.rels`).
//!
//! A [`Relationships`] value is the parsed relationships part of one source
//! part. It answers "which targets does this part point at" by type or by
//! target-path prefix, allocates fresh `rId<n>` identifiers and appends new
//! entries.
//!
//! Producers disagree on how they spell targets. The deviations we accept are
//! listed in [`COMPATIBILITY_RULES`] and applied in a fixed order by
//! [`Relationships::targets_by_prefix`] and [`Relationships::targets_by_type`].

use crate::ooxml::opc::constants::{namespace, relationship_type, target_mode};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PackURI, file_stem, trailing_number};
use crate::ooxml::opc::phys_pkg::Archive;
use crate::ooxml::xml::{NodeId, XmlDocument};
use smallvec::SmallVec;

/// A deviation from canonical relationship spelling that we tolerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityRule {
    /// Relationships whose type URI ends in this segment match every query.
    /// Embedded workbooks are linked with the `package` type and carry
    /// producer-chosen file names, so they cannot be found by prefix.
    TypeAlwaysMatches(&'static str),
    /// When a relative prefix finds nothing, retry with the absolute form.
    /// Some producers write `/ppt/charts/chart1.xml` instead of
    /// `../charts/chart1.xml`.
    RetryAbsolute {
        relative: &'static str,
        absolute: &'static str,
    },
}

/// Rules applied by every target query, in order.
pub const COMPATIBILITY_RULES: &[CompatibilityRule] = &[
    CompatibilityRule::TypeAlwaysMatches("package"),
    CompatibilityRule::RetryAbsolute {
        relative: "../",
        absolute: "/ppt/",
    },
];

/// Finer classification of a target, derived from its type and extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetSubtype {
    Chart,
    ChartEx,
    Image,
    Svg,
    Audio,
    Video,
    Media,
    Package,
    OleObject,
    Hyperlink,
    Other,
}

impl TargetSubtype {
    fn classify(rel_type: &str, file: &str) -> Self {
        let ext = file.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
        match rel_type {
            relationship_type::CHART => TargetSubtype::Chart,
            relationship_type::CHART_EX => TargetSubtype::ChartEx,
            relationship_type::IMAGE if ext == "svg" => TargetSubtype::Svg,
            relationship_type::IMAGE => TargetSubtype::Image,
            relationship_type::AUDIO => TargetSubtype::Audio,
            relationship_type::VIDEO => TargetSubtype::Video,
            relationship_type::MEDIA => TargetSubtype::Media,
            relationship_type::PACKAGE => TargetSubtype::Package,
            relationship_type::OLE_OBJECT => TargetSubtype::OleObject,
            relationship_type::HYPERLINK => TargetSubtype::Hyperlink,
            _ => TargetSubtype::Other,
        }
    }
}

/// One parsed `Relationship` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// `Id` attribute (`rId4`)
    pub r_id: String,
    /// `Type` URI
    pub rel_type: String,
    /// Raw `Target` attribute (`../charts/chart3.xml`)
    pub file: String,
    /// Last path segment (`chart3.xml`)
    pub filename: String,
    /// Filename stem without its numeric suffix (`chart`, `chartEx`)
    pub file_base: String,
    /// Numeric suffix of the filename stem
    pub number: Option<u32>,
    pub subtype: TargetSubtype,
    pub is_external: bool,
    /// The `Relationship` element inside the owning relationships document
    pub element: NodeId,
}

impl Target {
    fn from_element(doc: &XmlDocument, element: NodeId) -> Option<Self> {
        let r_id = doc.attr(element, "Id")?.to_string();
        let rel_type = doc.attr(element, "Type").unwrap_or_default().to_string();
        let file = doc.attr(element, "Target").unwrap_or_default().to_string();
        let is_external = doc.attr(element, "TargetMode") == Some(target_mode::EXTERNAL);
        let filename = file.rsplit('/').next().unwrap_or_default().to_string();
        let stem = file_stem(&filename);
        let file_base = stem
            .trim_end_matches(|c: char| c.is_ascii_digit())
            .to_string();
        let number = trailing_number(stem);
        let subtype = TargetSubtype::classify(&rel_type, &file);

        Some(Self {
            r_id,
            rel_type,
            file,
            filename,
            file_base,
            number,
            subtype,
            is_external,
            element,
        })
    }

    /// Absolute part name of an internal target, resolved against the
    /// directory of the part that owns the relationship.
    pub fn part_uri(&self, source_base: &str) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(format!(
                "{} points outside the package",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(source_base, &self.file).map_err(OpcError::InvalidPackUri)
    }

    /// File extension of the target, lowercased.
    pub fn extension(&self) -> String {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// Identity of a relationship for de-duplication purposes.
    pub fn triple(&self) -> (String, String, bool) {
        (self.rel_type.clone(), self.file.clone(), self.is_external)
    }
}

/// A relationship id handed out by [`Relationships::next_relationship_id`].
///
/// Kept distinct from plain source ids so a freshly allocated id can never
/// be mistaken for one that still needs rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NewRelId(String);

impl NewRelId {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn number(&self) -> u32 {
        parse_rid(&self.0).unwrap_or_default()
    }
}

impl std::fmt::Display for NewRelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attributes of a relationship to create.
#[derive(Debug, Clone)]
pub struct RelationshipAttrs<'a> {
    pub id: &'a NewRelId,
    pub rel_type: &'a str,
    pub target: &'a str,
    pub external: bool,
}

fn parse_rid(r_id: &str) -> Option<u32> {
    let digits = r_id.strip_prefix("rId")?;
    atoi_simd::parse::<u32, false, false>(digits.as_bytes()).ok()
}

/// Parsed relationships part of one source part.
#[derive(Debug, Clone)]
pub struct Relationships {
    /// Member name of the `.rels` part
    path: String,
    /// Directory of the source part, used to resolve relative targets
    base_uri: String,
    doc: XmlDocument,
}

impl Relationships {
    /// Empty relationships part for `source_part`.
    pub fn new(source_part: &str) -> Self {
        let source = PackURI::from_member(source_part);
        let mut doc = XmlDocument::new("Relationships");
        let root = doc.root();
        doc.set_attr(root, "xmlns", namespace::OPC_RELATIONSHIPS);
        Self {
            path: source.rels_uri().membername().to_string(),
            base_uri: source.base_uri().to_string(),
            doc,
        }
    }

    /// Load the relationships of `source_part`, or an empty set if the part
    /// has none.
    pub fn load(archive: &dyn Archive, source_part: &str) -> Result<Self> {
        let mut rels = Self::new(source_part);
        if archive.file_exists(&rels.path) {
            rels.doc = archive.read_xml(&rels.path)?;
        }
        Ok(rels)
    }

    /// Load relationships that must exist.
    pub fn load_required(archive: &dyn Archive, source_part: &str) -> Result<Self> {
        let rels = Self::new(source_part);
        if !archive.file_exists(&rels.path) {
            return Err(OpcError::PartNotFound(format!(
                "{}:{}",
                archive.label(),
                rels.path
            )));
        }
        Self::load(archive, source_part)
    }

    pub fn store(&self, archive: &mut dyn Archive) {
        archive.write_xml(&self.path, &self.doc);
    }

    /// Member name of the `.rels` part.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    #[inline]
    pub fn document(&self) -> &XmlDocument {
        &self.doc
    }

    #[inline]
    pub fn document_mut(&mut self) -> &mut XmlDocument {
        &mut self.doc
    }

    fn elements(&self) -> Vec<NodeId> {
        self.doc.children_named(self.doc.root(), "Relationship")
    }

    /// Every relationship in document order.
    pub fn all(&self) -> Vec<Target> {
        self.elements()
            .into_iter()
            .filter_map(|e| Target::from_element(&self.doc, e))
            .collect()
    }

    /// Relationship with the given id.
    pub fn get(&self, r_id: &str) -> Option<Target> {
        self.elements()
            .into_iter()
            .find(|e| self.doc.attr(*e, "Id") == Some(r_id))
            .and_then(|e| Target::from_element(&self.doc, e))
    }

    /// Relationship with the given id, or a not-found error.
    pub fn require(&self, r_id: &str) -> Result<Target> {
        self.get(r_id).ok_or_else(|| {
            OpcError::RelationshipNotFound(format!("{} in {}", r_id, self.path))
        })
    }

    fn always_matches(target: &Target) -> bool {
        COMPATIBILITY_RULES.iter().any(|rule| match rule {
            CompatibilityRule::TypeAlwaysMatches(segment) => {
                target.rel_type.rsplit('/').next() == Some(*segment)
            },
            CompatibilityRule::RetryAbsolute { .. } => false,
        })
    }

    /// Relationships whose target starts with one of `prefixes`
    /// (`../charts/chart`), plus those matched unconditionally by the
    /// compatibility rules.
    pub fn targets_by_prefix(&self, prefixes: &[&str]) -> Vec<Target> {
        let all = self.all();
        let by_prefix = |prefixes: &[String]| -> Vec<Target> {
            all.iter()
                .filter(|t| prefixes.iter().any(|p| t.file.starts_with(p.as_str())))
                .cloned()
                .collect()
        };

        let mut candidates: SmallVec<[String; 4]> =
            prefixes.iter().map(|p| p.to_string()).collect();
        let mut matched = by_prefix(&candidates);

        for rule in COMPATIBILITY_RULES {
            if let CompatibilityRule::RetryAbsolute { relative, absolute } = rule
                && matched.is_empty()
            {
                candidates = prefixes
                    .iter()
                    .filter_map(|p| p.strip_prefix(relative))
                    .map(|rest| format!("{}{}", absolute, rest))
                    .collect();
                matched = by_prefix(&candidates);
            }
        }

        self.with_always_matching(matched, &all)
    }

    /// Relationships of the given type. `type_uri` is either a full URI or
    /// its last segment (`chart`, `image`).
    pub fn targets_by_type(&self, type_uri: &str) -> Vec<Target> {
        let all = self.all();
        let matched = all
            .iter()
            .filter(|t| {
                t.rel_type == type_uri || t.rel_type.rsplit('/').next() == Some(type_uri)
            })
            .cloned()
            .collect();
        self.with_always_matching(matched, &all)
    }

    fn with_always_matching(&self, mut matched: Vec<Target>, all: &[Target]) -> Vec<Target> {
        for target in all.iter().filter(|t| Self::always_matches(t)) {
            if !matched.iter().any(|m| m.r_id == target.r_id) {
                matched.push(target.clone());
            }
        }
        matched.sort_by_key(|t| self.elements().iter().position(|e| *e == t.element));
        matched
    }

    /// `max(existing numeric ids) + 1`, as `rId<n>`.
    pub fn next_relationship_id(&self) -> NewRelId {
        let max = self
            .elements()
            .into_iter()
            .filter_map(|e| self.doc.attr(e, "Id").and_then(parse_rid))
            .max()
            .unwrap_or(0);
        NewRelId(format!("rId{}", max + 1))
    }

    /// Append a relationship entry.
    pub fn create_relationship(&mut self, attrs: &RelationshipAttrs<'_>) -> NodeId {
        let root = self.doc.root();
        let node = self.doc.create_element_with(
            "Relationship",
            &[
                ("Id", attrs.id.as_str()),
                ("Type", attrs.rel_type),
                ("Target", attrs.target),
            ],
        );
        if attrs.external {
            self.doc.set_attr(node, "TargetMode", target_mode::EXTERNAL);
        }
        self.doc.append_child(root, node);
        node
    }

    /// Allocate an id and append a relationship in one step.
    pub fn add(&mut self, rel_type: &str, target: &str, external: bool) -> NewRelId {
        let id = self.next_relationship_id();
        self.create_relationship(&RelationshipAttrs {
            id: &id,
            rel_type,
            target,
            external,
        });
        id
    }

    /// Append a relationship that keeps an id taken from another part.
    ///
    /// Used when a whole part is copied and the ids referenced from its XML
    /// must stay valid.
    pub fn insert_with_id(&mut self, r_id: &str, rel_type: &str, target: &str, external: bool) {
        let id = NewRelId(r_id.to_string());
        self.create_relationship(&RelationshipAttrs {
            id: &id,
            rel_type,
            target,
            external,
        });
    }

    /// Point an existing relationship at a new target.
    pub fn set_target(&mut self, r_id: &str, target: &str) -> Result<()> {
        let element = self.require(r_id)?.element;
        self.doc.set_attr(element, "Target", target);
        Ok(())
    }

    pub fn remove(&mut self, r_id: &str) -> Option<Target> {
        let target = self.get(r_id)?;
        self.doc.detach(target.element);
        Some(target)
    }

    pub fn len(&self) -> usize {
        self.elements().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements().is_empty()
    }
}

//! Table data projection for `a:tbl` graphic frames.
//!
//! The first row of [`TableData`] fixes the grid width. Rows and cells the
//! template lacks are cloned from its last row and cell; surplus rows,
//! cells and grid columns are removed afterwards. A cell without text keeps
//! whatever the template shows.
//!
//! A row or column carrying a repeat marker is used as the template for
//! growth instead of the last one ([`expand_rows`], [`expand_columns`]).
//! Columns covered by a horizontal merge grow the owning cell's `gridSpan`
//! rather than the number of cells.
use crate::ooxml::error::{MergeError, Result};
use crate::ooxml::pptx::patch::{Modifier, PatchSpec, apply};
use crate::ooxml::xml::{NodeId, XmlDocument};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::debug;

bitflags! {
    /// Sides of a cell that get a border line.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BorderSides: u8 {
        const LEFT = 0b0001;
        const RIGHT = 0b0010;
        const TOP = 0b0100;
        const BOTTOM = 0b1000;
        const ALL = Self::LEFT.bits() | Self::RIGHT.bits() | Self::TOP.bits() | Self::BOTTOM.bits();
    }
}

impl Default for BorderSides {
    fn default() -> Self {
        BorderSides::empty()
    }
}

/// Line drawn on the selected sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Border {
    #[serde(default)]
    pub sides: BorderSides,
    /// Line width in EMU
    #[serde(default = "Border::default_width")]
    pub width: u32,
    /// `RRGGBB`
    pub color: String,
}

impl Border {
    fn default_width() -> u32 {
        12700
    }

    pub fn new(sides: BorderSides, color: impl Into<String>) -> Self {
        Self {
            sides,
            width: Self::default_width(),
            color: color.into(),
        }
    }

    #[inline]
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// Hundredths of a point (`1800` is 18pt)
    pub size: Option<u32>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellStyle {
    pub border: Option<Border>,
    /// Solid background `RRGGBB`
    pub fill: Option<String>,
    pub text: Option<TextStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableCell {
    /// New text; `None` keeps the current text
    pub text: Option<String>,
    pub style: Option<CellStyle>,
}

impl TableCell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            style: None,
        }
    }

    /// A cell that keeps its text.
    pub fn keep() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_style(mut self, style: CellStyle) -> Self {
        self.style = Some(style);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableRow {
    /// Used in error messages
    pub label: Option<String>,
    pub values: Vec<TableCell>,
}

impl TableRow {
    pub fn new(values: Vec<TableCell>) -> Self {
        Self { label: None, values }
    }

    pub fn texts<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(values.into_iter().map(TableCell::text).collect())
    }

    #[inline]
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableData {
    pub rows: Vec<TableRow>,
    /// Text marking the row and column to repeat when the table grows
    pub repeat_marker: Option<String>,
}

const RUN_FALLBACK: &str = r#"<a:r><a:rPr lang="en-US" dirty="0"/><a:t/></a:r>"#;
const TX_BODY_FALLBACK: &str = r#"<a:txBody><a:bodyPr/><a:lstStyle/><a:p/></a:txBody>"#;
const FILL_FALLBACK: &str = r#"<a:solidFill><a:srgbClr val="000000"/></a:solidFill>"#;
const TC_PR_TAIL: &[&str] = &["a:cell3D", "a:headers", "a:extLst"];
const TC_PR_FILLS: &[&str] = &["a:noFill", "a:solidFill", "a:gradFill", "a:blipFill", "a:pattFill", "a:grpFill"];

impl TableData {
    pub fn new(rows: Vec<TableRow>) -> Self {
        Self {
            rows,
            repeat_marker: None,
        }
    }

    #[inline]
    pub fn with_repeat_marker(mut self, marker: impl Into<String>) -> Self {
        self.repeat_marker = Some(marker.into());
        self
    }

    /// Number of grid columns, taken from the first row.
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, |r| r.values.len())
    }

    /// Write the data into the first `a:tbl` below `root`.
    pub fn apply_to(&self, doc: &mut XmlDocument, root: NodeId) -> Result<()> {
        let tbl = if doc.name(root) == "a:tbl" {
            root
        } else {
            doc.find_first(root, "a:tbl")
                .ok_or_else(|| MergeError::not_found("a:tbl in graphic frame"))?
        };

        if let Some(marker) = &self.repeat_marker {
            self.expand_at_marker(doc, tbl, marker)?;
        }

        let width = self.width();
        let mut spec = PatchSpec::new();
        let mut grid = Modifier::at(0).direct();
        for j in 0..width {
            grid = grid.child("a:gridCol", Modifier::at(j).direct().labeled(format!("column {}", j + 1)));
        }
        grid = grid.child("a:gridCol", Modifier::truncate(width).direct());
        spec.push("a:tblGrid", grid);

        for (i, row) in self.rows.iter().enumerate() {
            let label = row.label.clone().unwrap_or_else(|| format!("row {}", i + 1));
            let mut tr = Modifier::at(i).direct().labeled(label.as_str());
            for j in 0..width {
                let cell = row.values.get(j).cloned().unwrap_or_default();
                tr = tr.child("a:tc", cell_modifier(j, &cell, &label));
            }
            tr = tr.child("a:tc", Modifier::truncate(width).direct());
            spec.push("a:tr", tr);
        }
        spec.push("a:tr", Modifier::truncate(self.rows.len()).direct());

        apply(doc, tbl, &spec)?;
        debug!(rows = self.rows.len(), columns = width, "table data applied");
        Ok(())
    }

    fn expand_at_marker(&self, doc: &mut XmlDocument, tbl: NodeId, marker: &str) -> Result<()> {
        let current_rows = doc.children_named(tbl, "a:tr").len();
        if let Some(at) = find_marker_row(doc, tbl, marker)
            && self.rows.len() > current_rows
        {
            expand_rows(doc, tbl, at, self.rows.len() - current_rows)?;
        }

        let current_cols = grid_columns(doc, tbl).len();
        if let Some(at) = find_marker_column(doc, tbl, marker)
            && self.width() > current_cols
        {
            expand_columns(doc, tbl, at, self.width() - current_cols)?;
        }
        strip_marker(doc, tbl, marker);
        Ok(())
    }
}

fn cell_modifier(index: usize, cell: &TableCell, row_label: &str) -> Modifier {
    let mut tc = Modifier::at(index)
        .direct()
        .labeled(format!("{} cell {}", row_label, index + 1));

    if let Some(text) = &cell.text {
        let mut run = Modifier::at(0)
            .direct()
            .with_fallback(RUN_FALLBACK)
            .before(&["a:fld", "a:endParaRPr"])
            .child("a:t", Modifier::at(0).direct().set_text(text.as_str()));
        if let Some(style) = cell.style.as_ref().and_then(|s| s.text.as_ref()) {
            run = run.child("a:rPr", text_style_modifier(style));
        }
        let paragraph = Modifier::at(0)
            .direct()
            .child("a:r", run)
            .child("a:r", Modifier::truncate(1).direct())
            .child("a:fld", Modifier::truncate(0).direct())
            .child("a:br", Modifier::truncate(0).direct());
        let body = Modifier::at(0)
            .direct()
            .with_fallback(TX_BODY_FALLBACK)
            .before(&["a:tcPr", "a:extLst"])
            .child("a:p", paragraph)
            .child("a:p", Modifier::truncate(1).direct());
        tc = tc.child("a:txBody", body);
    } else if let Some(style) = cell.style.as_ref().and_then(|s| s.text.as_ref()) {
        // Style every existing run without touching the text
        tc = tc.child(
            "a:txBody",
            Modifier::at(0).direct().child(
                "a:p",
                Modifier::at(0)
                    .direct()
                    .child("a:r", Modifier::at(0).direct().child("a:rPr", text_style_modifier(style))),
            ),
        );
    }

    if let Some(style) = &cell.style
        && (style.border.is_some() || style.fill.is_some())
    {
        tc = tc.child("a:tcPr", cell_properties_modifier(style));
    }
    tc
}

fn text_style_modifier(style: &TextStyle) -> Modifier {
    let mut rpr = Modifier::at(0)
        .direct()
        .with_fallback(r#"<a:rPr lang="en-US" dirty="0"/>"#)
        .before(&["a:t"]);
    if let Some(bold) = style.bold {
        rpr = rpr.set_attr("b", if bold { "1" } else { "0" });
    }
    if let Some(italic) = style.italic {
        rpr = rpr.set_attr("i", if italic { "1" } else { "0" });
    }
    if let Some(size) = style.size {
        rpr = rpr.set_attr("sz", size.to_string());
    }
    if let Some(color) = &style.color {
        rpr = rpr.child(
            "a:solidFill",
            Modifier::at(0)
                .direct()
                .with_fallback(FILL_FALLBACK)
                .before(&["a:effectLst", "a:highlight", "a:latin", "a:ea", "a:cs", "a:sym", "a:hlinkClick"])
                .child("a:srgbClr", Modifier::at(0).set_attr("val", color.as_str())),
        );
    }
    rpr
}

/// Border lines in schema order, with the tags each must precede.
const BORDER_LINES: [(BorderSides, &str, &[&str]); 4] = [
    (BorderSides::LEFT, "a:lnL", &["a:lnR", "a:lnT", "a:lnB"]),
    (BorderSides::RIGHT, "a:lnR", &["a:lnT", "a:lnB"]),
    (BorderSides::TOP, "a:lnT", &["a:lnB"]),
    (BorderSides::BOTTOM, "a:lnB", &[]),
];

fn cell_properties_modifier(style: &CellStyle) -> Modifier {
    let mut tc_pr = Modifier::at(0).direct().with_fallback("<a:tcPr/>").before(&["a:extLst"]);

    if let Some(border) = &style.border {
        for (side, tag, later) in BORDER_LINES {
            if !border.sides.contains(side) {
                continue;
            }
            let mut before: Vec<&str> = later.to_vec();
            before.extend(["a:lnTlToBr", "a:lnBlToTr"]);
            before.extend(TC_PR_FILLS);
            before.extend(TC_PR_TAIL);
            let line = Modifier::at(0)
                .direct()
                .with_fallback(format!(r#"<{} w="12700" cap="flat" cmpd="sng" algn="ctr">{}</{}>"#, tag, FILL_FALLBACK, tag))
                .before(&before)
                .set_attr("w", border.width.to_string())
                .child("a:noFill", Modifier::truncate(0).direct())
                .child(
                    "a:solidFill",
                    Modifier::at(0)
                        .direct()
                        .with_fallback(FILL_FALLBACK)
                        .before(&["a:prstDash", "a:custDash", "a:round", "a:bevel", "a:miter", "a:headEnd", "a:tailEnd"])
                        .child("a:srgbClr", Modifier::at(0).set_attr("val", border.color.as_str())),
                );
            tc_pr = tc_pr.child(tag, line);
        }
    }

    if let Some(fill) = &style.fill {
        for other in ["a:noFill", "a:gradFill", "a:blipFill", "a:pattFill", "a:grpFill"] {
            tc_pr = tc_pr.child(other, Modifier::truncate(0).direct());
        }
        tc_pr = tc_pr.child(
            "a:solidFill",
            Modifier::at(0)
                .direct()
                .with_fallback(FILL_FALLBACK)
                .before(TC_PR_TAIL)
                .child("a:srgbClr", Modifier::at(0).set_attr("val", fill.as_str())),
        );
    }
    tc_pr
}

fn grid_columns(doc: &XmlDocument, tbl: NodeId) -> Vec<NodeId> {
    doc.first_child_named(tbl, "a:tblGrid")
        .map(|grid| doc.children_named(grid, "a:gridCol"))
        .unwrap_or_default()
}

fn cell_text(doc: &XmlDocument, tc: NodeId) -> String {
    doc.descendants_named(tc, "a:t")
        .into_iter()
        .map(|t| doc.text(t))
        .collect()
}

/// Index of the first row with a cell containing `marker`.
pub fn find_marker_row(doc: &XmlDocument, tbl: NodeId, marker: &str) -> Option<usize> {
    doc.children_named(tbl, "a:tr")
        .into_iter()
        .position(|tr| doc.children_named(tr, "a:tc").into_iter().any(|tc| cell_text(doc, tc).contains(marker)))
}

/// Grid column of the first cell containing `marker`.
pub fn find_marker_column(doc: &XmlDocument, tbl: NodeId, marker: &str) -> Option<usize> {
    doc.children_named(tbl, "a:tr").into_iter().find_map(|tr| {
        doc.children_named(tr, "a:tc")
            .into_iter()
            .position(|tc| cell_text(doc, tc).contains(marker))
    })
}

fn strip_marker(doc: &mut XmlDocument, tbl: NodeId, marker: &str) {
    for t in doc.descendants_named(tbl, "a:t") {
        let text = doc.text(t);
        if text.contains(marker) {
            doc.set_text(t, &text.replace(marker, ""));
        }
    }
}

/// Insert `extra` copies of row `at` directly after it.
pub fn expand_rows(doc: &mut XmlDocument, tbl: NodeId, at: usize, extra: usize) -> Result<()> {
    let rows = doc.children_named(tbl, "a:tr");
    let template = *rows.get(at).ok_or_else(|| MergeError::SchemaShape {
        tag: "a:tr".to_string(),
        label: format!("row {}", at + 1),
    })?;
    let mut anchor = template;
    for _ in 0..extra {
        let copy = doc.deep_clone(template);
        doc.insert_after(anchor, copy);
        anchor = copy;
    }
    Ok(())
}

fn span_of(doc: &XmlDocument, tc: NodeId) -> usize {
    doc.attr(tc, "gridSpan")
        .and_then(|s| atoi_simd::parse::<usize, false, false>(s.as_bytes()).ok())
        .unwrap_or(1)
        .max(1)
}

fn is_merged(doc: &XmlDocument, tc: NodeId) -> bool {
    matches!(doc.attr(tc, "hMerge"), Some("1") | Some("true"))
}

/// Insert `extra` grid columns after grid column `at`, cloned from it.
///
/// In each row the cell at `at` is repeated. A cell that spans several
/// columns, or a merged placeholder inside such a span, grows the owning
/// cell's `gridSpan` and gets `hMerge` placeholders instead.
pub fn expand_columns(doc: &mut XmlDocument, tbl: NodeId, at: usize, extra: usize) -> Result<()> {
    let columns = grid_columns(doc, tbl);
    let template = *columns.get(at).ok_or_else(|| MergeError::SchemaShape {
        tag: "a:gridCol".to_string(),
        label: format!("column {}", at + 1),
    })?;
    let mut anchor = template;
    for _ in 0..extra {
        let copy = doc.deep_clone(template);
        doc.insert_after(anchor, copy);
        anchor = copy;
    }

    for tr in doc.children_named(tbl, "a:tr") {
        // Spanned columns keep one hMerge placeholder cell each
        let cells = doc.children_named(tr, "a:tc");
        let Some(&cell) = cells.get(at) else {
            continue;
        };
        let k = at;

        let owner = if is_merged(doc, cell) {
            cells[..k].iter().rev().copied().find(|c| !is_merged(doc, *c) && span_of(doc, *c) > 1)
        } else if span_of(doc, cell) > 1 {
            Some(cell)
        } else {
            None
        };

        match owner {
            Some(owner) => {
                let span = span_of(doc, owner) + extra;
                doc.set_attr(owner, "gridSpan", span.to_string());
                let mut anchor = cell;
                for _ in 0..extra {
                    let placeholder = doc.deep_clone(cell);
                    doc.remove_attr(placeholder, "gridSpan");
                    doc.set_attr(placeholder, "hMerge", "1");
                    for t in doc.descendants_named(placeholder, "a:t") {
                        doc.set_text(t, "");
                    }
                    doc.insert_after(anchor, placeholder);
                    anchor = placeholder;
                }
            },
            None => {
                let mut anchor = cell;
                for _ in 0..extra {
                    let copy = doc.deep_clone(cell);
                    doc.insert_after(anchor, copy);
                    anchor = copy;
                }
            },
        }
    }
    Ok(())
}

//! Live handle on a chart's embedded workbook.
//!
//! Charts keep their source data in an embedded SpreadsheetML package. The
//! handle opens that package, follows `workbook.xml` to its first sheet, and
//! exposes the sheet, shared strings and table parts as editable trees.
//! Changes are written back with [`Workbook::to_bytes`].
//!
//! ```text
//!     |    A     |    B     |    C     |
//! ----+----------+----------+----------+
//!   1 |          | Series 1 | Series 2 |
//!   2 | Cat 1    |   10     |   15     |
//!   3 | Cat 2    |   20     |   25     |
//! ```
use crate::ooxml::error::{MergeError, Result};
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::phys_pkg::Archive;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::pptx::patch::{Modifier, PatchSpec, apply, column_letter, relative_range};
use crate::ooxml::xml::{NodeId, XmlDocument};
use tracing::debug;

/// A value written into one worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(CellValue::Empty, CellValue::Number)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// An editable embedded workbook.
pub struct Workbook {
    archive: Box<dyn Archive>,
    sheet_name: String,
    sheet_path: String,
    /// First worksheet
    pub sheet: XmlDocument,
    shared_strings_path: Option<String>,
    pub shared_strings: Option<XmlDocument>,
    table_path: Option<String>,
    /// Table part of the first worksheet, if the sheet defines one
    pub table: Option<XmlDocument>,
}

impl Workbook {
    /// Open the workbook held in `archive`.
    pub fn open(archive: Box<dyn Archive>) -> Result<Self> {
        let root_rels = Relationships::load(archive.as_ref(), "")?;
        let workbook_path = root_rels
            .targets_by_type(rt::OFFICE_DOCUMENT)
            .into_iter()
            .find(|t| t.rel_type == rt::OFFICE_DOCUMENT)
            .map(|t| t.part_uri(root_rels.base_uri()))
            .transpose()?
            .map(|uri| uri.membername().to_string())
            .unwrap_or_else(|| "xl/workbook.xml".to_string());

        let workbook = archive.read_xml(&workbook_path)?;
        let workbook_rels = Relationships::load(archive.as_ref(), &workbook_path)?;

        let first_sheet = workbook
            .find_first(workbook.root(), "sheet")
            .ok_or_else(|| MergeError::not_found(format!("sheet in {}", workbook_path)))?;
        let sheet_name = workbook.attr(first_sheet, "name").unwrap_or("Sheet1").to_string();
        let sheet_rid = workbook
            .attr(first_sheet, "r:id")
            .ok_or_else(|| MergeError::not_found(format!("r:id of sheet '{}'", sheet_name)))?;
        let sheet_path = workbook_rels
            .require(sheet_rid)?
            .part_uri(workbook_rels.base_uri())?
            .membername()
            .to_string();
        let sheet = archive.read_xml(&sheet_path)?;

        let shared_strings_path = workbook_rels
            .targets_by_type(rt::SHARED_STRINGS)
            .into_iter()
            .find(|t| t.rel_type == rt::SHARED_STRINGS)
            .map(|t| t.part_uri(workbook_rels.base_uri()))
            .transpose()?
            .map(|uri| uri.membername().to_string());
        let shared_strings = match &shared_strings_path {
            Some(path) if archive.file_exists(path) => Some(archive.read_xml(path)?),
            _ => None,
        };

        let sheet_rels = Relationships::load(archive.as_ref(), &sheet_path)?;
        let table_path = sheet_rels
            .targets_by_type(rt::TABLE)
            .into_iter()
            .find(|t| t.rel_type == rt::TABLE)
            .map(|t| t.part_uri(sheet_rels.base_uri()))
            .transpose()?
            .map(|uri| uri.membername().to_string());
        let table = match &table_path {
            Some(path) if archive.file_exists(path) => Some(archive.read_xml(path)?),
            _ => None,
        };

        debug!(
            workbook = archive.label(),
            sheet = %sheet_path,
            shared_strings = shared_strings.is_some(),
            table = table.is_some(),
            "embedded workbook opened"
        );

        Ok(Self {
            archive,
            sheet_name,
            sheet_path,
            sheet,
            shared_strings_path,
            shared_strings,
            table_path,
            table,
        })
    }

    /// Name of the first sheet as declared in `workbook.xml`.
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Sheet-qualified reference as used in chart formulas (`Sheet1!$B$1`).
    pub fn qualified(&self, reference: &str) -> String {
        let needs_quotes = self
            .sheet_name
            .chars()
            .any(|c| !(c.is_alphanumeric() || c == '_' || c == '.'));
        if needs_quotes {
            format!("'{}'!{}", self.sheet_name.replace('\'', "''"), reference)
        } else {
            format!("{}!{}", self.sheet_name, reference)
        }
    }

    fn sheet_data(&mut self) -> NodeId {
        let root = self.sheet.root();
        match self.sheet.first_child_named(root, "sheetData") {
            Some(node) => node,
            None => {
                let node = self.sheet.create_element("sheetData");
                self.sheet.append_child(root, node);
                node
            },
        }
    }

    /// Index of `text` in the shared string table, appending it if needed.
    fn shared_string_index(&mut self, text: &str) -> Option<usize> {
        let sst = self.shared_strings.as_mut()?;
        let root = sst.root();
        let items = sst.children_named(root, "si");
        if let Some(pos) = items.iter().position(|si| sst.text(*si) == text) {
            return Some(pos);
        }

        let si = sst.create_element("si");
        let t = sst.create_element("t");
        sst.set_text(t, text);
        if text.starts_with(' ') || text.ends_with(' ') {
            sst.set_attr(t, "xml:space", "preserve");
        }
        sst.append_child(si, t);
        sst.append_child(root, si);

        let mut buf = itoa::Buffer::new();
        let unique = buf.format(items.len() + 1).to_string();
        sst.set_attr(root, "uniqueCount", unique.as_str());
        let count = sst
            .attr(root, "count")
            .and_then(|c| atoi_simd::parse::<usize, false, false>(c.as_bytes()).ok())
            .unwrap_or(items.len());
        sst.set_attr(root, "count", buf.format(count + 1));
        Some(items.len())
    }

    /// Modifier writing one value into a `c` element.
    ///
    /// Formulas and inline strings of the old value are removed so the
    /// cached `v` is the cell's only content.
    fn cell_modifier(&mut self, index: usize, col: u32, row: u32, value: &CellValue) -> Modifier {
        let reference = format!("{}{}", column_letter(col), row);
        let cell = Modifier::at(index)
            .set_attr("r", reference)
            .child("f", Modifier::truncate(0).direct())
            .child("is", Modifier::truncate(0).direct());
        match value {
            CellValue::Number(n) => cell.remove_attr("t").child("v", Modifier::at(0).set_number(*n)),
            CellValue::Text(text) => match self.shared_string_index(text) {
                Some(idx) => cell
                    .set_attr("t", "s")
                    .child("v", Modifier::at(0).set_text(idx.to_string())),
                None => cell
                    .set_attr("t", "str")
                    .child("v", Modifier::at(0).set_text(text.as_str())),
            },
            CellValue::Empty => cell.remove_attr("t").child("v", Modifier::truncate(0).direct()),
        }
    }

    /// Replace the sheet contents with `rows`, starting at `A1`.
    ///
    /// Rows and cells are grown from the existing ones so their styles carry
    /// over; rows and cells beyond the new grid are removed. Every row is
    /// padded to the width of the widest row.
    pub fn fill(&mut self, rows: &[Vec<CellValue>]) -> Result<()> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut spec = PatchSpec::new();
        for (r, values) in rows.iter().enumerate() {
            let row_number = r as u32 + 1;
            let mut row = Modifier::at(r)
                .labeled(format!("row {}", row_number))
                .stamp_index_from("r", 1)
                .remove_attr("spans")
                .with_fallback("<row><c><v/></c></row>");
            for c in 0..width {
                let value = values.get(c).cloned().unwrap_or(CellValue::Empty);
                let cell = self.cell_modifier(c, c as u32, row_number, &value);
                row = row.child("c", cell.with_fallback("<c><v/></c>"));
            }
            row = row.child("c", Modifier::truncate(width));
            spec.push("row", row);
        }
        spec.push("row", Modifier::truncate(rows.len()));

        let sheet_data = self.sheet_data();
        apply(&mut self.sheet, sheet_data, &spec)?;

        if width > 0 && !rows.is_empty() {
            self.set_dimension((width - 1) as u32, rows.len() as u32);
        }
        Ok(())
    }

    /// Write one cell, creating its row and cell when they do not exist yet.
    pub fn set_cell(&mut self, col: u32, row: u32, value: impl Into<CellValue>) -> Result<()> {
        let value = value.into();
        let sheet_data = self.sheet_data();
        let row_number = row.to_string();
        let rows = self.sheet.children_named(sheet_data, "row");
        let row_node = match rows
            .iter()
            .find(|r| self.sheet.attr(**r, "r") == Some(row_number.as_str()))
        {
            Some(node) => *node,
            None => {
                let node = self.sheet.create_element_with("row", &[("r", row_number.as_str())]);
                let after = rows.iter().rev().find(|r| {
                    self.sheet
                        .attr(**r, "r")
                        .and_then(|n| atoi_simd::parse::<u32, false, false>(n.as_bytes()).ok())
                        .is_some_and(|n| n < row)
                });
                match after {
                    Some(prev) => self.sheet.insert_after(*prev, node),
                    None => self.sheet.prepend_child(sheet_data, node),
                }
                node
            },
        };

        let reference = format!("{}{}", column_letter(col), row);
        let cells = self.sheet.children_named(row_node, "c");
        let position = cells
            .iter()
            .position(|c| self.sheet.attr(*c, "r") == Some(reference.as_str()));
        let index = match position {
            Some(pos) => pos,
            None => {
                let cell = self.sheet.create_element_with("c", &[("r", reference.as_str())]);
                let after = cells.iter().rev().find(|c| {
                    self.sheet
                        .attr(**c, "r")
                        .is_some_and(|r| column_index(r).is_some_and(|existing| existing < col))
                });
                match after {
                    Some(prev) => self.sheet.insert_after(*prev, cell),
                    None => self.sheet.prepend_child(row_node, cell),
                }
                self.sheet
                    .children_named(row_node, "c")
                    .iter()
                    .position(|c| *c == cell)
                    .unwrap_or(0)
            },
        };

        let modifier = self.cell_modifier(index, col, row, &value);
        let spec = PatchSpec::new().with("c", modifier);
        apply(&mut self.sheet, row_node, &spec)
    }

    /// Text or number stored in a cell, resolving shared strings.
    pub fn cell_text(&self, col: u32, row: u32) -> Option<String> {
        let reference = format!("{}{}", column_letter(col), row);
        let root = self.sheet.root();
        let cell = self
            .sheet
            .descendants_named(root, "c")
            .into_iter()
            .find(|c| self.sheet.attr(*c, "r") == Some(reference.as_str()))?;
        let value = self.sheet.text(self.sheet.first_child_named(cell, "v")?);
        if self.sheet.attr(cell, "t") == Some("s") {
            let sst = self.shared_strings.as_ref()?;
            let idx = atoi_simd::parse::<usize, false, false>(value.as_bytes()).ok()?;
            let si = *sst.children_named(sst.root(), "si").get(idx)?;
            return Some(sst.text(si));
        }
        Some(value)
    }

    /// Set `<dimension ref>` to span `A1` to (`last_col`, `last_row`).
    pub fn set_dimension(&mut self, last_col: u32, last_row: u32) {
        let range = relative_range((0, 1), (last_col, last_row));
        let root = self.sheet.root();
        let dimension = match self.sheet.first_child_named(root, "dimension") {
            Some(node) => node,
            None => {
                let node = self.sheet.create_element("dimension");
                match self.sheet.first_child_named(root, "sheetPr") {
                    Some(pr) => self.sheet.insert_after(pr, node),
                    None => self.sheet.prepend_child(root, node),
                }
                node
            },
        };
        self.sheet.set_attr(dimension, "ref", range);
    }

    /// Current `<dimension ref>` of the sheet.
    pub fn dimension(&self) -> Option<&str> {
        let dimension = self.sheet.first_child_named(self.sheet.root(), "dimension")?;
        self.sheet.attr(dimension, "ref")
    }

    /// Resize the table part to the header row `headers` plus `data_rows`
    /// rows, growing or truncating its `tableColumn` list.
    pub fn update_table(&mut self, headers: &[String], data_rows: usize) -> Result<()> {
        let Some(table) = self.table.as_mut() else {
            return Ok(());
        };
        if headers.is_empty() {
            return Ok(());
        }
        let range = relative_range((0, 1), ((headers.len() - 1) as u32, data_rows as u32 + 1));
        let root = table.root();
        table.set_attr(root, "ref", range.as_str());
        if let Some(filter) = table.first_child_named(root, "autoFilter") {
            table.set_attr(filter, "ref", range.as_str());
        }

        let mut columns = Modifier::at(0)
            .labeled("table columns")
            .set_attr("count", headers.len().to_string());
        for (i, header) in headers.iter().enumerate() {
            let name = if header.is_empty() { " " } else { header.as_str() };
            columns = columns.child(
                "tableColumn",
                Modifier::at(i)
                    .labeled(name)
                    .stamp_index_from("id", 1)
                    .set_attr("name", name)
                    .with_fallback(r#"<tableColumn id="1" name=""/>"#),
            );
        }
        columns = columns.child("tableColumn", Modifier::truncate(headers.len()));
        let spec = PatchSpec::new().with("tableColumns", columns);
        apply(table, root, &spec)
    }

    /// Serialize the workbook with every edited part written back.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.archive.write_xml(&self.sheet_path, &self.sheet);
        if let (Some(path), Some(doc)) = (&self.shared_strings_path, &self.shared_strings) {
            self.archive.write_xml(path, doc);
        }
        if let (Some(path), Some(doc)) = (&self.table_path, &self.table) {
            self.archive.write_xml(path, doc);
        }
        Ok(self.archive.to_bytes()?)
    }
}

impl std::fmt::Debug for Workbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbook")
            .field("archive", &self.archive.label())
            .field("sheet", &self.sheet_path)
            .field("table", &self.table_path)
            .finish()
    }
}

/// 0-based column of a cell reference (`C7` -> 2).
fn column_index(reference: &str) -> Option<u32> {
    let letters: &str = &reference[..reference
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(reference.len())];
    if letters.is_empty() {
        return None;
    }
    letters.bytes().try_fold(0u32, |acc, b| {
        b.is_ascii_uppercase().then(|| acc * 26 + u32::from(b - b'A' + 1))
    })
    .map(|n| n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::phys_pkg::PackageArchive;
    use crate::ooxml::pptx::test_support::workbook_bytes;

    fn open() -> Workbook {
        let archive = PackageArchive::from_bytes("book.xlsx", &workbook_bytes()).unwrap();
        Workbook::open(Box::new(archive)).unwrap()
    }

    #[test]
    fn test_open_finds_parts() {
        let book = open();
        assert_eq!(book.sheet_name(), "Sheet1");
        assert!(book.shared_strings.is_some());
        assert!(book.table.is_some());
        assert_eq!(book.cell_text(1, 1).as_deref(), Some("Series 1"));
        assert_eq!(book.cell_text(1, 2).as_deref(), Some("4.3"));
    }

    #[test]
    fn test_fill_grows_and_updates_dimension() {
        let mut book = open();
        let rows = vec![
            vec![CellValue::Empty, "s1".into(), "s2".into()],
            vec!["c1".into(), CellValue::Number(1.0), CellValue::Number(2.0)],
            vec!["c2".into(), CellValue::Number(3.0), CellValue::Number(4.0)],
        ];
        book.fill(&rows).unwrap();
        assert_eq!(book.dimension(), Some("A1:C3"));
        assert_eq!(book.cell_text(2, 1).as_deref(), Some("s2"));
        assert_eq!(book.cell_text(0, 3).as_deref(), Some("c2"));
        assert_eq!(book.cell_text(2, 3).as_deref(), Some("4"));

        let data = book.sheet.find_first(book.sheet.root(), "sheetData").unwrap();
        assert_eq!(book.sheet.children_named(data, "row").len(), 3);
    }

    #[test]
    fn test_set_cell_creates_row_in_order() {
        let mut book = open();
        book.set_cell(3, 9, "late").unwrap();
        book.set_cell(0, 9, 1.5_f64).unwrap();
        assert_eq!(book.cell_text(3, 9).as_deref(), Some("late"));
        assert_eq!(book.cell_text(0, 9).as_deref(), Some("1.5"));

        let data = book.sheet.find_first(book.sheet.root(), "sheetData").unwrap();
        let row = *book.sheet.children_named(data, "row").last().unwrap();
        let refs: Vec<&str> = book
            .sheet
            .children_named(row, "c")
            .into_iter()
            .filter_map(|c| book.sheet.attr(c, "r"))
            .collect();
        assert_eq!(refs, vec!["A9", "D9"]);
    }

    #[test]
    fn test_update_table_and_round_trip() {
        let mut book = open();
        let headers = vec![" ".to_string(), "s1".to_string(), "s2".to_string(), "s3".to_string()];
        book.update_table(&headers, 2).unwrap();
        let bytes = book.to_bytes().unwrap();

        let reopened =
            Workbook::open(Box::new(PackageArchive::from_bytes("again", &bytes).unwrap())).unwrap();
        let table = reopened.table.as_ref().unwrap();
        assert_eq!(table.attr(table.root(), "ref"), Some("A1:D3"));
        let columns = table.descendants_named(table.root(), "tableColumn");
        assert_eq!(columns.len(), 4);
        assert_eq!(table.attr(columns[3], "id"), Some("4"));
        assert_eq!(table.attr(columns[3], "name"), Some("s3"));
    }

    #[test]
    fn test_empty_cells_drop_value_and_formulas_are_cleared() {
        let mut book = open();
        let data = book.sheet.find_first(book.sheet.root(), "sheetData").unwrap();
        let b2 = book
            .sheet
            .descendants_named(data, "c")
            .into_iter()
            .find(|c| book.sheet.attr(*c, "r") == Some("B2"))
            .unwrap();
        let f = book.sheet.create_element("f");
        book.sheet.set_text(f, "SUM(1,2)");
        book.sheet.prepend_child(b2, f);

        book.set_cell(1, 2, 9.0_f64).unwrap();
        assert!(book.sheet.first_child_named(b2, "f").is_none());
        assert_eq!(book.cell_text(1, 2).as_deref(), Some("9"));

        book.set_cell(1, 2, CellValue::Empty).unwrap();
        assert!(book.sheet.first_child_named(b2, "v").is_none());
        assert_eq!(book.sheet.attr(b2, "t"), None);
        assert_eq!(book.cell_text(1, 2), None);
    }

    #[test]
    fn test_qualified_and_column_index() {
        let book = open();
        assert_eq!(book.qualified("$A$1"), "Sheet1!$A$1");
        assert_eq!(column_index("C7"), Some(2));
        assert_eq!(column_index("AA1"), Some(26));
        assert_eq!(column_index("7"), None);
    }
}

//! Chart data projection.
//!
//! Caller data is laid out on the embedded worksheet first (categories in
//! column A, one column per series, labels in row 1) and the chart XML is
//! then pointed at those cells: every `c:ser` gets its index, its label
//! reference pair and value references with matching caches. Series beyond
//! the template's are grown by cloning the last authored `c:ser`; surplus
//! series and points are truncated afterwards.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ooxml_splice::ooxml::pptx::patch::chart::{ChartCategory, ChartData, ChartFill, ChartSeries};
//!
//! let data = ChartData::new()
//!     .with_series(ChartSeries::new("North"))
//!     .with_series(ChartSeries::new("South"))
//!     .with_category(ChartCategory::new("Q1", vec![Some(4.0), Some(2.5)]))
//!     .with_category(ChartCategory::new("Q2", vec![Some(5.1), None]));
//! assert_eq!(data.columns().len(), 3);
//! ```
use crate::ooxml::error::{MergeError, Result};
use crate::ooxml::pptx::patch::worksheet::{CellValue, Workbook};
use crate::ooxml::pptx::patch::{Modifier, PatchSpec, absolute_cell, absolute_range, apply, parse_number};
use crate::ooxml::xml::{NodeId, XmlDocument};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One data series; its values live on the categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
}

impl ChartSeries {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

/// One category with a value per series (`None` leaves the point out).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartCategory {
    pub label: String,
    #[serde(default)]
    pub values: Vec<Option<f64>>,
}

impl ChartCategory {
    pub fn new(label: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }
}

/// Data for category/value charts (bar, column, line, area, pie, combo).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(default)]
    pub series: Vec<ChartSeries>,
    #[serde(default)]
    pub categories: Vec<ChartCategory>,
}

/// A point of a scatter series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterSeries {
    pub label: String,
    #[serde(default)]
    pub points: Vec<ScatterPoint>,
}

impl ScatterSeries {
    pub fn new(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            points: points.into_iter().map(|(x, y)| ScatterPoint { x, y }).collect(),
        }
    }
}

/// Data for XY scatter charts; each series occupies two worksheet columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScatterData {
    #[serde(default)]
    pub series: Vec<ScatterSeries>,
}

/// What a worksheet column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartSlot {
    Categories,
    Series(usize),
    XValues(usize),
    YValues(usize),
}

/// A worksheet column feeding one slot of the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartColumn {
    pub slot: ChartSlot,
    /// 0-based worksheet column
    pub column: u32,
    /// Header written into row 1
    pub label: String,
    /// Whether the series label reference pair (`c:tx/c:strRef`) is written
    pub string_ref: bool,
}

/// Data that can be projected onto a chart and its workbook.
pub trait ChartFill {
    /// Worksheet columns in left-to-right order.
    fn columns(&self) -> Vec<ChartColumn>;

    /// Cell grid including the header row.
    fn rows(&self) -> Vec<Vec<CellValue>>;

    /// Patch spec for the chart's plot area.
    fn plot_area_spec(&self, chart: &XmlDocument, plot_area: NodeId, workbook: &Workbook) -> PatchSpec;

    /// Write the data into `workbook` and `chart`.
    fn apply_to(&self, chart: &mut XmlDocument, workbook: &mut Workbook) -> Result<()> {
        let columns = self.columns();
        let rows = self.rows();
        workbook.fill(&rows)?;
        let headers: Vec<String> = columns.iter().map(|c| c.label.clone()).collect();
        workbook.update_table(&headers, rows.len().saturating_sub(1))?;

        let root = chart.root();
        let plot_area = chart
            .find_first(root, "c:plotArea")
            .ok_or_else(|| MergeError::not_found("c:plotArea in chart"))?;
        let spec = self.plot_area_spec(chart, plot_area, workbook);
        apply(chart, plot_area, &spec)?;
        debug!(columns = columns.len(), rows = rows.len(), "chart data applied");
        Ok(())
    }
}

impl ChartData {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_series(mut self, series: ChartSeries) -> Self {
        self.series.push(series);
        self
    }

    #[inline]
    pub fn with_category(mut self, category: ChartCategory) -> Self {
        self.categories.push(category);
        self
    }
}

/// `c:strRef` or `c:numRef`, whichever the template's categories use.
///
/// Numeric references are kept only while every label parses as a number.
fn category_ref_kind(
    chart: &XmlDocument,
    plot_area: NodeId,
    categories: &[ChartCategory],
) -> (&'static str, &'static str) {
    let numeric = chart
        .descendants_named(plot_area, "c:cat")
        .first()
        .is_some_and(|cat| chart.first_child_named(*cat, "c:numRef").is_some())
        && categories.iter().all(|c| parse_number(&c.label).is_some());
    if numeric {
        ("c:numRef", "c:numCache")
    } else {
        ("c:strRef", "c:strCache")
    }
}

const STR_REF_FALLBACK: &str =
    r#"<c:strRef><c:f/><c:strCache><c:ptCount val="0"/></c:strCache></c:strRef>"#;
const NUM_REF_FALLBACK: &str = r#"<c:numRef><c:f/><c:numCache><c:formatCode>General</c:formatCode><c:ptCount val="0"/></c:numCache></c:numRef>"#;
const PT_FALLBACK: &str = r#"<c:pt idx="0"><c:v/></c:pt>"#;

/// `c:tx` label pair pointing at one header cell.
///
/// A literal `c:v` label is replaced, `c:tx` holds one or the other.
fn series_label(workbook: &Workbook, column: u32, label: &str) -> Modifier {
    let reference = Modifier::at(0)
        .with_fallback(STR_REF_FALLBACK)
        .child("c:f", Modifier::at(0).set_text(workbook.qualified(&absolute_cell(column, 1))))
        .child(
            "c:strCache",
            Modifier::at(0)
                .child("c:ptCount", Modifier::at(0).set_attr("val", "1"))
                .child(
                    "c:pt",
                    Modifier::at(0)
                        .set_attr("idx", "0")
                        .with_fallback(PT_FALLBACK)
                        .child("c:v", Modifier::at(0).set_text(label)),
                )
                .child("c:pt", Modifier::truncate(1)),
        );
    Modifier::at(0)
        .labeled(label)
        .child("c:strRef", reference)
        .child("c:v", Modifier::truncate(0).direct())
}

/// Reference plus cache for one column of values.
///
/// Points carry their row offset as `idx`, so absent values leave gaps and
/// the cache stays aligned with the sheet.
fn value_ref(
    workbook: &Workbook,
    (ref_tag, cache_tag): (&str, &str),
    column: u32,
    len: usize,
    points: &[Modifier],
    label: &str,
) -> Modifier {
    let fallback = if ref_tag == "c:numRef" {
        NUM_REF_FALLBACK
    } else {
        STR_REF_FALLBACK
    };
    let range = absolute_range((column, 2), (column, len.max(1) as u32 + 1));
    let mut cache = Modifier::at(0).child("c:ptCount", Modifier::at(0).set_attr("val", len.to_string()));
    for point in points {
        cache = cache.child("c:pt", point.clone());
    }
    cache = cache.child("c:pt", Modifier::truncate(points.len()));

    Modifier::at(0).labeled(label).child(
        ref_tag,
        Modifier::at(0)
            .with_fallback(fallback)
            .child("c:f", Modifier::at(0).set_text(workbook.qualified(&range)))
            .child(cache_tag, cache),
    )
}

fn text_point(position: usize, idx: usize, text: &str) -> Modifier {
    Modifier::at(position)
        .set_attr("idx", idx.to_string())
        .with_fallback(PT_FALLBACK)
        .child("c:v", Modifier::at(0).set_text(text))
}

fn number_point(position: usize, idx: usize, value: f64) -> Modifier {
    Modifier::at(position)
        .set_attr("idx", idx.to_string())
        .with_fallback(PT_FALLBACK)
        .child("c:v", Modifier::at(0).set_number(value))
}

/// Shared head of every `c:ser` modifier.
fn series_head(index: usize, label: &str) -> Modifier {
    Modifier::at(index)
        .labeled(label)
        .child("c:idx", Modifier::at(0).set_attr("val", index.to_string()))
        .child("c:order", Modifier::at(0).set_attr("val", index.to_string()))
}

impl ChartFill for ChartData {
    fn columns(&self) -> Vec<ChartColumn> {
        let mut columns = vec![ChartColumn {
            slot: ChartSlot::Categories,
            column: 0,
            label: " ".to_string(),
            string_ref: false,
        }];
        columns.extend(self.series.iter().enumerate().map(|(i, s)| ChartColumn {
            slot: ChartSlot::Series(i),
            column: i as u32 + 1,
            label: s.label.clone(),
            string_ref: true,
        }));
        columns
    }

    fn rows(&self) -> Vec<Vec<CellValue>> {
        let mut header = vec![CellValue::Empty];
        header.extend(self.series.iter().map(|s| CellValue::Text(s.label.clone())));

        let mut rows = vec![header];
        for category in &self.categories {
            let mut row = vec![CellValue::Text(category.label.clone())];
            row.extend((0..self.series.len()).map(|i| CellValue::from(category.values.get(i).copied().flatten())));
            rows.push(row);
        }
        rows
    }

    fn plot_area_spec(&self, chart: &XmlDocument, plot_area: NodeId, workbook: &Workbook) -> PatchSpec {
        let cat_kind = category_ref_kind(chart, plot_area, &self.categories);
        let numeric_categories = cat_kind.0 == "c:numRef";
        let other_cat_ref = if numeric_categories { "c:strRef" } else { "c:numRef" };
        let len = self.categories.len();

        let category_points: Vec<Modifier> = self
            .categories
            .iter()
            .enumerate()
            .map(|(j, c)| match (numeric_categories, parse_number(&c.label)) {
                (true, Some(n)) => number_point(j, j, n),
                _ => text_point(j, j, &c.label),
            })
            .collect();

        let mut spec = PatchSpec::new();
        for column in self.columns() {
            let ChartSlot::Series(i) = column.slot else {
                continue;
            };
            let label = column.label.as_str();
            let points: Vec<Modifier> = self
                .categories
                .iter()
                .enumerate()
                .filter_map(|(j, c)| c.values.get(i).copied().flatten().map(|v| (j, v)))
                .enumerate()
                .map(|(position, (j, v))| number_point(position, j, v))
                .collect();

            let mut series = series_head(i, label);
            if column.string_ref {
                series = series.child("c:tx", series_label(workbook, column.column, label));
            }
            series = series
                .child(
                    "c:cat",
                    value_ref(workbook, cat_kind, 0, len, &category_points, label)
                        .child(other_cat_ref, Modifier::truncate(0).direct()),
                )
                .child(
                    "c:val",
                    value_ref(workbook, ("c:numRef", "c:numCache"), column.column, len, &points, label),
                );
            spec.push("c:ser", series);
        }
        spec.push("c:ser", Modifier::truncate(self.series.len()));
        spec
    }
}

impl ScatterData {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_series(mut self, series: ScatterSeries) -> Self {
        self.series.push(series);
        self
    }
}

impl ChartFill for ScatterData {
    fn columns(&self) -> Vec<ChartColumn> {
        self.series
            .iter()
            .enumerate()
            .flat_map(|(i, s)| {
                [
                    ChartColumn {
                        slot: ChartSlot::XValues(i),
                        column: 2 * i as u32,
                        label: format!("{} X", s.label),
                        string_ref: false,
                    },
                    ChartColumn {
                        slot: ChartSlot::YValues(i),
                        column: 2 * i as u32 + 1,
                        label: s.label.clone(),
                        string_ref: true,
                    },
                ]
            })
            .collect()
    }

    fn rows(&self) -> Vec<Vec<CellValue>> {
        let height = self.series.iter().map(|s| s.points.len()).max().unwrap_or(0);
        let header = self
            .columns()
            .into_iter()
            .map(|c| CellValue::Text(c.label))
            .collect();
        let mut rows = vec![header];
        for r in 0..height {
            let row = self
                .series
                .iter()
                .flat_map(|s| match s.points.get(r) {
                    Some(p) => [CellValue::Number(p.x), CellValue::Number(p.y)],
                    None => [CellValue::Empty, CellValue::Empty],
                })
                .collect();
            rows.push(row);
        }
        rows
    }

    fn plot_area_spec(&self, _chart: &XmlDocument, _plot_area: NodeId, workbook: &Workbook) -> PatchSpec {
        let numeric = ("c:numRef", "c:numCache");
        let mut spec = PatchSpec::new();
        for (i, series) in self.series.iter().enumerate() {
            let len = series.points.len();
            let xs: Vec<Modifier> =
                series.points.iter().enumerate().map(|(j, p)| number_point(j, j, p.x)).collect();
            let ys: Vec<Modifier> =
                series.points.iter().enumerate().map(|(j, p)| number_point(j, j, p.y)).collect();
            let x_col = 2 * i as u32;
            let y_col = x_col + 1;

            spec.push(
                "c:ser",
                series_head(i, &series.label)
                    .child("c:tx", series_label(workbook, y_col, &series.label))
                    .child("c:xVal", value_ref(workbook, numeric, x_col, len, &xs, &series.label))
                    .child("c:yVal", value_ref(workbook, numeric, y_col, len, &ys, &series.label)),
            );
        }
        spec.push("c:ser", Modifier::truncate(self.series.len()));
        spec
    }
}

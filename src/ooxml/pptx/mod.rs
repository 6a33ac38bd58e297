//! Presentation (.pptx) merging.
//!
//! Slides, single elements, masters and layouts are imported from source
//! [`Template`]s into a destination [`Package`]. Every import copies the
//! parts the imported XML depends on (images, charts with their embedded
//! workbooks, diagrams, OLE objects, themes), renumbers them so they do not
//! collide with the destination's parts, and rewrites relationship ids in
//! the copied XML.
//!
//! Callers can change imported content while it is being copied: element
//! callbacks edit the shape XML, chart callbacks replace a chart's data
//! together with its embedded workbook, table callbacks rewrite table rows.
//! A failing callback is recorded in the [`ImportReport`] and does not abort
//! the merge.
//!
//! # Example
//!
//! ```rust,no_run
//! use ooxml_splice::ooxml::pptx::{ElementImport, Merger, MergeOptions, SlideImport, Template};
//!
//! let sales = Template::open("sales.pptx")?;
//! let mut merger = Merger::open("base.pptx", MergeOptions::default())?;
//!
//! merger.import_slide(&sales, SlideImport::new(3))?;
//! merger.import_element(&sales, 1, ElementImport::new(2, "Revenue Chart"))?;
//!
//! let report = merger.save("merged.pptx")?;
//! for failed in report.failed_callbacks() {
//!     eprintln!("{:?}", failed);
//! }
//! # Ok::<(), ooxml_splice::ooxml::error::MergeError>(())
//! ```

pub mod context;
pub mod counter;
pub mod integrity;
pub mod layout;
pub mod master;
pub mod merge;
pub mod options;
pub mod package;
pub mod parts;
pub mod patch;
pub mod presentation;
pub mod report;
pub mod shapes;
pub mod slide;
pub mod template;

#[cfg(test)]
mod test_support;

pub use master::ImportedMaster;
pub use merge::Merger;
pub use options::{IntegrityMode, LayoutStrategy, MergeOptions};
pub use package::Package;
pub use patch::chart::{ChartCategory, ChartData, ChartSeries, ScatterData, ScatterSeries};
pub use patch::table::{TableData, TableRow};
pub use report::{CallbackOutcome, ImportReport, IntegrityIssue};
pub use shapes::{ElementImport, ElementSelector, Placement, ShapeCallback, ShapeKind};
pub use slide::{ImportedSlide, SlideCallback, SlideImport};
pub use template::{ElementInfo, SlideInfo, Template, TemplateInfo};

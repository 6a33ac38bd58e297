//! ooxml-splice - merge slides and elements across PowerPoint packages
//!
//! This library assembles presentations out of other presentations. Whole
//! slides, single shapes, charts, pictures, SmartArt diagrams, tables, OLE
//! objects, masters and layouts are copied from source templates into a
//! destination package while the package stays consistent:
//!
//! - **Relationship graphs**: every part the copied XML references is copied
//!   too and its relationship ids are rewritten
//! - **Part numbering**: copied parts are renumbered past the destination's
//!   own parts, so nothing is overwritten
//! - **Content types**: `[Content_Types].xml` follows every copy and removal
//! - **Caller data**: charts (with their embedded workbooks) and tables can be
//!   rewritten from plain data while they are imported
//!
//! # Example - Building a deck from templates
//!
//! ```no_run
//! use ooxml_splice::ooxml::pptx::{
//!     ElementImport, Merger, MergeOptions, ShapeCallback, SlideImport, TableData, TableRow, Template,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let brand = Template::open("brand.pptx")?;
//! let report_slides = Template::open("report.pptx")?;
//!
//! let options = MergeOptions::default().with_remove_existing_slides(true);
//! let mut merger = Merger::open("base.pptx", options)?;
//!
//! // Cover from the brand template, then two report slides
//! merger.import_slide(&brand, SlideImport::new(1))?;
//! merger.import_slides(&report_slides, [2, 4])?;
//!
//! // A filled table from the report template on the cover
//! let rows = TableData::new(vec![TableRow::texts(["Region", "Revenue"]), TableRow::texts(["EMEA", "4.3"])]);
//! merger.import_element(
//!     &report_slides,
//!     1,
//!     ElementImport::new(3, "Results Table").with_callback(ShapeCallback::table_data(rows)),
//! )?;
//!
//! let report = merger.save("quarterly.pptx")?;
//! println!("{} callbacks, {} failed", report.callbacks.len(), report.failed_callbacks().count());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Inspecting a template
//!
//! ```no_run
//! use ooxml_splice::ooxml::pptx::Template;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let template = Template::open("report.pptx")?;
//! for slide in template.inspect()?.slides {
//!     for element in slide.elements {
//!         println!("slide {}: {} ({:?})", slide.number, element.name, element.kind);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// OOXML (Office Open XML) packages
///
/// This module provides the XML tree, the OPC package layer and the
/// presentation merge engine.
pub mod ooxml;

// Re-export commonly used types for convenience
pub use ooxml::error::{MergeError, Result};
pub use ooxml::pptx::{
    ElementImport, ElementSelector, ImportReport, MergeOptions, Merger, Package, ShapeCallback, SlideImport,
    Template,
};

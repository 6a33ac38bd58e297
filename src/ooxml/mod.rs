//! Office Open XML (OOXML) packages.
//!
//! The module is organized into layers:
//!
//! 1. **XML Layer** (`xml`): an editable arena tree for package parts
//! 2. **OPC Layer** (`opc`): the zip container, content types, pack URIs and
//!    relationship parts
//! 3. **Presentation Layer** (`pptx`): slide, element, master and layout
//!    imports between presentation packages
//!
//! # Example: Merging Presentations
//!
//! ```rust,no_run
//! use ooxml_splice::ooxml::pptx::{Merger, MergeOptions, SlideImport, Template};
//!
//! let intro = Template::open("intro.pptx")?;
//! let mut merger = Merger::open("deck.pptx", MergeOptions::default())?;
//! merger.import_slide(&intro, SlideImport::new(1).at(0))?;
//! merger.save("deck-with-intro.pptx")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod error;
pub mod opc;
pub mod pptx;
pub mod xml;

// Re-export commonly used types from OPC layer
pub use opc::{Archive, PackURI, PackageArchive, Relationships};

// Re-export error types
pub use error::{MergeError, Result};

/// Open Packaging Conventions (OPC) implementation.
///
/// Only the parts of the OPC specification a package merge needs:
///
/// - The physical zip container behind the [`Archive`] trait
/// - `[Content_Types].xml` defaults and overrides
/// - Pack URIs and relative relationship references
/// - Relationship parts with id allocation
///
/// # Performance Features
///
/// - Uses `atoi_simd` for fast rId and part number parsing
/// - Uses `quick-xml` for XML parsing
/// - Uses compile-time `phf` tables for extension lookups
/// - Keeps parsed trees of written parts instead of re-parsing them

pub mod constants;
pub mod content_types;
pub mod error;
pub mod packuri;
pub mod phys_pkg;
pub mod rel;

// Re-export commonly used types
pub use content_types::ContentTypes;
pub use packuri::PackURI;
pub use phys_pkg::{Archive, PackageArchive};
pub use rel::{Relationships, Target};

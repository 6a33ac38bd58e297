//! In-memory XML trees for package parts.
//!
//! Parts are parsed into an [`XmlDocument`] arena, edited through node
//! handles and serialized back when the package is written.

pub mod dom;

pub use dom::{Attribute, NodeId, XmlDocument, XML_DECLARATION};

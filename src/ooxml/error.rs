/// Error types for merge operations.
use crate::ooxml::pptx::counter::PartFamily;
use thiserror::Error;

/// Result type for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Error types for merge operations.
#[derive(Error, Debug)]
pub enum MergeError {
    /// OPC package error
    #[error("OPC error: {0}")]
    Opc(#[from] crate::ooxml::opc::error::OpcError),

    /// A referenced part, relationship, slide or element does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller data needs more siblings than the template can provide
    #[error("Cannot materialize <{tag}> for '{label}': no template sibling to clone")]
    SchemaShape { tag: String, label: String },

    /// Counter requested for a family name we do not know
    #[error("Unknown counter: {0}")]
    UnknownCounter(String),

    /// Counter used before the package was scanned
    #[error("Counter for {0:?} used before initialization")]
    CounterNotInitialized(PartFamily),

    /// Produced by caller callbacks; collected into the import report
    #[error("Callback failed: {0}")]
    Callback(String),

    /// XML structure error
    #[error("XML error: {0}")]
    Xml(String),
}

impl MergeError {
    pub(crate) fn not_found(what: impl std::fmt::Display) -> Self {
        MergeError::NotFound(what.to_string())
    }
}

impl From<quick_xml::Error> for MergeError {
    fn from(err: quick_xml::Error) -> Self {
        MergeError::Xml(err.to_string())
    }
}

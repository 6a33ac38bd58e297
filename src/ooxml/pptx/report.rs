//! Structured record of what happened during a merge.
//!
//! Hard failures abort an import and come back as `Err`. Everything that is
//! tolerated instead (failing caller callbacks, dangling relationships,
//! dropped relationships) is collected here so callers can inspect it.

use tracing::warn;

/// Outcome of one caller callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    /// Part the callback ran against
    pub part: String,
    /// Element name or other label identifying the target
    pub target: String,
    /// Position of the callback in its list
    pub index: usize,
    /// `None` when the callback succeeded
    pub error: Option<String>,
}

impl CallbackOutcome {
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// A consistency problem found by an integrity scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// An internal relationship points at a part that does not exist
    MissingPart {
        rels: String,
        r_id: String,
        target: String,
    },
    /// A missing part was copied from the source under a new name
    Repaired {
        rels: String,
        r_id: String,
        from: String,
        to: String,
    },
    /// A content type override names a part that does not exist
    OrphanOverride { part: String },
    /// A part has neither an override nor an extension default
    MissingContentType { part: String },
}

/// Everything tolerated during one or more imports.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub callbacks: Vec<CallbackOutcome>,
    pub integrity: Vec<IntegrityIssue>,
    /// Relationships removed from copied parts, as `(rels part, type)`
    pub dropped_relations: Vec<(String, String)>,
    /// Parts deleted by orphan pruning
    pub pruned_parts: Vec<String>,
}

impl ImportReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a callback result, logging failures.
    pub fn record_callback(
        &mut self,
        part: &str,
        target: &str,
        index: usize,
        result: crate::ooxml::error::Result<()>,
    ) {
        let error = result.err().map(|e| e.to_string());
        if let Some(err) = &error {
            warn!(part, target, index, error = %err, "modification callback failed");
        }
        self.callbacks.push(CallbackOutcome {
            part: part.to_string(),
            target: target.to_string(),
            index,
            error,
        });
    }

    pub fn failed_callbacks(&self) -> impl Iterator<Item = &CallbackOutcome> {
        self.callbacks.iter().filter(|c| !c.is_ok())
    }

    pub fn has_failures(&self) -> bool {
        self.failed_callbacks().next().is_some()
    }

    pub fn merge(&mut self, other: ImportReport) {
        self.callbacks.extend(other.callbacks);
        self.integrity.extend(other.integrity);
        self.dropped_relations.extend(other.dropped_relations);
        self.pruned_parts.extend(other.pruned_parts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::error::MergeError;

    #[test]
    fn test_record_callback() {
        let mut report = ImportReport::new();
        report.record_callback("ppt/slides/slide2.xml", "Title 1", 0, Ok(()));
        report.record_callback(
            "ppt/slides/slide2.xml",
            "Title 1",
            1,
            Err(MergeError::Callback("bad color".into())),
        );
        assert_eq!(report.callbacks.len(), 2);
        assert!(report.has_failures());
        let failed: Vec<_> = report.failed_callbacks().collect();
        assert_eq!(failed[0].index, 1);
        assert!(failed[0].error.as_deref().unwrap().contains("bad color"));
    }
}

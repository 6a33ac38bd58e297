/// Configuration types for merging presentations.
///
/// These options control how slides are attached to layouts in the
/// destination, what happens to the destination's own slides, and how the
/// post-import integrity scan reacts to dangling relationships.
use serde::{Deserialize, Serialize};

/// Reaction to relationships that point at parts missing from the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityMode {
    /// Skip the scan
    Off,
    /// Log and record every finding
    #[default]
    Report,
    /// Copy the missing part from the source under a suffixed name and
    /// relink the relationship
    Assert,
}

/// How an imported slide finds its layout in the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStrategy {
    /// Keep the source layout path when the destination has it, else use
    /// the first destination layout
    KeepTarget,
    /// Use the destination layout with the same name as the source layout
    #[default]
    ByName,
    /// Import the source master with all its layouts and use the copy
    Import,
}

/// Configuration options for a merge.
///
/// # Examples
///
/// ```rust
/// use ooxml_splice::ooxml::pptx::{IntegrityMode, LayoutStrategy, MergeOptions};
///
/// let options = MergeOptions::new()
///     .with_integrity(IntegrityMode::Assert)
///     .with_layout_strategy(LayoutStrategy::Import)
///     .with_remove_existing_slides(true);
/// assert!(options.remove_existing_slides);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Integrity scan after each slide import
    pub integrity: IntegrityMode,
    /// Layout resolution for imported slides
    pub layout_strategy: LayoutStrategy,
    /// Drop the destination's own slides before the first import
    pub remove_existing_slides: bool,
    /// Delete unreferenced media, charts, embeddings and diagrams on finish
    pub prune_orphans: bool,
    /// Derive repair suffixes from a hash instead of random bytes
    pub reproducible_suffixes: bool,
    /// Remove notes, comments and tags relationships from copied slides
    pub drop_unsupported_relations: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            integrity: IntegrityMode::Report,
            layout_strategy: LayoutStrategy::ByName,
            remove_existing_slides: false,
            prune_orphans: false,
            reproducible_suffixes: false,
            drop_unsupported_relations: true,
        }
    }
}

impl MergeOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_integrity(mut self, mode: IntegrityMode) -> Self {
        self.integrity = mode;
        self
    }

    #[inline]
    pub fn with_layout_strategy(mut self, strategy: LayoutStrategy) -> Self {
        self.layout_strategy = strategy;
        self
    }

    #[inline]
    pub fn with_remove_existing_slides(mut self, remove: bool) -> Self {
        self.remove_existing_slides = remove;
        self
    }

    #[inline]
    pub fn with_prune_orphans(mut self, prune: bool) -> Self {
        self.prune_orphans = prune;
        self
    }

    /// Make integrity repairs produce the same part names on every run.
    #[inline]
    pub fn with_reproducible_suffixes(mut self, reproducible: bool) -> Self {
        self.reproducible_suffixes = reproducible;
        self
    }

    #[inline]
    pub fn with_drop_unsupported_relations(mut self, drop: bool) -> Self {
        self.drop_unsupported_relations = drop;
        self
    }
}

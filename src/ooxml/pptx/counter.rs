//! Per-package part number allocation.
//!
//! Every newly created part gets a number one above the highest number of
//! its family already present in the destination package. The package is
//! scanned once, on [`CounterAllocator::initialize`]; after that numbers are
//! only handed out, never released, so the sequence for one family is
//! strictly increasing for the lifetime of the package handle.

use crate::ooxml::error::{MergeError, Result};
use crate::ooxml::opc::packuri::{file_stem, trailing_number};
use crate::ooxml::opc::phys_pkg::Archive;
use std::str::FromStr;
use tracing::debug;

/// A family of numbered parts sharing one counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartFamily {
    Slide,
    Chart,
    Image,
    Master,
    Layout,
    Theme,
    OleObject,
    Diagram,
}

impl PartFamily {
    pub const ALL: [PartFamily; 8] = [
        PartFamily::Slide,
        PartFamily::Chart,
        PartFamily::Image,
        PartFamily::Master,
        PartFamily::Layout,
        PartFamily::Theme,
        PartFamily::OleObject,
        PartFamily::Diagram,
    ];

    /// Name used in logs and accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            PartFamily::Slide => "slides",
            PartFamily::Chart => "charts",
            PartFamily::Image => "images",
            PartFamily::Master => "masters",
            PartFamily::Layout => "layouts",
            PartFamily::Theme => "themes",
            PartFamily::OleObject => "oleObjects",
            PartFamily::Diagram => "diagrams",
        }
    }

    /// Folder scanned for existing parts, and the filename stems counted.
    /// An empty stem list counts every numbered file in the folder.
    fn scan_rule(self) -> (&'static str, &'static [&'static str]) {
        match self {
            PartFamily::Slide => ("ppt/slides", &["slide"]),
            PartFamily::Chart => ("ppt/charts", &["chart", "chartEx", "colors", "style"]),
            // Audio and video share the media folder and the counter
            PartFamily::Image => ("ppt/media", &[]),
            PartFamily::Master => ("ppt/slideMasters", &["slideMaster"]),
            PartFamily::Layout => ("ppt/slideLayouts", &["slideLayout"]),
            PartFamily::Theme => ("ppt/theme", &["theme", "themeOverride"]),
            PartFamily::OleObject => ("ppt/embeddings", &[]),
            PartFamily::Diagram => (
                "ppt/diagrams",
                &["data", "layout", "quickStyle", "colors", "drawing"],
            ),
        }
    }

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

impl FromStr for PartFamily {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self> {
        PartFamily::ALL
            .into_iter()
            .find(|family| family.name() == s)
            .ok_or_else(|| MergeError::UnknownCounter(s.to_string()))
    }
}

impl std::fmt::Display for PartFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Monotonic counters for one destination package.
#[derive(Debug, Default, Clone)]
pub struct CounterAllocator {
    counts: Option<[u32; PartFamily::ALL.len()]>,
}

impl CounterAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the package for the highest number in use per family.
    ///
    /// Only the first call scans; later calls keep the running counts.
    pub fn initialize(&mut self, archive: &dyn Archive) {
        if self.counts.is_some() {
            return;
        }
        let mut counts = [0u32; PartFamily::ALL.len()];
        for family in PartFamily::ALL {
            counts[family.slot()] = highest_number(archive, family);
            debug!(
                package = archive.label(),
                family = %family,
                count = counts[family.slot()],
                "counter initialized"
            );
        }
        self.counts = Some(counts);
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.counts.is_some()
    }

    /// Next unused number of a family.
    pub fn increment(&mut self, family: PartFamily) -> Result<u32> {
        let counts = self
            .counts
            .as_mut()
            .ok_or(MergeError::CounterNotInitialized(family))?;
        counts[family.slot()] += 1;
        Ok(counts[family.slot()])
    }

    /// [`increment`](Self::increment) by family name.
    pub fn increment_named(&mut self, name: &str) -> Result<u32> {
        self.increment(name.parse()?)
    }

    /// Highest number handed out or found so far.
    pub fn current(&self, family: PartFamily) -> Result<u32> {
        self.counts
            .as_ref()
            .map(|counts| counts[family.slot()])
            .ok_or(MergeError::CounterNotInitialized(family))
    }
}

fn highest_number(archive: &dyn Archive, family: PartFamily) -> u32 {
    let (folder, stems) = family.scan_rule();
    archive
        .folder(folder)
        .iter()
        .filter_map(|member| {
            let rest = &member[folder.len() + 1..];
            // Relationship parts live one level down and are not counted
            if rest.contains('/') {
                return None;
            }
            let stem = file_stem(rest);
            let base = stem.trim_end_matches(|c: char| c.is_ascii_digit());
            if !stems.is_empty() && !stems.contains(&base) {
                return None;
            }
            trailing_number(stem)
        })
        .max()
        .unwrap_or(0)
}

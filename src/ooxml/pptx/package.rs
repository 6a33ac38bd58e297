/// Package implementation for PowerPoint presentations.
use crate::ooxml::error::{MergeError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::content_types::ContentTypes;
use crate::ooxml::opc::phys_pkg::{Archive, PackageArchive};
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::pptx::counter::CounterAllocator;
use crate::ooxml::pptx::presentation;
use std::collections::HashMap;
use std::path::Path;

/// Source layouts already imported with their master, keyed by
/// `(template, layout member)`.
pub(crate) type LayoutMemo = HashMap<(String, String), String>;

/// A PowerPoint (.pptx) package.
///
/// Wraps an [`Archive`] together with the part counters of that package.
/// Both source templates and the merge destination are packages; only the
/// destination ever has its counters initialized.
///
/// # Examples
///
/// ```rust,no_run
/// use ooxml_splice::ooxml::pptx::Package;
///
/// let pkg = Package::open("deck.pptx")?;
/// println!("{} has {} slides", pkg.label(), pkg.slide_count()?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Package {
    archive: Box<dyn Archive>,
    counters: CounterAllocator,
    /// Member name of the main presentation part
    main_part: String,
    imported_layouts: LayoutMemo,
}

impl Package {
    /// Open a .pptx package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_archive(Box::new(PackageArchive::open(path)?))
    }

    /// Open a .pptx package held in memory.
    pub fn from_bytes(label: impl Into<String>, data: &[u8]) -> Result<Self> {
        Self::from_archive(Box::new(PackageArchive::from_bytes(label, data)?))
    }

    /// Wrap an archive, verifying that its main part is a presentation.
    pub fn from_archive(archive: Box<dyn Archive>) -> Result<Self> {
        let root_rels = Relationships::load(archive.as_ref(), "")?;
        let main = root_rels
            .targets_by_type(rt::OFFICE_DOCUMENT)
            .into_iter()
            .find(|t| t.rel_type == rt::OFFICE_DOCUMENT)
            .ok_or_else(|| {
                MergeError::not_found(format!("main presentation part in {}", archive.label()))
            })?;
        let main_part = main.part_uri(root_rels.base_uri())?.membername().to_string();

        // Support regular, macro-enabled and template presentations
        let content_types = ContentTypes::load(archive.as_ref())?;
        let content_type = content_types.content_type_of(&main_part).unwrap_or_default();
        if ![ct::PML_PRESENTATION_MAIN, ct::PML_PRES_MACRO_MAIN, ct::PML_TEMPLATE_MAIN]
            .contains(&content_type)
        {
            return Err(MergeError::Xml(format!(
                "{}: main part {} has content type '{}', expected a presentation",
                archive.label(),
                main_part,
                content_type
            )));
        }

        Ok(Self {
            archive,
            counters: CounterAllocator::new(),
            main_part,
            imported_layouts: LayoutMemo::new(),
        })
    }

    #[inline]
    pub fn label(&self) -> &str {
        self.archive.label()
    }

    /// Member name of the presentation part (`ppt/presentation.xml`).
    #[inline]
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    #[inline]
    pub fn archive(&self) -> &dyn Archive {
        self.archive.as_ref()
    }

    #[inline]
    pub fn archive_mut(&mut self) -> &mut dyn Archive {
        self.archive.as_mut()
    }

    #[inline]
    pub fn counters(&self) -> &CounterAllocator {
        &self.counters
    }

    /// Scan the package for part numbers in use. Idempotent.
    pub fn initialize_counters(&mut self) {
        self.counters.initialize(self.archive.as_ref());
    }

    /// Archive, counters and the layout memo borrowed together for an import.
    pub(crate) fn split_mut(&mut self) -> (&mut dyn Archive, &mut CounterAllocator, &mut LayoutMemo) {
        (self.archive.as_mut(), &mut self.counters, &mut self.imported_layouts)
    }

    /// Slide parts in presentation order.
    pub fn slide_parts(&self) -> Result<Vec<String>> {
        presentation::slide_parts(self.archive(), &self.main_part)
    }

    /// Member name of a slide by its 1-based position.
    pub fn slide_part(&self, number: usize) -> Result<String> {
        self.slide_parts()?
            .into_iter()
            .nth(number.wrapping_sub(1))
            .ok_or_else(|| MergeError::not_found(format!("slide {} in {}", number, self.label())))
    }

    pub fn slide_count(&self) -> Result<usize> {
        Ok(self.slide_parts()?.len())
    }

    /// Slide master parts in list order.
    pub fn master_parts(&self) -> Result<Vec<String>> {
        presentation::master_parts(self.archive(), &self.main_part)
    }

    /// Serialize the package.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.archive.to_bytes()?)
    }

    /// Write the package to disk.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?).map_err(crate::ooxml::opc::error::OpcError::from)?;
        Ok(())
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("label", &self.label())
            .field("main_part", &self.main_part)
            .field("counters", &self.counters)
            .finish()
    }
}

//! Merge entry point.
//!
//! A [`Merger`] owns the destination package for the whole merge. Every
//! operation opens an [`ImportContext`] over it, so imports into one
//! destination are strictly ordered; tolerated problems accumulate in one
//! [`ImportReport`] returned by [`Merger::finish`].

use crate::ooxml::error::{MergeError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::pptx::context::{ImportContext, SourcePart, TargetPart};
use crate::ooxml::pptx::integrity;
use crate::ooxml::pptx::layout;
use crate::ooxml::pptx::master::{self, ImportedMaster};
use crate::ooxml::pptx::options::{IntegrityMode, MergeOptions};
use crate::ooxml::pptx::package::Package;
use crate::ooxml::pptx::presentation;
use crate::ooxml::pptx::report::ImportReport;
use crate::ooxml::pptx::shapes::{self, ElementImport, ElementSelector, ShapeCallback};
use crate::ooxml::pptx::slide::{self, ImportedSlide, SlideCallback, SlideImport};
use crate::ooxml::pptx::template::Template;
use std::path::Path;
use tracing::{debug, info};

/// Builds one output presentation from a destination package and any
/// number of source templates.
///
/// # Examples
///
/// ```rust,no_run
/// use ooxml_splice::ooxml::pptx::{ChartCategory, ChartData, ChartSeries, ElementImport, Merger,
///     MergeOptions, Package, ShapeCallback, SlideImport, Template};
///
/// let sales = Template::open("sales.pptx")?;
/// let mut merger = Merger::with_options(Package::open("base.pptx")?, MergeOptions::default());
///
/// merger.import_slide(&sales, SlideImport::new(2))?;
/// let data = ChartData::new()
///     .with_series(ChartSeries::new("2025"))
///     .with_category(ChartCategory::new("Q1", vec![Some(4.3)]))
///     .with_category(ChartCategory::new("Q2", vec![Some(2.5)]));
/// merger.import_element(
///     &sales,
///     1,
///     ElementImport::new(3, "Revenue").with_callback(ShapeCallback::chart_data(data)),
/// )?;
///
/// let report = merger.save("merged.pptx")?;
/// for failed in report.failed_callbacks() {
///     eprintln!("{} on {}: {:?}", failed.target, failed.part, failed.error);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Merger {
    package: Package,
    options: MergeOptions,
    report: ImportReport,
    /// Destination slides were already removed
    cleared: bool,
}

impl Merger {
    pub fn new(package: Package) -> Self {
        Self::with_options(package, MergeOptions::default())
    }

    pub fn with_options(package: Package, options: MergeOptions) -> Self {
        Self {
            package,
            options,
            report: ImportReport::new(),
            cleared: false,
        }
    }

    /// Open the destination from a file.
    pub fn open<P: AsRef<Path>>(path: P, options: MergeOptions) -> Result<Self> {
        Ok(Self::with_options(Package::open(path)?, options))
    }

    #[inline]
    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    #[inline]
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Everything tolerated so far.
    #[inline]
    pub fn report(&self) -> &ImportReport {
        &self.report
    }

    fn context(&mut self) -> Result<ImportContext<'_>> {
        ImportContext::new(&mut self.package, &mut self.report, &self.options)
    }

    /// Remove the destination's own slides once, before the first import.
    fn prepare(&mut self) -> Result<()> {
        if self.cleared || !self.options.remove_existing_slides {
            return Ok(());
        }
        self.cleared = true;
        let existing = self.package.slide_parts()?;
        let mut ctx = self.context()?;
        for part in &existing {
            delete_slide(&mut ctx, part)?;
        }
        ctx.finish();
        info!(count = existing.len(), "existing slides removed");
        Ok(())
    }

    fn dest_slide(&self, number: usize) -> Result<String> {
        self.package.slide_part(number)
    }

    /// Copy a slide from `template`. Returns where it landed.
    pub fn import_slide(&mut self, template: &Template, mut request: SlideImport) -> Result<ImportedSlide> {
        self.prepare()?;
        let mut ctx = self.context()?;
        let imported = slide::import_slide(&mut ctx, template, &mut request)?;
        ctx.finish();
        Ok(imported)
    }

    /// Copy several slides from `template`, appended in the given order.
    pub fn import_slides<I>(&mut self, template: &Template, slides: I) -> Result<Vec<ImportedSlide>>
    where
        I: IntoIterator<Item = usize>,
    {
        slides
            .into_iter()
            .map(|number| self.import_slide(template, SlideImport::new(number)))
            .collect()
    }

    /// Import one element of `template` onto destination slide `dest_slide`
    /// (1-based).
    pub fn import_element(
        &mut self,
        template: &Template,
        dest_slide: usize,
        mut request: ElementImport,
    ) -> Result<()> {
        self.prepare()?;
        let member = self.dest_slide(dest_slide)?;
        let source = SourcePart::slide(template, request.slide)?;
        let mut ctx = self.context()?;
        let mut target = TargetPart::load(ctx.archive, &member)?;
        shapes::import_element(&mut ctx, &source, &mut target, &mut request)?;
        target.store(ctx.archive);
        integrity::check_imported(&mut ctx, template, &member)?;
        ctx.finish();
        info!(element = %request.selector, from = %source.member, to = %member, "element imported");
        Ok(())
    }

    /// Run callbacks against an element already on a destination slide.
    pub fn modify_element(
        &mut self,
        dest_slide: usize,
        selector: impl Into<ElementSelector>,
        mut callbacks: Vec<ShapeCallback>,
    ) -> Result<()> {
        let member = self.dest_slide(dest_slide)?;
        let selector = selector.into();
        let mut ctx = self.context()?;
        let mut target = TargetPart::load(ctx.archive, &member)?;
        shapes::modify_element(&mut ctx, &mut target, &selector, &mut callbacks)?;
        target.store(ctx.archive);
        ctx.finish();
        Ok(())
    }

    /// Run slide callbacks against a destination slide.
    pub fn modify_slide(&mut self, dest_slide: usize, mut callbacks: Vec<SlideCallback>) -> Result<()> {
        let member = self.dest_slide(dest_slide)?;
        let mut ctx = self.context()?;
        let mut target = TargetPart::load(ctx.archive, &member)?;
        slide::run_slide_callbacks(&mut ctx, &mut target, &mut callbacks);
        target.store(ctx.archive);
        ctx.finish();
        Ok(())
    }

    /// Remove an element from a destination slide.
    pub fn remove_element(&mut self, dest_slide: usize, selector: impl Into<ElementSelector>) -> Result<()> {
        let member = self.dest_slide(dest_slide)?;
        let mut target = TargetPart::load(self.package.archive(), &member)?;
        shapes::remove_element(&mut target, &selector.into())?;
        target.store(self.package.archive_mut());
        Ok(())
    }

    /// Remove a destination slide. The parts only it used stay until
    /// orphan pruning.
    pub fn remove_slide(&mut self, dest_slide: usize) -> Result<()> {
        let member = self.dest_slide(dest_slide)?;
        let mut ctx = self.context()?;
        delete_slide(&mut ctx, &member)?;
        ctx.finish();
        Ok(())
    }

    /// Copy a master with its theme and layouts.
    pub fn import_master(&mut self, template: &Template, source_master: &str) -> Result<ImportedMaster> {
        let mut ctx = self.context()?;
        let imported = master::import_master(&mut ctx, template, source_master)?;
        integrity::check_imported(&mut ctx, template, &imported.master)?;
        ctx.finish();
        Ok(imported)
    }

    /// Copy one layout into an existing destination master.
    pub fn import_layout(&mut self, template: &Template, source_layout: &str, dest_master: &str) -> Result<String> {
        let mut ctx = self.context()?;
        let imported = layout::import_layout(&mut ctx, template, source_layout, dest_master)?;
        integrity::check_imported(&mut ctx, template, &imported)?;
        ctx.finish();
        Ok(imported)
    }

    /// Prune and scan the destination, then hand it back with the report.
    pub fn finish(mut self) -> Result<(Package, ImportReport)> {
        self.prepare()?;
        if self.options.prune_orphans {
            let pruned = integrity::prune_orphans(self.package.archive_mut())?;
            self.report.pruned_parts.extend(pruned);
        }
        if self.options.integrity != IntegrityMode::Off {
            for issue in integrity::analyze(self.package.archive())? {
                if !self.report.integrity.contains(&issue) {
                    self.report.integrity.push(issue);
                }
            }
        }
        debug!(
            package = self.package.label(),
            callbacks = self.report.callbacks.len(),
            integrity = self.report.integrity.len(),
            "merge finished"
        );
        Ok((self.package, self.report))
    }

    /// Finish and write the destination to disk.
    pub fn save<P: AsRef<Path>>(self, path: P) -> Result<ImportReport> {
        let (package, report) = self.finish()?;
        package.save(path)?;
        Ok(report)
    }
}

impl std::fmt::Debug for Merger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Merger")
            .field("package", &self.package)
            .field("options", &self.options)
            .finish()
    }
}

/// Unlist a slide and delete its part and relationships.
fn delete_slide(ctx: &mut ImportContext<'_>, part: &str) -> Result<()> {
    if !ctx.archive.file_exists(part) {
        return Err(MergeError::not_found(format!("slide {} in {}", part, ctx.archive.label())));
    }
    presentation::remove_slide(ctx.archive, &ctx.main_part, part)?;
    let rels = PackURI::from_member(part).rels_uri();
    ctx.archive.remove(rels.membername());
    ctx.archive.remove(part);
    ctx.content_types.remove_override(part);
    debug!(part, "slide deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::patch::chart::{ChartCategory, ChartData, ChartSeries};
    use crate::ooxml::pptx::report::IntegrityIssue;
    use crate::ooxml::pptx::test_support::PackageBuilder;

    #[test]
    fn test_merge_two_templates() {
        let sales = PackageBuilder::new("sales").chart_slide("Revenue").template();
        let brand = PackageBuilder::new("brand").image_slide("Logo").template();
        let base = PackageBuilder::new("base").slide("Cover").package();
        let mut merger = Merger::new(base);

        merger.import_slide(&sales, SlideImport::new(1)).unwrap();
        merger.import_slide(&brand, SlideImport::new(1)).unwrap();
        merger
            .import_element(&brand, 2, ElementImport::new(1, "Logo").replacing("Title 1"))
            .unwrap();

        let (package, report) = merger.finish().unwrap();
        assert_eq!(package.slide_count().unwrap(), 3);
        assert!(report.integrity.is_empty(), "{:?}", report.integrity);
        assert!(!report.has_failures());
        let doc = package.archive().read_xml("ppt/slides/slide2.xml").unwrap();
        assert!(ElementSelector::name("Title 1").find(&doc).is_none());
        assert_eq!(integrity::analyze(package.archive()).unwrap(), Vec::new());
    }

    #[test]
    fn test_remove_existing_slides_and_prune() {
        let sales = PackageBuilder::new("sales").chart_slide("Revenue").template();
        let base = PackageBuilder::new("base").chart_slide("Old").package();
        let options = MergeOptions::default()
            .with_remove_existing_slides(true)
            .with_prune_orphans(true);
        let mut merger = Merger::with_options(base, options);

        // numbers are never reused, even after the old slide is gone
        let imported = merger.import_slide(&sales, SlideImport::new(1)).unwrap();
        assert_eq!(imported.part, "ppt/slides/slide2.xml");
        let (package, report) = merger.finish().unwrap();

        assert_eq!(package.slide_parts().unwrap(), vec!["ppt/slides/slide2.xml"]);
        assert!(!package.archive().file_exists("ppt/slides/slide1.xml"));
        assert!(report.pruned_parts.contains(&"ppt/charts/chart1.xml".to_string()));
        assert!(package.archive().file_exists("ppt/charts/chart2.xml"));
        assert_eq!(integrity::analyze(package.archive()).unwrap(), Vec::new());
    }

    #[test]
    fn test_chart_data_callback_failure_is_reported() {
        let sales = PackageBuilder::new("sales").chart_slide("Revenue").template();
        let base = PackageBuilder::new("base").slide("Cover").package();
        let mut merger = Merger::new(base);

        let data = ChartData::new()
            .with_series(ChartSeries::new("s1"))
            .with_category(ChartCategory::new("c1", vec![Some(1.0)]));
        merger
            .import_element(
                &sales,
                1,
                ElementImport::new(1, "Revenue").with_callback(ShapeCallback::chart_data(data)),
            )
            .unwrap();
        merger
            .modify_element(1, "Title 1", vec![ShapeCallback::chart_data(ChartData::new())])
            .unwrap();
        assert_eq!(merger.report().callbacks.len(), 2);
        assert_eq!(merger.report().failed_callbacks().count(), 1);
    }

    #[test]
    fn test_missing_destination_slide() {
        let sales = PackageBuilder::new("sales").chart_slide("Revenue").template();
        let mut merger = Merger::new(PackageBuilder::new("base").slide("Cover").package());
        let err = merger
            .import_element(&sales, 4, ElementImport::new(1, "Revenue"))
            .unwrap_err();
        assert!(matches!(err, MergeError::NotFound(_)));
        assert!(merger.remove_slide(9).is_err());
    }

    #[test]
    fn test_remove_slide_reports_dangling_until_pruned() {
        let mut merger = Merger::new(PackageBuilder::new("base").chart_slide("Old").slide("Two").package());
        merger.remove_slide(1).unwrap();
        merger.modify_slide(1, vec![SlideCallback::slide(|_| Ok(()))]).unwrap();
        let (package, report) = merger.finish().unwrap();
        assert_eq!(package.slide_count().unwrap(), 1);
        assert!(!report.integrity.iter().any(|i| matches!(i, IntegrityIssue::MissingPart { .. })));
        assert!(package.archive().file_exists("ppt/charts/chart1.xml"));
    }

    #[test]
    fn test_save_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged.pptx");
        let sales = PackageBuilder::new("sales").chart_slide("Revenue").template();
        let mut merger = Merger::new(PackageBuilder::new("base").slide("Cover").package());
        merger.import_slides(&sales, [1, 1]).unwrap();
        merger.save(&path).unwrap();

        let reopened = Package::open(&path).unwrap();
        assert_eq!(reopened.slide_count().unwrap(), 3);
        assert!(reopened.archive().file_exists("ppt/charts/chart2.xml"));
    }
}

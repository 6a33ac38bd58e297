/// Chart graphic frames.
///
/// The frame's `c:chart` (or `cx:chart`) reference is followed to the chart
/// part, which is copied with its whole bundle. Chart callbacks then get the
/// copied chart and its embedded workbook opened as a nested package.
use crate::ooxml::error::{MergeError, Result};
use crate::ooxml::opc::phys_pkg::Archive;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::pptx::context::{ImportContext, SourcePart, TargetPart};
use crate::ooxml::pptx::parts::chart::{copy_chart, embedded_workbook};
use crate::ooxml::pptx::patch::worksheet::Workbook;
use crate::ooxml::pptx::shapes::{Prepared, ShapeImporter, ShapeKind, import_references, link_part};
use crate::ooxml::xml::{NodeId, XmlDocument};
use tracing::debug;

const CHART_TAGS: &[&str] = &["c:chart", "cx:chart"];

/// `r:id` of the chart reference inside a graphic frame.
pub fn chart_rel_id(doc: &XmlDocument, element: NodeId) -> Option<&str> {
    CHART_TAGS
        .iter()
        .find_map(|tag| doc.find_first(element, tag))
        .and_then(|c| doc.attr(c, "r:id"))
}

/// Chart part behind an element of a destination slide, if it is a chart.
pub(crate) fn chart_part_of(doc: &XmlDocument, element: NodeId, rels: &Relationships) -> Result<Option<String>> {
    let Some(r_id) = chart_rel_id(doc, element) else {
        return Ok(None);
    };
    let rel = rels.require(r_id)?;
    Ok(Some(rel.part_uri(rels.base_uri())?.membername().to_string()))
}

/// Load a chart and its embedded workbook, run `f`, and store both when it
/// succeeds.
pub(crate) fn with_chart<F>(archive: &mut dyn Archive, chart_part: &str, f: F) -> Result<()>
where
    F: FnOnce(&mut XmlDocument, &mut Workbook) -> Result<()>,
{
    let mut chart = archive.read_xml(chart_part)?;
    let rels = Relationships::load(archive, chart_part)?;
    let workbook_member = embedded_workbook(&rels)
        .ok_or_else(|| MergeError::not_found(format!("embedded workbook of {}", chart_part)))?
        .part_uri(rels.base_uri())?
        .membername()
        .to_string();
    let mut workbook = Workbook::open(archive.extract(&workbook_member)?)?;

    f(&mut chart, &mut workbook)?;

    archive.write_xml(chart_part, &chart);
    archive.write(&workbook_member, workbook.to_bytes()?);
    debug!(chart = chart_part, workbook = %workbook_member, "chart data stored");
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct ChartImporter;

impl ShapeImporter for ChartImporter {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Chart
    }

    fn prepare(
        &self,
        ctx: &mut ImportContext<'_>,
        source: &SourcePart<'_>,
        target: &mut TargetPart,
        element: NodeId,
    ) -> Result<Prepared> {
        let r_id = chart_rel_id(&source.doc, element)
            .ok_or_else(|| MergeError::not_found(format!("chart reference in {}", source.member)))?;
        let rel = source.rels.require(r_id)?;
        let member = rel.part_uri(source.rels.base_uri())?.membername().to_string();

        let chart = copy_chart(ctx, source.template, &member)?;
        let new_id = link_part(target, &rel.rel_type, &chart);
        debug!(from = %r_id, to = %new_id, chart = %chart, "chart linked");

        let mut prepared = Prepared {
            chart_part: Some(chart),
            ..Prepared::default()
        };
        prepared.rel_map.insert(r_id, new_id);
        import_references(ctx, source, target, element, &mut prepared.rel_map)?;
        Ok(prepared)
    }
}

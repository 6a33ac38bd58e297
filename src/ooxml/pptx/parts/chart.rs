/// Chart part bundles.
///
/// A chart is the chart XML plus its style and color-style parts, optional
/// user shapes, images and theme override, and usually an embedded workbook
/// holding the chart data. All of it is copied together under one new chart
/// number.
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::rel::{Relationships, Target, TargetSubtype};
use crate::ooxml::pptx::context::ImportContext;
use crate::ooxml::pptx::counter::PartFamily;
use crate::ooxml::pptx::parts::{RelAction, copy_generic, copy_part, copy_relationships};
use crate::ooxml::pptx::template::Template;
use tracing::debug;

/// Filename prefixes producers use for embedded chart workbooks.
pub const EMBEDDED_WORKBOOK_PREFIXES: &[&str] = &[
    "../embeddings/Microsoft_Excel_Worksheet",
    "../embeddings/Microsoft_Excel_Sheet",
    "../embeddings/Microsoft_Office_Excel_Worksheet",
];

/// The embedded workbook a chart's relationships point at, if any.
pub fn embedded_workbook(rels: &Relationships) -> Option<Target> {
    rels.targets_by_prefix(EMBEDDED_WORKBOOK_PREFIXES)
        .into_iter()
        .find(|t| {
            !t.is_external && matches!(t.subtype, TargetSubtype::Package | TargetSubtype::OleObject)
        })
}

/// Copy a chart and everything it links to. Returns the new chart member.
pub(crate) fn copy_chart(
    ctx: &mut ImportContext<'_>,
    source: &Template,
    source_member: &str,
) -> Result<String> {
    let source_uri = PackURI::from_member(source_member);
    let stem = source_uri
        .filename()
        .trim_end_matches(".xml")
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_string();
    let stem = if stem == "chartEx" { "chartEx" } else { "chart" };

    let number = ctx.counters.increment(PartFamily::Chart)?;
    let dest = format!("ppt/charts/{}{}.xml", stem, number);
    copy_part(ctx, source, source_member, &dest)?;

    let source_rels = Relationships::load(source.archive(), source_member)?;
    let workbook_rid = embedded_workbook(&source_rels).map(|t| t.r_id);

    copy_relationships(ctx, source, source_member, &dest, |ctx, target, member| {
        let action = match target.rel_type.as_str() {
            rt::CHART_STYLE => {
                let style = format!("ppt/charts/style{}.xml", number);
                copy_part(ctx, source, member, &style)?;
                RelAction::Retarget(style)
            },
            rt::CHART_COLOR_STYLE => {
                let colors = format!("ppt/charts/colors{}.xml", number);
                copy_part(ctx, source, member, &colors)?;
                RelAction::Retarget(colors)
            },
            _ if Some(&target.r_id) == workbook_rid.as_ref() => {
                RelAction::Retarget(copy_embedding(ctx, source, member, "Microsoft_Excel_Worksheet")?)
            },
            rt::PACKAGE | rt::OLE_OBJECT => {
                RelAction::Retarget(copy_embedding(ctx, source, member, "oleObject")?)
            },
            rt::CHART_USER_SHAPES => RelAction::Retarget(copy_generic(ctx, source, member)?),
            _ => RelAction::Default,
        };
        Ok(action)
    })?;

    debug!(from = source_member, to = %dest, number, "chart copied");
    Ok(dest)
}

/// Copy an embedded package or OLE binary as `ppt/embeddings/<stem>N.<ext>`.
pub(crate) fn copy_embedding(
    ctx: &mut ImportContext<'_>,
    source: &Template,
    source_member: &str,
    stem: &str,
) -> Result<String> {
    let ext = match PackURI::from_member(source_member).ext() {
        "" => "bin".to_string(),
        ext => ext.to_string(),
    };
    let number = ctx.counters.increment(PartFamily::OleObject)?;
    let dest = format!("ppt/embeddings/{}{}.{}", stem, number, ext);
    copy_part(ctx, source, source_member, &dest)?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::content_type as ct;
    use crate::ooxml::pptx::options::MergeOptions;
    use crate::ooxml::pptx::report::ImportReport;
    use crate::ooxml::pptx::test_support::PackageBuilder;

    #[test]
    fn test_copy_chart_bundle() {
        let source = PackageBuilder::new("src").chart_slide("Sales").template();
        let mut dest = PackageBuilder::new("dest").chart_slide("Old").package();
        let mut report = ImportReport::new();
        let options = MergeOptions::default();
        let mut ctx = ImportContext::new(&mut dest, &mut report, &options).unwrap();

        let chart = copy_chart(&mut ctx, &source, "ppt/charts/chart1.xml").unwrap();
        assert_eq!(chart, "ppt/charts/chart2.xml");
        assert!(ctx.archive.file_exists("ppt/charts/style2.xml"));
        assert!(ctx.archive.file_exists("ppt/charts/colors2.xml"));
        assert_eq!(ctx.content_types.content_type_of(&chart), Some(ct::DML_CHART));

        let rels = Relationships::load(ctx.archive, &chart).unwrap();
        let workbook = embedded_workbook(&rels).unwrap();
        assert_eq!(workbook.file, "../embeddings/Microsoft_Excel_Worksheet2.xlsx");
        assert!(ctx.archive.file_exists("ppt/embeddings/Microsoft_Excel_Worksheet2.xlsx"));
    }
}

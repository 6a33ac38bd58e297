//! Synthetic presentation packages for unit tests.
//!
//! [`PackageBuilder`] assembles a small but complete presentation: one master
//! with two layouts and a theme, extended properties, and one slide per
//! builder call. Each slide kind adds a single element (chart, picture,
//! diagram, hyperlinked shape with a table, OLE object) with all of its parts,
//! so every package it builds passes the integrity scan.
//!
//! Member numbering is predictable: slides follow call order, and media,
//! charts, diagrams and embeddings are numbered package-wide in the order
//! they are created.

use crate::ooxml::opc::constants::{content_type as ct, namespace as ns, relationship_type as rt};
use crate::ooxml::opc::phys_pkg::{Archive, PackageArchive};
use crate::ooxml::pptx::package::Package;
use crate::ooxml::pptx::template::Template;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const PML_NAMESPACES: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" "#,
    r#"xmlns:a16="http://schemas.microsoft.com/office/drawing/2014/main" "#,
    r#"xmlns:asvg="http://schemas.microsoft.com/office/drawing/2016/SVG/main" "#,
    r#"xmlns:dgm="http://schemas.openxmlformats.org/drawingml/2006/diagram" "#,
    r#"xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" "#,
    r#"xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006""#,
);

const EXTENDED_PROPERTIES: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";
const SML_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const LINK_URL: &str = "https://example.com/";

/// A one-series clustered bar chart bound to [`workbook_bytes`].
pub const BAR_CHART_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    r#"<c:chart><c:autoTitleDeleted val="1"/><c:plotArea><c:layout/>"#,
    r#"<c:barChart><c:barDir val="col"/><c:grouping val="clustered"/><c:varyColors val="0"/>"#,
    r#"<c:ser><c:idx val="0"/><c:order val="0"/>"#,
    r#"<c:tx><c:strRef><c:f>Sheet1!$B$1</c:f><c:strCache><c:ptCount val="1"/>"#,
    r#"<c:pt idx="0"><c:v>Series 1</c:v></c:pt></c:strCache></c:strRef></c:tx>"#,
    r#"<c:invertIfNegative val="0"/>"#,
    r#"<c:cat><c:strRef><c:f>Sheet1!$A$2:$A$2</c:f><c:strCache><c:ptCount val="1"/>"#,
    r#"<c:pt idx="0"><c:v>Category 1</c:v></c:pt></c:strCache></c:strRef></c:cat>"#,
    r#"<c:val><c:numRef><c:f>Sheet1!$B$2:$B$2</c:f><c:numCache><c:formatCode>General</c:formatCode>"#,
    r#"<c:ptCount val="1"/><c:pt idx="0"><c:v>4.3</c:v></c:pt></c:numCache></c:numRef></c:val>"#,
    r#"</c:ser><c:gapWidth val="219"/><c:axId val="1"/><c:axId val="2"/></c:barChart>"#,
    r#"<c:catAx><c:axId val="1"/><c:crossAx val="2"/></c:catAx>"#,
    r#"<c:valAx><c:axId val="2"/><c:crossAx val="1"/></c:valAx>"#,
    r#"</c:plotArea><c:plotVisOnly val="1"/></c:chart>"#,
    r#"<c:externalData r:id="rId3"><c:autoUpdate val="0"/></c:externalData></c:chartSpace>"#,
);

/// A combo chart: one bar series and one line series sharing the axes.
pub const COMBO_CHART_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    r#"<c:chart><c:plotArea><c:layout/>"#,
    r#"<c:barChart><c:barDir val="col"/><c:grouping val="clustered"/><c:varyColors val="0"/>"#,
    r#"<c:ser><c:idx val="0"/><c:order val="0"/>"#,
    r#"<c:tx><c:strRef><c:f>Sheet1!$B$1</c:f><c:strCache><c:ptCount val="1"/>"#,
    r#"<c:pt idx="0"><c:v>Series 1</c:v></c:pt></c:strCache></c:strRef></c:tx>"#,
    r#"<c:invertIfNegative val="0"/>"#,
    r#"<c:cat><c:strRef><c:f>Sheet1!$A$2:$A$2</c:f><c:strCache><c:ptCount val="1"/>"#,
    r#"<c:pt idx="0"><c:v>Category 1</c:v></c:pt></c:strCache></c:strRef></c:cat>"#,
    r#"<c:val><c:numRef><c:f>Sheet1!$B$2:$B$2</c:f><c:numCache><c:formatCode>General</c:formatCode>"#,
    r#"<c:ptCount val="1"/><c:pt idx="0"><c:v>4.3</c:v></c:pt></c:numCache></c:numRef></c:val>"#,
    r#"</c:ser><c:gapWidth val="219"/><c:axId val="1"/><c:axId val="2"/></c:barChart>"#,
    r#"<c:lineChart><c:grouping val="standard"/><c:varyColors val="0"/>"#,
    r#"<c:ser><c:idx val="1"/><c:order val="1"/>"#,
    r#"<c:tx><c:strRef><c:f>Sheet1!$C$1</c:f><c:strCache><c:ptCount val="1"/>"#,
    r#"<c:pt idx="0"><c:v>Series 2</c:v></c:pt></c:strCache></c:strRef></c:tx>"#,
    r#"<c:marker><c:symbol val="none"/></c:marker>"#,
    r#"<c:cat><c:strRef><c:f>Sheet1!$A$2:$A$2</c:f><c:strCache><c:ptCount val="1"/>"#,
    r#"<c:pt idx="0"><c:v>Category 1</c:v></c:pt></c:strCache></c:strRef></c:cat>"#,
    r#"<c:val><c:numRef><c:f>Sheet1!$C$2:$C$2</c:f><c:numCache><c:formatCode>General</c:formatCode>"#,
    r#"<c:ptCount val="1"/><c:pt idx="0"><c:v>2.4</c:v></c:pt></c:numCache></c:numRef></c:val>"#,
    r#"<c:smooth val="0"/></c:ser><c:marker val="1"/><c:axId val="1"/><c:axId val="2"/></c:lineChart>"#,
    r#"<c:catAx><c:axId val="1"/><c:crossAx val="2"/></c:catAx>"#,
    r#"<c:valAx><c:axId val="2"/><c:crossAx val="1"/></c:valAx>"#,
    r#"</c:plotArea></c:chart></c:chartSpace>"#,
);

/// A one-series scatter chart.
pub const SCATTER_CHART_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    r#"<c:chart><c:plotArea><c:layout/>"#,
    r#"<c:scatterChart><c:scatterStyle val="lineMarker"/><c:varyColors val="0"/>"#,
    r#"<c:ser><c:idx val="0"/><c:order val="0"/>"#,
    r#"<c:tx><c:strRef><c:f>Sheet1!$B$1</c:f><c:strCache><c:ptCount val="1"/>"#,
    r#"<c:pt idx="0"><c:v>Y-Values</c:v></c:pt></c:strCache></c:strRef></c:tx>"#,
    r#"<c:xVal><c:numRef><c:f>Sheet1!$A$2:$A$2</c:f><c:numCache><c:formatCode>General</c:formatCode>"#,
    r#"<c:ptCount val="1"/><c:pt idx="0"><c:v>0.7</c:v></c:pt></c:numCache></c:numRef></c:xVal>"#,
    r#"<c:yVal><c:numRef><c:f>Sheet1!$B$2:$B$2</c:f><c:numCache><c:formatCode>General</c:formatCode>"#,
    r#"<c:ptCount val="1"/><c:pt idx="0"><c:v>2.7</c:v></c:pt></c:numCache></c:numRef></c:yVal>"#,
    r#"<c:smooth val="0"/></c:ser><c:axId val="1"/><c:axId val="2"/></c:scatterChart>"#,
    r#"<c:valAx><c:axId val="1"/><c:crossAx val="2"/></c:valAx>"#,
    r#"<c:valAx><c:axId val="2"/><c:crossAx val="1"/></c:valAx>"#,
    r#"</c:plotArea></c:chart><c:externalData r:id="rId3"/></c:chartSpace>"#,
);

/// Minimal workbook behind [`BAR_CHART_XML`]: `Sheet1` holding `B1` =
/// "Series 1", `A2` = "Category 1", `B2` = 4.3, with shared strings and a
/// table over `A1:B2`.
pub fn workbook_bytes() -> Vec<u8> {
    let mut archive = PackageArchive::new("book.xlsx");
    archive.write(
        "[Content_Types].xml",
        format!(
            r#"{XML_DECL}<Types xmlns="{}"><Default Extension="rels" ContentType="{}"/><Default Extension="xml" ContentType="{}"/><Override PartName="/xl/workbook.xml" ContentType="{}"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="{}"/><Override PartName="/xl/sharedStrings.xml" ContentType="{}"/><Override PartName="/xl/tables/table1.xml" ContentType="{}"/></Types>"#,
            ns::OPC_CONTENT_TYPES,
            ct::OPC_RELATIONSHIPS,
            ct::XML,
            ct::SML_SHEET_MAIN,
            ct::SML_WORKSHEET,
            ct::SML_SHARED_STRINGS,
            ct::SML_TABLE,
        )
        .into_bytes(),
    );
    archive.write(
        "_rels/.rels",
        rels_xml(&[Rel::internal("rId1", rt::OFFICE_DOCUMENT, "xl/workbook.xml")]).into_bytes(),
    );
    archive.write(
        "xl/workbook.xml",
        format!(
            r#"{XML_DECL}<workbook xmlns="{SML_NS}" xmlns:r="{}"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
            ns::OFC_RELATIONSHIPS
        )
        .into_bytes(),
    );
    archive.write(
        "xl/_rels/workbook.xml.rels",
        rels_xml(&[
            Rel::internal("rId1", rt::WORKSHEET, "worksheets/sheet1.xml"),
            Rel::internal("rId2", rt::SHARED_STRINGS, "sharedStrings.xml"),
        ])
        .into_bytes(),
    );
    archive.write(
        "xl/worksheets/sheet1.xml",
        format!(
            r#"{XML_DECL}<worksheet xmlns="{SML_NS}" xmlns:r="{}"><dimension ref="A1:B2"/><sheetData><row r="1" spans="1:2"><c r="B1" t="s"><v>0</v></c></row><row r="2" spans="1:2"><c r="A2" t="s"><v>1</v></c><c r="B2"><v>4.3</v></c></row></sheetData><tableParts count="1"><tablePart r:id="rId1"/></tableParts></worksheet>"#,
            ns::OFC_RELATIONSHIPS
        )
        .into_bytes(),
    );
    archive.write(
        "xl/worksheets/_rels/sheet1.xml.rels",
        rels_xml(&[Rel::internal("rId1", rt::TABLE, "../tables/table1.xml")]).into_bytes(),
    );
    archive.write(
        "xl/sharedStrings.xml",
        format!(
            r#"{XML_DECL}<sst xmlns="{SML_NS}" count="2" uniqueCount="2"><si><t>Series 1</t></si><si><t>Category 1</t></si></sst>"#
        )
        .into_bytes(),
    );
    archive.write(
        "xl/tables/table1.xml",
        format!(
            r#"{XML_DECL}<table xmlns="{SML_NS}" id="1" name="Table1" displayName="Table1" ref="A1:B2" totalsRowShown="0"><autoFilter ref="A1:B2"/><tableColumns count="2"><tableColumn id="1" name=" "/><tableColumn id="2" name="Series 1"/></tableColumns><tableStyleInfo name="TableStyleMedium2" showFirstColumn="0" showLastColumn="0" showRowStripes="1" showColumnStripes="0"/></table>"#
        )
        .into_bytes(),
    );
    archive.to_bytes().unwrap()
}

struct Rel {
    id: String,
    rel_type: &'static str,
    target: String,
    external: bool,
}

impl Rel {
    fn internal(id: impl Into<String>, rel_type: &'static str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rel_type,
            target: target.into(),
            external: false,
        }
    }

    fn external(id: impl Into<String>, rel_type: &'static str, target: impl Into<String>) -> Self {
        Self {
            external: true,
            ..Self::internal(id, rel_type, target)
        }
    }
}

fn rels_xml(rels: &[Rel]) -> String {
    let mut xml = format!(r#"{XML_DECL}<Relationships xmlns="{}">"#, ns::OPC_RELATIONSHIPS);
    for rel in rels {
        let mode = if rel.external { r#" TargetMode="External""# } else { "" };
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
            rel.id, rel.rel_type, rel.target, mode
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// `p:cNvPr` carrying a name, an id and a creation id.
fn non_visual(id: u32, name: &str, creation_id: &str, inner: &str) -> String {
    format!(
        r#"<p:cNvPr id="{id}" name="{name}">{inner}<a:extLst><a:ext uri="{{FF2B5EF4-FFF2-40B4-BE49-F238E27FC236}}"><a16:creationId id="{creation_id}"/></a:ext></a:extLst></p:cNvPr>"#
    )
}

fn frame(cnvpr: &str, uri: &str, data: &str) -> String {
    format!(
        r#"<p:graphicFrame><p:nvGraphicFramePr>{cnvpr}<p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="838200" y="1825625"/><a:ext cx="6096000" cy="4064000"/></p:xfrm><a:graphic><a:graphicData uri="{uri}">{data}</a:graphicData></a:graphic></p:graphicFrame>"#
    )
}

fn shape_tree(content: &str) -> String {
    format!(
        r#"<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{content}</p:spTree></p:cSld>"#
    )
}

enum SlideKind {
    Plain,
    Chart,
    Image,
    Diagram,
    Hyperlink,
    Ole,
    Jump,
}

struct SlideSpec {
    name: String,
    kind: SlideKind,
}

/// Running numbers of package-wide part families.
#[derive(Default)]
struct Numbers {
    media: u32,
    charts: u32,
    diagrams: u32,
    embeddings: u32,
}

impl Numbers {
    fn next(counter: &mut u32) -> u32 {
        *counter += 1;
        *counter
    }
}

/// Builds small presentation packages for tests.
pub struct PackageBuilder {
    name: String,
    slides: Vec<SlideSpec>,
}

impl PackageBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slides: Vec::new(),
        }
    }

    fn push(mut self, name: &str, kind: SlideKind) -> Self {
        self.slides.push(SlideSpec {
            name: name.to_string(),
            kind,
        });
        self
    }

    /// A slide with only a title shape holding `title`.
    pub fn slide(self, title: &str) -> Self {
        self.push(title, SlideKind::Plain)
    }

    /// A slide with a bar chart frame called `name` and its embedded workbook.
    pub fn chart_slide(self, name: &str) -> Self {
        self.push(name, SlideKind::Chart)
    }

    /// A slide with a PNG picture called `name` and its SVG variant.
    pub fn image_slide(self, name: &str) -> Self {
        self.push(name, SlideKind::Image)
    }

    /// A slide with a SmartArt frame called `name`.
    pub fn diagram_slide(self, name: &str) -> Self {
        self.push(name, SlideKind::Diagram)
    }

    /// A slide with a hyperlinked shape called `name` and a two-cell table
    /// called "Link Table" whose cells link to the same URL.
    pub fn hyperlink_slide(self, name: &str) -> Self {
        self.push(name, SlideKind::Hyperlink)
    }

    /// A slide with an embedded OLE object called `name` and its preview.
    pub fn ole_slide(self, name: &str) -> Self {
        self.push(name, SlideKind::Ole)
    }

    /// A slide with a shape called `name` whose click jumps to slide 1.
    pub fn jump_slide(self, name: &str) -> Self {
        self.push(name, SlideKind::Jump)
    }

    pub fn build(&self) -> PackageArchive {
        let mut archive = PackageArchive::new(format!("{}.pptx", self.name));
        let mut overrides: Vec<(String, &'static str)> = vec![
            ("/ppt/presentation.xml".into(), ct::PML_PRESENTATION_MAIN),
            ("/ppt/slideMasters/slideMaster1.xml".into(), ct::PML_SLIDE_MASTER),
            ("/ppt/slideLayouts/slideLayout1.xml".into(), ct::PML_SLIDE_LAYOUT),
            ("/ppt/slideLayouts/slideLayout2.xml".into(), ct::PML_SLIDE_LAYOUT),
            ("/ppt/theme/theme1.xml".into(), ct::OFC_THEME),
            ("/docProps/app.xml".into(), EXTENDED_PROPERTIES),
        ];

        archive.write(
            "_rels/.rels",
            rels_xml(&[
                Rel::internal("rId1", rt::OFFICE_DOCUMENT, "ppt/presentation.xml"),
                Rel::internal("rId2", rt::EXTENDED_PROPERTIES, "docProps/app.xml"),
            ])
            .into_bytes(),
        );
        archive.write(
            "docProps/app.xml",
            format!(
                r#"{XML_DECL}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>Microsoft Office PowerPoint</Application><Slides>{}</Slides></Properties>"#,
                self.slides.len()
            )
            .into_bytes(),
        );
        write_master(&mut archive);

        let mut pres_rels = vec![
            Rel::internal("rId1", rt::SLIDE_MASTER, "slideMasters/slideMaster1.xml"),
            Rel::internal("rId2", rt::THEME, "theme/theme1.xml"),
        ];
        let mut slide_ids = String::new();
        let mut numbers = Numbers::default();
        for (index, spec) in self.slides.iter().enumerate() {
            let number = index as u32 + 1;
            let r_id = format!("rId{}", index + 3);
            slide_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 255 + number, r_id));
            pres_rels.push(Rel::internal(r_id, rt::SLIDE, format!("slides/slide{}.xml", number)));
            write_slide(&mut archive, &mut overrides, &mut numbers, number, spec);
        }

        archive.write(
            "ppt/presentation.xml",
            format!(
                r#"{XML_DECL}<p:presentation {PML_NAMESPACES} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{slide_ids}</p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
            )
            .into_bytes(),
        );
        archive.write("ppt/_rels/presentation.xml.rels", rels_xml(&pres_rels).into_bytes());

        let mut types = format!(r#"{XML_DECL}<Types xmlns="{}">"#, ns::OPC_CONTENT_TYPES);
        for (ext, content_type) in [
            ("rels", ct::OPC_RELATIONSHIPS),
            ("xml", ct::XML),
            ("png", ct::PNG),
            ("svg", ct::SVG),
            ("emf", ct::X_EMF),
            ("bin", ct::OFC_OLE_OBJECT),
            ("xlsx", ct::SML_SHEET),
        ] {
            types.push_str(&format!(r#"<Default Extension="{ext}" ContentType="{content_type}"/>"#));
        }
        for (part, content_type) in &overrides {
            types.push_str(&format!(r#"<Override PartName="{part}" ContentType="{content_type}"/>"#));
        }
        types.push_str("</Types>");
        archive.write("[Content_Types].xml", types.into_bytes());
        archive
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.build().to_bytes().unwrap()
    }

    pub fn package(&self) -> Package {
        Package::from_archive(Box::new(self.build())).unwrap()
    }

    pub fn template(&self) -> Template {
        Template::from_package(self.name.clone(), self.package()).unwrap()
    }
}

fn write_master(archive: &mut PackageArchive) {
    archive.write(
        "ppt/slideMasters/slideMaster1.xml",
        format!(
            r#"{XML_DECL}<p:sldMaster {PML_NAMESPACES}>{}<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/><p:sldLayoutId id="2147483650" r:id="rId2"/></p:sldLayoutIdLst><p:txStyles><p:titleStyle/><p:bodyStyle/><p:otherStyle/></p:txStyles></p:sldMaster>"#,
            shape_tree("")
        )
        .into_bytes(),
    );
    archive.write(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        rels_xml(&[
            Rel::internal("rId1", rt::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
            Rel::internal("rId2", rt::SLIDE_LAYOUT, "../slideLayouts/slideLayout2.xml"),
            Rel::internal("rId3", rt::THEME, "../theme/theme1.xml"),
        ])
        .into_bytes(),
    );
    for (number, (name, kind)) in [("Title Slide", "title"), ("Title and Content", "obj")].iter().enumerate() {
        let number = number + 1;
        archive.write(
            &format!("ppt/slideLayouts/slideLayout{}.xml", number),
            format!(
                r#"{XML_DECL}<p:sldLayout {PML_NAMESPACES} type="{kind}" preserve="1"><p:cSld name="{name}"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
            )
            .into_bytes(),
        );
        archive.write(
            &format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", number),
            rels_xml(&[Rel::internal("rId1", rt::SLIDE_MASTER, "../slideMasters/slideMaster1.xml")]).into_bytes(),
        );
    }
    archive.write(
        "ppt/theme/theme1.xml",
        format!(
            r#"{XML_DECL}<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements><a:clrScheme name="Office"/><a:fontScheme name="Office"/><a:fmtScheme name="Office"/></a:themeElements></a:theme>"#
        )
        .into_bytes(),
    );
}

fn write_slide(
    archive: &mut PackageArchive,
    overrides: &mut Vec<(String, &'static str)>,
    numbers: &mut Numbers,
    number: u32,
    spec: &SlideSpec,
) {
    let creation = |shape: u32| format!("{{5C2A{:04X}-0B1D-4C3E-8F00-{:012X}}}", number, shape);
    let name = spec.name.as_str();
    let mut rels = vec![Rel::internal("rId1", rt::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml")];
    let mut content = format!(
        r#"<p:sp><p:nvSpPr>{}<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{name}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        non_visual(2, "Title 1", &creation(2), "")
    );

    match spec.kind {
        SlideKind::Plain => {},
        SlideKind::Chart => {
            let n = Numbers::next(&mut numbers.charts);
            let book = Numbers::next(&mut numbers.embeddings);
            rels.push(Rel::internal("rId2", rt::CHART, format!("../charts/chart{}.xml", n)));
            content.push_str(&frame(
                &non_visual(3, name, &creation(3), ""),
                "http://schemas.openxmlformats.org/drawingml/2006/chart",
                r#"<c:chart r:id="rId2"/>"#,
            ));

            archive.write(&format!("ppt/charts/chart{}.xml", n), BAR_CHART_XML.as_bytes().to_vec());
            archive.write(
                &format!("ppt/charts/_rels/chart{}.xml.rels", n),
                rels_xml(&[
                    Rel::internal("rId1", rt::CHART_STYLE, format!("style{}.xml", n)),
                    Rel::internal("rId2", rt::CHART_COLOR_STYLE, format!("colors{}.xml", n)),
                    Rel::internal(
                        "rId3",
                        rt::PACKAGE,
                        format!("../embeddings/Microsoft_Excel_Worksheet{}.xlsx", book),
                    ),
                ])
                .into_bytes(),
            );
            archive.write(
                &format!("ppt/charts/style{}.xml", n),
                format!(r#"{XML_DECL}<cs:chartStyle xmlns:cs="http://schemas.microsoft.com/office/drawing/2012/chartStyle" id="201"/>"#).into_bytes(),
            );
            archive.write(
                &format!("ppt/charts/colors{}.xml", n),
                format!(r#"{XML_DECL}<cs:colorStyle xmlns:cs="http://schemas.microsoft.com/office/drawing/2012/chartStyle" meth="cycle" id="10"/>"#).into_bytes(),
            );
            archive.write(
                &format!("ppt/embeddings/Microsoft_Excel_Worksheet{}.xlsx", book),
                workbook_bytes(),
            );
            overrides.push((format!("/ppt/charts/chart{}.xml", n), ct::DML_CHART));
            overrides.push((format!("/ppt/charts/style{}.xml", n), ct::MS_CHART_STYLE));
            overrides.push((format!("/ppt/charts/colors{}.xml", n), ct::MS_CHART_COLOR_STYLE));
        },
        SlideKind::Image => {
            let png = Numbers::next(&mut numbers.media);
            let svg = Numbers::next(&mut numbers.media);
            rels.push(Rel::internal("rId2", rt::IMAGE, format!("../media/image{}.png", png)));
            rels.push(Rel::internal("rId3", rt::IMAGE, format!("../media/image{}.svg", svg)));
            content.push_str(&format!(
                r#"<p:pic><p:nvPicPr>{}<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"><a:extLst><a:ext uri="{{96DAC541-7B7A-43D3-8B79-37D633B846F1}}"><asvg:svgBlip r:embed="rId3"/></a:ext></a:extLst></a:blip><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="914400" cy="914400"/></a:xfrm></p:spPr></p:pic>"#,
                non_visual(3, name, &creation(3), "")
            ));
            archive.write(&format!("ppt/media/image{}.png", png), b"\x89PNG\r\n\x1a\n".to_vec());
            archive.write(
                &format!("ppt/media/image{}.svg", svg),
                br#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1"/>"#.to_vec(),
            );
        },
        SlideKind::Diagram => {
            let n = Numbers::next(&mut numbers.diagrams);
            let parts = [
                (rt::DIAGRAM_DATA, "data", ct::DML_DIAGRAM_DATA),
                (rt::DIAGRAM_LAYOUT, "layout", ct::DML_DIAGRAM_LAYOUT),
                (rt::DIAGRAM_QUICK_STYLE, "quickStyle", ct::DML_DIAGRAM_STYLE),
                (rt::DIAGRAM_COLORS, "colors", ct::DML_DIAGRAM_COLORS),
                (rt::DIAGRAM_DRAWING, "drawing", ct::MS_DIAGRAM_DRAWING),
            ];
            for (i, (rel_type, stem, content_type)) in parts.iter().enumerate() {
                rels.push(Rel::internal(
                    format!("rId{}", i + 2),
                    *rel_type,
                    format!("../diagrams/{}{}.xml", stem, n),
                ));
                overrides.push((format!("/ppt/diagrams/{}{}.xml", stem, n), *content_type));
            }
            content.push_str(&frame(
                &non_visual(3, name, &creation(3), ""),
                "http://schemas.openxmlformats.org/drawingml/2006/diagram",
                r#"<dgm:relIds r:dm="rId2" r:lo="rId3" r:qs="rId4" r:cs="rId5"/>"#,
            ));

            const DGM: &str = "http://schemas.openxmlformats.org/drawingml/2006/diagram";
            const DSP: &str = "http://schemas.microsoft.com/office/drawing/2008/diagram";
            archive.write(
                &format!("ppt/diagrams/data{}.xml", n),
                format!(
                    r#"{XML_DECL}<dgm:dataModel xmlns:dgm="{DGM}" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><dgm:ptLst><dgm:pt modelId="{{6D1B5B0E-0000-4000-8000-000000000001}}" type="doc"/></dgm:ptLst><dgm:cxnLst/><dgm:bg/><dgm:whole/><dgm:extLst><a:ext uri="{DSP}"><dsp:dataModelExt xmlns:dsp="{DSP}" relId="rId6" minVer="{DGM}"/></a:ext></dgm:extLst></dgm:dataModel>"#
                )
                .into_bytes(),
            );
            archive.write(
                &format!("ppt/diagrams/layout{}.xml", n),
                format!(r#"{XML_DECL}<dgm:layoutDef xmlns:dgm="{DGM}" uniqueId="urn:microsoft.com/office/officeart/2005/8/layout/default"/>"#).into_bytes(),
            );
            archive.write(
                &format!("ppt/diagrams/quickStyle{}.xml", n),
                format!(r#"{XML_DECL}<dgm:styleDef xmlns:dgm="{DGM}" uniqueId="urn:microsoft.com/office/officeart/2005/8/quickstyle/simple1"/>"#).into_bytes(),
            );
            archive.write(
                &format!("ppt/diagrams/colors{}.xml", n),
                format!(r#"{XML_DECL}<dgm:colorsDef xmlns:dgm="{DGM}" uniqueId="urn:microsoft.com/office/officeart/2005/8/colors/accent1_2"/>"#).into_bytes(),
            );
            archive.write(
                &format!("ppt/diagrams/drawing{}.xml", n),
                format!(r#"{XML_DECL}<dsp:drawing xmlns:dsp="{DSP}"><dsp:spTree/></dsp:drawing>"#).into_bytes(),
            );
        },
        SlideKind::Hyperlink => {
            rels.push(Rel::external("rId2", rt::HYPERLINK, LINK_URL));
            rels.push(Rel::external("rId3", rt::HYPERLINK, LINK_URL));
            rels.push(Rel::external("rId4", rt::HYPERLINK, LINK_URL));
            content.push_str(&format!(
                r#"<p:sp><p:nvSpPr>{}<p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>Visit</a:t></a:r></a:p></p:txBody></p:sp>"#,
                non_visual(3, name, &creation(3), r#"<a:hlinkClick r:id="rId2"/>"#)
            ));
            let cell = |r_id: &str, text: &str| {
                format!(
                    r#"<a:tc><a:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"><a:hlinkClick r:id="{r_id}"/></a:rPr><a:t>{text}</a:t></a:r></a:p></a:txBody><a:tcPr/></a:tc>"#
                )
            };
            let table = format!(
                r#"<a:tbl><a:tblPr firstRow="1" bandRow="1"/><a:tblGrid><a:gridCol w="3048000"/><a:gridCol w="3048000"/></a:tblGrid><a:tr h="370840">{}{}</a:tr></a:tbl>"#,
                cell("rId3", "Home"),
                cell("rId4", "Docs")
            );
            content.push_str(&frame(
                &non_visual(4, "Link Table", &creation(4), ""),
                "http://schemas.openxmlformats.org/drawingml/2006/table",
                &table,
            ));
        },
        SlideKind::Jump => {
            rels.push(Rel::internal("rId2", rt::SLIDE, "slide1.xml"));
            content.push_str(&format!(
                r#"<p:sp><p:nvSpPr>{}<p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>Back</a:t></a:r></a:p></p:txBody></p:sp>"#,
                non_visual(3, name, &creation(3), r#"<a:hlinkClick r:id="rId2" action="ppaction://hlinksldjump"/>"#)
            ));
        },
        SlideKind::Ole => {
            let n = Numbers::next(&mut numbers.embeddings);
            let preview = Numbers::next(&mut numbers.media);
            rels.push(Rel::internal("rId2", rt::OLE_OBJECT, format!("../embeddings/oleObject{}.bin", n)));
            rels.push(Rel::internal("rId3", rt::IMAGE, format!("../media/image{}.emf", preview)));
            content.push_str(&frame(
                &non_visual(3, name, &creation(3), ""),
                "http://schemas.openxmlformats.org/presentationml/2006/ole",
                r#"<p:oleObj name="Worksheet" r:id="rId2" imgW="914400" imgH="914400" progId="Excel.Sheet.8"><p:embed/><p:pic><p:nvPicPr><p:cNvPr id="0" name=""/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId3"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr/></p:pic></p:oleObj>"#,
            ));
            archive.write(
                &format!("ppt/embeddings/oleObject{}.bin", n),
                vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1],
            );
            archive.write(&format!("ppt/media/image{}.emf", preview), vec![1, 0, 0, 0]);
        },
    }

    archive.write(
        &format!("ppt/slides/slide{}.xml", number),
        format!(
            r#"{XML_DECL}<p:sld {PML_NAMESPACES}>{}<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
            shape_tree(&content)
        )
        .into_bytes(),
    );
    archive.write(&format!("ppt/slides/_rels/slide{}.xml.rels", number), rels_xml(&rels).into_bytes());
    overrides.push((format!("/ppt/slides/slide{}.xml", number), ct::PML_SLIDE));
}

use crate::report::chart::{raster_options, PieChart, Rgb};
use crate::report::*;

use log::{debug, info, warn};
use quick_xml::escape::escape;
use snafu::prelude::*;
use std::fmt::Write as FmtWrite;
use std::io::{Cursor, Write};
use survey_tally::{ItemReport, OpenQuestion, SurveyReport};
use usvg::Options;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const PPTX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

const EMU_PER_INCH: f64 = 914_400.0;
/// 13.333 x 7.5 inches
const SLIDE_WIDTH: i64 = 12_192_000;
const SLIDE_HEIGHT: i64 = 6_858_000;
/// Width of the rasterized chart, in pixels.
const CHART_PIXELS: u32 = 800;
/// Room for the chart picture, in inches.
const CHART_MAX_WIDTH: f64 = 5.2;
const CHART_MAX_HEIGHT: f64 = 3.3;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

/// What happened to the chart of an item slide.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ChartStatus {
    /// The picture is on the slide.
    Embedded,
    /// The item has no breakdown to draw.
    Omitted,
    /// The chart could not be rasterized, the slide has no picture.
    Degraded(String),
}

/// A complete slide deck, ready to be written.
#[derive(PartialEq, Debug, Clone)]
pub struct Deck {
    pub bytes: Vec<u8>,
    pub slide_count: usize,
    /// One entry per item slide, in order.
    pub chart_statuses: Vec<(String, ChartStatus)>,
}

fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

/// Escapes the text for XML, replacing the control characters XML 1.0 rejects.
fn xml_text(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| if c.is_control() && c != '\t' { ' ' } else { c })
        .collect();
    escape(cleaned.as_str()).into_owned()
}

#[derive(Debug, Clone)]
struct Paragraph {
    text: String,
    /// Points
    size: u32,
    bold: bool,
    level: u32,
    centered: bool,
    color: Option<Rgb>,
}

impl Paragraph {
    fn new(text: &str, size: u32) -> Paragraph {
        Paragraph {
            text: text.to_string(),
            size,
            bold: false,
            level: 0,
            centered: false,
            color: None,
        }
    }

    fn bold(mut self) -> Paragraph {
        self.bold = true;
        self
    }

    fn level(mut self, level: u32) -> Paragraph {
        self.level = level;
        self
    }

    fn centered(mut self) -> Paragraph {
        self.centered = true;
        self
    }

    fn color(mut self, color: Option<Rgb>) -> Paragraph {
        self.color = color;
        self
    }

    fn write_xml(&self, xml: &mut String) -> std::fmt::Result {
        xml.push_str("<a:p><a:pPr");
        if self.level > 0 {
            write!(
                xml,
                " marL=\"{}\" lvl=\"{}\"",
                emu(0.3) * self.level as i64,
                self.level
            )?;
        }
        if self.centered {
            xml.push_str(" algn=\"ctr\"");
        }
        xml.push_str("/><a:r>");
        write!(xml, "<a:rPr lang=\"fr-FR\" sz=\"{}\"", self.size * 100)?;
        if self.bold {
            xml.push_str(" b=\"1\"");
        }
        xml.push_str(" dirty=\"0\">");
        if let Some(c) = self.color {
            write!(
                xml,
                "<a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill>",
                c.to_srgb()
            )?;
        }
        xml.push_str("</a:rPr>");
        write!(xml, "<a:t>{}</a:t></a:r></a:p>", xml_text(&self.text))
    }
}

#[derive(Debug, Clone)]
enum Shape {
    TextBox {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        paragraphs: Vec<Paragraph>,
    },
    Picture {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        /// Index in the images of the slide.
        image: usize,
        description: String,
    },
}

impl Shape {
    fn write_xml(&self, xml: &mut String, shape_id: usize) -> std::fmt::Result {
        match self {
            Shape::TextBox {
                x,
                y,
                width,
                height,
                paragraphs,
            } => {
                xml.push_str("<p:sp><p:nvSpPr>");
                write!(
                    xml,
                    "<p:cNvPr id=\"{}\" name=\"Text Box {}\"/>",
                    shape_id, shape_id
                )?;
                xml.push_str("<p:cNvSpPr txBox=\"1\"/><p:nvPr/></p:nvSpPr><p:spPr>");
                write!(
                    xml,
                    "<a:xfrm><a:off x=\"{}\" y=\"{}\"/><a:ext cx=\"{}\" cy=\"{}\"/></a:xfrm>",
                    x, y, width, height
                )?;
                xml.push_str("<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>");
                xml.push_str("<p:txBody><a:bodyPr wrap=\"square\" rtlCol=\"0\"><a:spAutoFit/></a:bodyPr><a:lstStyle/>");
                for p in paragraphs.iter() {
                    p.write_xml(xml)?;
                }
                xml.push_str("</p:txBody></p:sp>");
            }
            Shape::Picture {
                x,
                y,
                width,
                height,
                image,
                description,
            } => {
                xml.push_str("<p:pic><p:nvPicPr>");
                write!(
                    xml,
                    "<p:cNvPr id=\"{}\" name=\"Picture {}\" descr=\"{}\"/>",
                    shape_id,
                    shape_id,
                    xml_text(description)
                )?;
                xml.push_str("<p:cNvPicPr><a:picLocks noChangeAspect=\"1\"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>");
                // rId1 is the layout
                write!(
                    xml,
                    "<p:blipFill><a:blip r:embed=\"rId{}\"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>",
                    image + 2
                )?;
                write!(
                    xml,
                    "<p:spPr><a:xfrm><a:off x=\"{}\" y=\"{}\"/><a:ext cx=\"{}\" cy=\"{}\"/></a:xfrm>",
                    x, y, width, height
                )?;
                xml.push_str("<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></p:spPr></p:pic>");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct Slide {
    shapes: Vec<Shape>,
    /// PNG images referenced by the pictures.
    images: Vec<Vec<u8>>,
}

impl Slide {
    fn add_text_box(&mut self, x: f64, y: f64, width: f64, height: f64, paragraphs: Vec<Paragraph>) {
        self.shapes.push(Shape::TextBox {
            x: emu(x),
            y: emu(y),
            width: emu(width),
            height: emu(height),
            paragraphs,
        });
    }

    fn add_picture(
        &mut self,
        png: Vec<u8>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        description: &str,
    ) {
        self.images.push(png);
        self.shapes.push(Shape::Picture {
            x: emu(x),
            y: emu(y),
            width: emu(width),
            height: emu(height),
            image: self.images.len() - 1,
            description: description.to_string(),
        });
    }

    fn to_xml(&self) -> Result<String, std::fmt::Error> {
        let mut xml = String::from(XML_DECL);
        write!(
            xml,
            "<p:sld xmlns:a=\"{}\" xmlns:r=\"{}\" xmlns:p=\"{}\"><p:cSld><p:spTree>",
            NS_A, NS_R, NS_P
        )?;
        xml.push_str(GROUP_SHAPE_PROPERTIES);
        for (idx, shape) in self.shapes.iter().enumerate() {
            // id 1 is the group shape
            shape.write_xml(&mut xml, idx + 2)?;
        }
        xml.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
        Ok(xml)
    }

    /// `first_image` is the number of the first media file of this slide.
    fn rels_xml(&self, first_image: usize) -> Result<String, std::fmt::Error> {
        let mut xml = String::from(XML_DECL);
        write!(xml, "<Relationships xmlns=\"{}\">", NS_PKG_RELS)?;
        write!(
            xml,
            "<Relationship Id=\"rId1\" Type=\"{}/slideLayout\" Target=\"../slideLayouts/slideLayout1.xml\"/>",
            REL_TYPE
        )?;
        for idx in 0..self.images.len() {
            write!(
                xml,
                "<Relationship Id=\"rId{}\" Type=\"{}/image\" Target=\"../media/image{}.png\"/>",
                idx + 2,
                REL_TYPE,
                first_image + idx
            )?;
        }
        xml.push_str("</Relationships>");
        Ok(xml)
    }
}

struct Presentation {
    title: String,
    slides: Vec<Slide>,
}

fn add_part(
    zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    name: &str,
    content: &[u8],
) -> BSurveyResult<()> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, options).context(ArchiveSnafu {})?;
    zip.write_all(content)
        .context(WritingArchiveSnafu { part: name })?;
    Ok(())
}

fn slide_parts(slide: &Slide, n: usize, first_image: usize) -> SurveyResult<(String, String)> {
    let xml = slide
        .to_xml()
        .whatever_context(format!("Cannot write the XML of slide {}", n))?;
    let rels = slide
        .rels_xml(first_image)
        .whatever_context(format!("Cannot write the relationships of slide {}", n))?;
    Ok((xml, rels))
}

impl Presentation {
    fn new(title: &str) -> Presentation {
        Presentation {
            title: title.to_string(),
            slides: Vec::new(),
        }
    }

    fn add_slide(&mut self) -> &mut Slide {
        self.slides.push(Slide::default());
        let idx = self.slides.len() - 1;
        &mut self.slides[idx]
    }

    fn content_types_xml(&self, has_images: bool) -> String {
        let mut xml = String::from(XML_DECL);
        xml.push_str("<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">");
        xml.push_str("<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>");
        xml.push_str("<Default Extension=\"xml\" ContentType=\"application/xml\"/>");
        if has_images {
            xml.push_str("<Default Extension=\"png\" ContentType=\"image/png\"/>");
        }
        let overrides = [
            ("/ppt/presentation.xml", "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"),
            ("/ppt/slideMasters/slideMaster1.xml", "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"),
            ("/ppt/slideLayouts/slideLayout1.xml", "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"),
            ("/ppt/theme/theme1.xml", "application/vnd.openxmlformats-officedocument.theme+xml"),
            ("/ppt/presProps.xml", "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml"),
            ("/ppt/tableStyles.xml", "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml"),
            ("/docProps/core.xml", "application/vnd.openxmlformats-package.core-properties+xml"),
            ("/docProps/app.xml", "application/vnd.openxmlformats-officedocument.extended-properties+xml"),
        ];
        for (part, ct) in overrides.iter() {
            xml.push_str(&format!(
                "<Override PartName=\"{}\" ContentType=\"{}\"/>",
                part, ct
            ));
        }
        for n in 1..=self.slides.len() {
            xml.push_str(&format!(
                "<Override PartName=\"/ppt/slides/slide{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>",
                n
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn presentation_xml(&self) -> String {
        let mut xml = String::from(XML_DECL);
        xml.push_str(&format!(
            "<p:presentation xmlns:a=\"{}\" xmlns:r=\"{}\" xmlns:p=\"{}\" saveSubsetFonts=\"1\">",
            NS_A, NS_R, NS_P
        ));
        xml.push_str("<p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>");
        if !self.slides.is_empty() {
            xml.push_str("<p:sldIdLst>");
            for n in 0..self.slides.len() {
                // rId1 master, rId2 theme, rId3 and 4 properties
                xml.push_str(&format!(
                    "<p:sldId id=\"{}\" r:id=\"rId{}\"/>",
                    256 + n,
                    5 + n
                ));
            }
            xml.push_str("</p:sldIdLst>");
        }
        xml.push_str(&format!(
            "<p:sldSz cx=\"{}\" cy=\"{}\"/><p:notesSz cx=\"{}\" cy=\"{}\"/>",
            SLIDE_WIDTH, SLIDE_HEIGHT, SLIDE_HEIGHT, SLIDE_WIDTH
        ));
        xml.push_str("</p:presentation>");
        xml
    }

    fn presentation_rels_xml(&self) -> String {
        let mut xml = String::from(XML_DECL);
        xml.push_str(&format!("<Relationships xmlns=\"{}\">", NS_PKG_RELS));
        let fixed = [
            ("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
            ("rId2", "theme", "theme/theme1.xml"),
            ("rId3", "presProps", "presProps.xml"),
            ("rId4", "tableStyles", "tableStyles.xml"),
        ];
        for (id, rel, target) in fixed.iter() {
            xml.push_str(&format!(
                "<Relationship Id=\"{}\" Type=\"{}/{}\" Target=\"{}\"/>",
                id, REL_TYPE, rel, target
            ));
        }
        for n in 0..self.slides.len() {
            xml.push_str(&format!(
                "<Relationship Id=\"rId{}\" Type=\"{}/slide\" Target=\"slides/slide{}.xml\"/>",
                5 + n,
                REL_TYPE,
                n + 1
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }

    fn core_xml(&self) -> String {
        format!(
            "{}<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:dcterms=\"http://purl.org/dc/terms/\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"><dc:title>{}</dc:title><dc:creator>surveyrep</dc:creator></cp:coreProperties>",
            XML_DECL,
            xml_text(&self.title)
        )
    }

    fn app_xml(&self) -> String {
        format!(
            "{}<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\" xmlns:vt=\"http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes\"><Application>surveyrep</Application><Slides>{}</Slides></Properties>",
            XML_DECL,
            self.slides.len()
        )
    }

    /// Assembles the package in memory.
    fn to_bytes(&self) -> BSurveyResult<Vec<u8>> {
        let has_images = self.slides.iter().any(|s| !s.images.is_empty());
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        add_part(
            &mut zip,
            "[Content_Types].xml",
            self.content_types_xml(has_images).as_bytes(),
        )?;
        add_part(&mut zip, "_rels/.rels", ROOT_RELS.as_bytes())?;
        add_part(&mut zip, "docProps/core.xml", self.core_xml().as_bytes())?;
        add_part(&mut zip, "docProps/app.xml", self.app_xml().as_bytes())?;
        add_part(
            &mut zip,
            "ppt/presentation.xml",
            self.presentation_xml().as_bytes(),
        )?;
        add_part(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            self.presentation_rels_xml().as_bytes(),
        )?;
        add_part(&mut zip, "ppt/presProps.xml", PRES_PROPS.as_bytes())?;
        add_part(&mut zip, "ppt/tableStyles.xml", TABLE_STYLES.as_bytes())?;
        add_part(
            &mut zip,
            "ppt/slideMasters/slideMaster1.xml",
            SLIDE_MASTER.as_bytes(),
        )?;
        add_part(
            &mut zip,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            SLIDE_MASTER_RELS.as_bytes(),
        )?;
        add_part(
            &mut zip,
            "ppt/slideLayouts/slideLayout1.xml",
            SLIDE_LAYOUT.as_bytes(),
        )?;
        add_part(
            &mut zip,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            SLIDE_LAYOUT_RELS.as_bytes(),
        )?;
        add_part(&mut zip, "ppt/theme/theme1.xml", THEME.as_bytes())?;

        let mut next_image = 1;
        for (idx, slide) in self.slides.iter().enumerate() {
            let n = idx + 1;
            let (xml, rels) = slide_parts(slide, n, next_image)?;
            add_part(&mut zip, &format!("ppt/slides/slide{}.xml", n), xml.as_bytes())?;
            add_part(
                &mut zip,
                &format!("ppt/slides/_rels/slide{}.xml.rels", n),
                rels.as_bytes(),
            )?;
            for png in slide.images.iter() {
                add_part(&mut zip, &format!("ppt/media/image{}.png", next_image), png)?;
                next_image += 1;
            }
        }

        let cursor = zip.finish().context(ArchiveSnafu {})?;
        Ok(cursor.into_inner())
    }
}

fn add_title_slide(slide: &mut Slide, settings: &ReportSettings) {
    slide.add_text_box(
        0.9,
        2.4,
        11.5,
        1.3,
        vec![Paragraph::new(&settings.title, 40).bold().centered()],
    );
    slide.add_text_box(
        0.9,
        3.9,
        11.5,
        0.8,
        vec![Paragraph::new(&settings.subtitle, 24).centered()],
    );
}

/// The largest (width, height) in inches with the aspect ratio of the chart
/// that fits the chart area.
fn chart_extent(chart: &PieChart) -> (f64, f64) {
    let (w, h) = chart.svg_size();
    let ratio = h as f64 / w as f64;
    if CHART_MAX_WIDTH * ratio <= CHART_MAX_HEIGHT {
        (CHART_MAX_WIDTH, CHART_MAX_WIDTH * ratio)
    } else {
        (CHART_MAX_HEIGHT / ratio, CHART_MAX_HEIGHT)
    }
}

fn add_item_slide(
    slide: &mut Slide,
    item: &ItemReport,
    chart: Option<&PieChart>,
    options: &Options,
) -> ChartStatus {
    slide.add_text_box(
        0.5,
        0.3,
        12.3,
        0.7,
        vec![Paragraph::new(&item.label, 20).bold()],
    );
    let total = if item.total > 0 {
        format!("Total réponses : {}", item.total)
    } else {
        "Total réponses : N/A".to_string()
    };
    slide.add_text_box(0.5, 0.95, 6.5, 0.35, vec![Paragraph::new(&total, 12)]);

    let status = match chart {
        Some(c) => match c.rasterize_png(CHART_PIXELS, options) {
            Ok(png) => {
                let (width, height) = chart_extent(c);
                slide.add_picture(png, 0.5, 1.4, width, height, &item.label);
                ChartStatus::Embedded
            }
            Err(e) => ChartStatus::Degraded(e.to_string()),
        },
        None => ChartStatus::Omitted,
    };

    let mut details = Vec::new();
    match &item.aggregate {
        Some(agg) if !agg.modalities.is_empty() => {
            details.push(Paragraph::new("Résultats :", 14).bold());
            for (idx, m) in agg.modalities.iter().enumerate() {
                let color = chart.and_then(|c| c.slices.get(idx)).map(|s| s.color);
                details.push(
                    Paragraph::new(
                        &format!("{} : {} ({:.1}%)", m.label, m.count, m.percentage),
                        12,
                    )
                    .level(1)
                    .color(color),
                );
            }
        }
        _ => details.push(Paragraph::new("Aucun résultat.", 12)),
    }
    slide.add_text_box(6.0, 1.4, 6.8, 3.2, details);

    if !item.comments.is_empty() {
        let mut comments = vec![Paragraph::new("Commentaires :", 14).bold()];
        for c in item.comments.iter() {
            comments.push(Paragraph::new(&format!("- {}", c), 11).level(1));
        }
        slide.add_text_box(0.6, 4.85, 12.2, 2.0, comments);
    }
    status
}

fn add_open_question_slide(slide: &mut Slide, oq: &OpenQuestion) {
    slide.add_text_box(0.5, 0.3, 12.3, 1.0, vec![Paragraph::new(&oq.label, 28).bold()]);
    let mut body = Vec::new();
    if oq.answers.is_empty() {
        body.push(Paragraph::new("Aucune réponse.", 18));
    } else {
        body.push(Paragraph::new("Réponses :", 18).bold());
        for a in oq.answers.iter() {
            body.push(Paragraph::new(&format!("- {}", a), 16).level(1));
        }
    }
    slide.add_text_box(0.6, 1.5, 12.2, 5.5, body);
}

/// Builds the slide deck: a title slide, one slide per item, one slide per
/// open question.
///
/// `charts` is parallel to `report.items`. A chart that cannot be rasterized
/// leaves its slide without picture and is reported as degraded.
pub fn build_deck(
    report: &SurveyReport,
    charts: &[Option<PieChart>],
    settings: &ReportSettings,
) -> BSurveyResult<Deck> {
    let mut pres = Presentation::new(&settings.title);
    add_title_slide(pres.add_slide(), settings);

    let options = raster_options();
    let mut chart_statuses: Vec<(String, ChartStatus)> = Vec::new();
    for (idx, item) in report.items.iter().enumerate() {
        let chart = charts.get(idx).and_then(|c| c.as_ref());
        let status = add_item_slide(pres.add_slide(), item, chart, &options);
        if let ChartStatus::Degraded(reason) = &status {
            warn!(
                "build_deck: item {:?}: the slide has no chart: {}",
                item.label, reason
            );
        }
        chart_statuses.push((item.label.clone(), status));
    }
    for oq in report.open_questions.iter() {
        debug!(
            "build_deck: open question {:?}: {} answers",
            oq.label,
            oq.answers.len()
        );
        add_open_question_slide(pres.add_slide(), oq);
    }

    let slide_count = pres.slides.len();
    let bytes = pres.to_bytes()?;
    info!("build_deck: {} slides, {} bytes", slide_count, bytes.len());
    Ok(Deck {
        bytes,
        slide_count,
        chart_statuses,
    })
}

const GROUP_SHAPE_PROPERTIES: &str = "<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/><a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>";

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\"><Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"ppt/presentation.xml\"/><Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/><Relationship Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties\" Target=\"docProps/app.xml\"/></Relationships>";

const PRES_PROPS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>
<p:presentationPr xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\"/>";

const TABLE_STYLES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>
<a:tblStyleLst xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" def=\"{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}\"/>";

const SLIDE_MASTER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>
<p:sldMaster xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\"><p:cSld><p:bg><p:bgRef idx=\"1001\"><a:schemeClr val=\"bg1\"/></p:bgRef></p:bg><p:spTree><p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/><a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld><p:clrMap bg1=\"lt1\" tx1=\"dk1\" bg2=\"lt2\" tx2=\"dk2\" accent1=\"accent1\" accent2=\"accent2\" accent3=\"accent3\" accent4=\"accent4\" accent5=\"accent5\" accent6=\"accent6\" hlink=\"hlink\" folHlink=\"folHlink\"/><p:sldLayoutIdLst><p:sldLayoutId id=\"2147483649\" r:id=\"rId1\"/></p:sldLayoutIdLst></p:sldMaster>";

const SLIDE_MASTER_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\"><Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout\" Target=\"../slideLayouts/slideLayout1.xml\"/><Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme\" Target=\"../theme/theme1.xml\"/></Relationships>";

const SLIDE_LAYOUT: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>
<p:sldLayout xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" type=\"blank\" preserve=\"1\"><p:cSld name=\"Blank\"><p:spTree><p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/><a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>";

const SLIDE_LAYOUT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\"><Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster\" Target=\"../slideMasters/slideMaster1.xml\"/></Relationships>";

const THEME: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>
<a:theme xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" name=\"Survey\"><a:themeElements><a:clrScheme name=\"Survey\"><a:dk1><a:sysClr val=\"windowText\" lastClr=\"000000\"/></a:dk1><a:lt1><a:sysClr val=\"window\" lastClr=\"FFFFFF\"/></a:lt1><a:dk2><a:srgbClr val=\"44546A\"/></a:dk2><a:lt2><a:srgbClr val=\"E7E6E6\"/></a:lt2><a:accent1><a:srgbClr val=\"4C78A8\"/></a:accent1><a:accent2><a:srgbClr val=\"F58518\"/></a:accent2><a:accent3><a:srgbClr val=\"E45756\"/></a:accent3><a:accent4><a:srgbClr val=\"72B7B2\"/></a:accent4><a:accent5><a:srgbClr val=\"54A24B\"/></a:accent5><a:accent6><a:srgbClr val=\"EECA3B\"/></a:accent6><a:hlink><a:srgbClr val=\"0563C1\"/></a:hlink><a:folHlink><a:srgbClr val=\"954F72\"/></a:folHlink></a:clrScheme><a:fontScheme name=\"Survey\"><a:majorFont><a:latin typeface=\"Calibri Light\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:majorFont><a:minorFont><a:latin typeface=\"Calibri\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:minorFont></a:fontScheme><a:fmtScheme name=\"Survey\"><a:fillStyleLst><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w=\"6350\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln><a:ln w=\"12700\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln><a:ln w=\"19050\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::chart::Slice;
    use std::io::Read;
    use survey_tally::builder::Builder;
    use survey_tally::{run_survey_stats, OrderedScale, SurveyLayout};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn sample_report() -> SurveyReport {
        let mut b = Builder::new(&[
            "Id",
            "Nom",
            "Accueil.Satisfait",
            "Accueil.Très satisfait",
            "Accueil.Peu satisfait",
            "Accueil.Pas du tout satisfait",
            "Accueil.Commentaire",
            "Repas.Oui",
            "Repas.Non",
            "Idées.Commentaire",
        ]);
        b.add_row(&["1", "a", "", "1", "", "", "R&D <ok>", "", "", "Plus de pauses"]);
        b.add_row(&["2", "b", "1", "", "", "", "", "", "", ""]);
        b.add_row(&["", "Total", "1", "1", "0", "0", "", "", "", ""]);
        let layout = SurveyLayout {
            open_question_columns: vec![9, 40],
            ..SurveyLayout::default()
        };
        run_survey_stats(&b.build(), &layout, &[OrderedScale::satisfaction()]).unwrap()
    }

    fn charts_of(report: &SurveyReport) -> Vec<Option<PieChart>> {
        report
            .items
            .iter()
            .map(|i| i.aggregate.as_ref().map(|a| PieChart::from_aggregate(&i.label, a)))
            .collect()
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn one_slide_per_item_and_open_question() {
        init();
        let report = sample_report();
        let deck = build_deck(&report, &charts_of(&report), &ReportSettings::default()).unwrap();
        // title, Accueil, Repas, Idées, one open question in range
        assert_eq!(deck.slide_count, 5);
        let archive = zip::ZipArchive::new(Cursor::new(deck.bytes.as_slice())).unwrap();
        let slides = archive
            .file_names()
            .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
            .count();
        assert_eq!(slides, 5);
        assert!(archive.file_names().any(|n| n == "ppt/media/image1.png"));
        assert_eq!(
            deck.chart_statuses,
            vec![
                ("Accueil".to_string(), ChartStatus::Embedded),
                ("Repas".to_string(), ChartStatus::Omitted),
                ("Idées".to_string(), ChartStatus::Omitted),
            ]
        );
        let types = read_part(&deck.bytes, "[Content_Types].xml");
        assert!(types.contains("/ppt/slides/slide5.xml"));
        let pres = read_part(&deck.bytes, "ppt/presentation.xml");
        assert!(pres.contains("<p:sldSz cx=\"12192000\" cy=\"6858000\"/>"));
        assert!(pres.contains("<p:sldId id=\"260\" r:id=\"rId9\"/>"));
    }

    #[test]
    fn slide_texts() {
        let report = sample_report();
        let deck = build_deck(&report, &charts_of(&report), &ReportSettings::default()).unwrap();

        let title = read_part(&deck.bytes, "ppt/slides/slide1.xml");
        assert!(title.contains("Enquête à chaud"));
        assert!(title.contains("Rapport d&apos;analyse"));

        let accueil = read_part(&deck.bytes, "ppt/slides/slide2.xml");
        assert!(accueil.contains("Total réponses : 2"));
        assert!(accueil.contains("r:embed=\"rId2\""));
        // Scale order and scale color
        let first = accueil.find("Très satisfait : 1 (50.0%)").unwrap();
        let second = accueil.find("Satisfait : 1 (50.0%)").unwrap();
        assert!(first < second);
        assert!(accueil.contains("<a:srgbClr val=\"1B7837\"/>"));
        assert!(accueil.contains("- R&amp;D &lt;ok&gt;"));
        let rels = read_part(&deck.bytes, "ppt/slides/_rels/slide2.xml.rels");
        assert!(rels.contains("Target=\"../media/image1.png\""));

        let repas = read_part(&deck.bytes, "ppt/slides/slide3.xml");
        assert!(repas.contains("Total réponses : N/A"));
        assert!(repas.contains("Aucun résultat."));
        assert!(!repas.contains("Résultats :"));
        assert!(!repas.contains("lvl=\"1\""));
        assert!(!repas.contains("<p:pic>"));
        assert!(!repas.contains("Commentaires :"));

        let question = read_part(&deck.bytes, "ppt/slides/slide5.xml");
        assert!(question.contains("Idées"));
        assert!(question.contains("- Plus de pauses"));
    }

    #[test]
    fn chart_failure_is_reported() {
        init();
        let report = sample_report();
        let mut charts = charts_of(&report);
        // A chart with nothing to draw cannot be rasterized.
        charts[0] = Some(PieChart {
            title: "Accueil".to_string(),
            slices: vec![Slice {
                label: "Satisfait".to_string(),
                count: 0,
                percentage: 0.0,
                color: Rgb(0, 0, 0),
            }],
        });
        let deck = build_deck(&report, &charts, &ReportSettings::default()).unwrap();
        assert_eq!(deck.slide_count, 5);
        assert!(matches!(deck.chart_statuses[0].1, ChartStatus::Degraded(_)));
        let accueil = read_part(&deck.bytes, "ppt/slides/slide2.xml");
        assert!(!accueil.contains("<p:pic>"));
        assert!(accueil.contains("Résultats :"));
    }

    #[test]
    fn chart_picture_keeps_its_aspect_ratio() {
        init();
        let report = sample_report();
        let deck = build_deck(&report, &charts_of(&report), &ReportSettings::default()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(&deck.bytes)).unwrap();
        let mut png = Vec::new();
        archive
            .by_name("ppt/media/image1.png")
            .unwrap()
            .read_to_end(&mut png)
            .unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (800, 400));
        let accueil = read_part(&deck.bytes, "ppt/slides/slide2.xml");
        assert!(accueil.contains("<a:ext cx=\"4754880\" cy=\"2377440\"/>"));
    }

    #[test]
    fn tall_legend_is_fitted_by_height() {
        let slices: Vec<Slice> = (0..12)
            .map(|i| Slice {
                label: format!("m{}", i),
                count: 1,
                percentage: 8.3,
                color: Rgb(0, 0, 0),
            })
            .collect();
        let chart = PieChart {
            title: "Q".to_string(),
            slices,
        };
        let (width, height) = chart_extent(&chart);
        assert_eq!(height, CHART_MAX_HEIGHT);
        assert!((width - CHART_MAX_HEIGHT * 400.0 / 294.0).abs() < 1e-9);
    }

    #[test]
    fn control_characters_are_replaced() {
        assert_eq!(xml_text("a\u{b}b\nc & d"), "a b c &amp; d");
    }
}

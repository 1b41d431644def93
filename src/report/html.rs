use crate::report::chart::PieChart;
use crate::report::pptx::PPTX_MIME_TYPE;
use crate::report::ReportSettings;

use log::debug;
use quick_xml::escape::escape;
use survey_tally::{ItemReport, OpenQuestion, SurveyReport};

pub const NO_TOTAL_NOTICE: &str = "Aucun total disponible pour calculer les pourcentages.";
pub const COMMENT_ONLY_NOTICE: &str = "Aucune modalité fermée (uniquement commentaire).";
pub const NO_COMMENT_NOTICE: &str = "Aucun commentaire.";
pub const NO_ANSWER_NOTICE: &str = "Aucune réponse.";

const STYLE: &str = "
body { font-family: sans-serif; margin: 2em auto; max-width: 1100px; color: #222; }
h1 { margin-bottom: 0.2em; }
.subtitle { color: #666; margin-top: 0; }
details.item { border: 1px solid #ddd; border-radius: 6px; margin: 1em 0; padding: 0.5em 1em; }
details.item > summary { font-size: 1.2em; font-weight: bold; cursor: pointer; }
.grid { display: grid; grid-template-columns: 1fr 1fr; gap: 2em; }
.notice { color: #888; font-style: italic; }
.donut path:hover, .donut circle:hover { opacity: 0.8; }
.swatch { display: inline-block; width: 0.8em; height: 0.8em; margin-right: 0.4em; }
a.download { display: inline-block; padding: 0.5em 1em; background: #4c78a8; color: white; border-radius: 4px; text-decoration: none; }
";

fn render_item(item: &ItemReport, chart: Option<&PieChart>, out: &mut String) {
    out.push_str(&format!(
        "<details class=\"item\" open>\n<summary>{}</summary>\n<div class=\"grid\">\n<div>\n",
        escape(item.label.as_str())
    ));
    match (&item.aggregate, chart) {
        (Some(agg), Some(chart)) => {
            out.push_str(&format!("<p><strong>{} réponses</strong></p>\n", agg.total));
            out.push_str(&chart.to_svg());
            out.push('\n');
        }
        _ if item.has_modalities => {
            out.push_str(&format!("<p class=\"notice\">{}</p>\n", NO_TOTAL_NOTICE));
        }
        _ => {
            out.push_str(&format!("<p class=\"notice\">{}</p>\n", COMMENT_ONLY_NOTICE));
        }
    }
    out.push_str("</div>\n<div>\n");

    if let Some(agg) = &item.aggregate {
        out.push_str("<h3>Détail des réponses</h3>\n<ul>\n");
        for (idx, m) in agg.modalities.iter().enumerate() {
            let swatch = chart
                .and_then(|c| c.slices.get(idx))
                .map(|s| {
                    format!(
                        "<span class=\"swatch\" style=\"background: {}\"></span>",
                        s.color.to_html()
                    )
                })
                .unwrap_or_default();
            out.push_str(&format!(
                "<li>{}{} : {} réponses ({:.1}%)</li>\n",
                swatch,
                escape(m.label.as_str()),
                m.count,
                m.percentage
            ));
        }
        out.push_str("</ul>\n");
    }

    if item.has_comment_columns {
        out.push_str("<h3>Commentaires</h3>\n");
        if item.comments.is_empty() {
            out.push_str(&format!("<p class=\"notice\">{}</p>\n", NO_COMMENT_NOTICE));
        } else {
            out.push_str("<ul class=\"comments\">\n");
            for (idx, c) in item.comments.iter().enumerate() {
                out.push_str(&format!(
                    "<li>Commentaire {} : {}</li>\n",
                    idx + 1,
                    escape(c.as_str())
                ));
            }
            out.push_str("</ul>\n");
        }
    }
    out.push_str("</div>\n</div>\n</details>\n");
}

fn render_open_question(oq: &OpenQuestion, out: &mut String) {
    out.push_str(&format!("<h3>{}</h3>\n", escape(oq.label.as_str())));
    if oq.answers.is_empty() {
        out.push_str(&format!("<p class=\"notice\">{}</p>\n", NO_ANSWER_NOTICE));
        return;
    }
    out.push_str("<ul>\n");
    for (idx, a) in oq.answers.iter().enumerate() {
        out.push_str(&format!(
            "<li>Réponse {} : {}</li>\n",
            idx + 1,
            escape(a.as_str())
        ));
    }
    out.push_str("</ul>\n");
}

/// Renders the whole report as a self-contained HTML page.
///
/// `charts` is parallel to `report.items`.
pub fn render_html(
    report: &SurveyReport,
    charts: &[Option<PieChart>],
    settings: &ReportSettings,
) -> String {
    let title = escape(settings.title.as_str());
    let mut out = String::new();
    out.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n",
        title, STYLE
    ));
    out.push_str(&format!(
        "<h1>{}</h1>\n<p class=\"subtitle\">{}</p>\n",
        title,
        escape(settings.subtitle.as_str())
    ));
    out.push_str(&format!(
        "<p>{} lignes lues, {} colonnes analysées, {} items.</p>\n",
        report.row_count,
        report.analyzed_columns,
        report.items.len()
    ));
    out.push_str(&format!(
        "<p><a class=\"download\" href=\"{0}\" download=\"{0}\" type=\"{1}\">Télécharger le rapport PowerPoint</a></p>\n",
        escape(settings.pptx_file_name.as_str()),
        PPTX_MIME_TYPE
    ));

    for (idx, item) in report.items.iter().enumerate() {
        let chart = charts.get(idx).and_then(|c| c.as_ref());
        debug!(
            "render_html: item {:?}, chart: {}",
            item.label,
            chart.is_some()
        );
        render_item(item, chart, &mut out);
    }

    out.push_str("<h2>Questions ouvertes finales</h2>\n");
    for oq in report.open_questions.iter() {
        render_open_question(oq, &mut out);
    }
    out.push_str("</body>\n</html>\n");
    out
}

use crate::report::config_reader::read_summary;
use crate::report::io_common::simplify_file_name;
use crate::report::*;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JSValue};
use snafu::prelude::*;
use survey_tally::{Coloring, ItemReport, SurveyReport};
use text_diff::print_diff;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    pub title: String,
    pub input: String,
}

fn item_to_json(item: &ItemReport) -> JSValue {
    let modalities: Vec<JSValue> = item
        .aggregate
        .iter()
        .flat_map(|agg| agg.modalities.iter())
        .map(|m| {
            json!({
                "label": m.label,
                "count": m.count,
                "percentage": m.percentage
            })
        })
        .collect();
    let scale = item.aggregate.as_ref().and_then(|agg| match &agg.coloring {
        Coloring::Scale(name) => Some(name.clone()),
        Coloring::Automatic => None,
    });
    json!({
        "item": item.label,
        "total": item.total,
        "scale": scale,
        "modalities": modalities,
        "comments": item.comments
    })
}

pub fn build_summary_js(settings: &ReportSettings, input: &str, report: &SurveyReport) -> JSValue {
    let c = SummaryConfig {
        title: settings.title.clone(),
        input: simplify_file_name(input),
    };
    let items: Vec<JSValue> = report.items.iter().map(item_to_json).collect();
    let open_questions: Vec<JSValue> = report
        .open_questions
        .iter()
        .map(|oq| json!({"question": oq.label, "answers": oq.answers}))
        .collect();
    json!({
        "config": c,
        "items": items,
        "openQuestions": open_questions
    })
}

/// Compares the pretty-printed summary with the reference file and prints a
/// line diff when they differ.
pub fn check_reference(pretty_summary: &str, reference_path: &str) -> BSurveyResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_summary_ref != pretty_summary {
        warn!("Found differences with the reference summary");
        print_diff(pretty_summary_ref.as_str(), pretty_summary, "\n");
        return Err(Box::new(SurveyError::ReferenceMismatch {}));
    }
    Ok(())
}

mod config;
use log::{debug, info, warn};

use std::{
    collections::{HashMap, HashSet},
    ops::Range,
};

pub use crate::config::*;

pub mod builder;
pub mod manual;

/// Separates the item from the modality in a column label.
pub const COLUMN_DELIMITER: char = '.';

/// A modality containing this (case-insensitive) marks a free-text column.
pub const COMMENT_MARKER: &str = "commentaire";

/// Marker stripped from open-question labels.
pub const OPEN_QUESTION_MARKER: &str = ".Commentaire";

/// Splits a column label on the last delimiter.
///
/// `"Accueil.Très satisfait"` gives the item `Accueil` and the modality
/// `Très satisfait`. A label without delimiter is an item with an empty
/// modality.
pub fn split_header(header: &str) -> ColumnHeader {
    let (base, modality) = header
        .rsplit_once(COLUMN_DELIMITER)
        .unwrap_or((header, ""));
    ColumnHeader {
        base: base.trim().to_string(),
        modality: modality.trim().to_string(),
    }
}

pub fn column_kind(header: &ColumnHeader) -> ColumnKind {
    if header.modality.to_lowercase().contains(COMMENT_MARKER) {
        ColumnKind::Comment
    } else {
        ColumnKind::Modality(header.modality.clone())
    }
}

/// Groups the columns of the window into items, in order of first occurrence.
pub fn classify_columns(headers: &[String], window: Range<usize>) -> Vec<Item> {
    let mut items: Vec<Item> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for col in window {
        let header = match headers.get(col) {
            Some(h) => h,
            None => break,
        };
        let ch = split_header(header);
        let idx = *positions.entry(ch.base.clone()).or_insert_with(|| {
            items.push(Item::new(&ch.base));
            items.len() - 1
        });
        let kind = column_kind(&ch);
        debug!(
            "classify_columns: column {} {:?} -> item {:?} {:?}",
            col, header, ch.base, kind
        );
        match kind {
            ColumnKind::Modality(label) => items[idx].modality_columns.push((label, col)),
            ColumnKind::Comment => items[idx].comment_columns.push(col),
        }
    }
    items
}

/// Reads a count from the totals row. Anything that is not a non-negative
/// whole number counts as zero, negative counts included.
pub fn parse_count(cell: &str) -> u64 {
    let s = cell.trim();
    if let Ok(x) = s.parse::<u64>() {
        return x;
    }
    match s.parse::<f64>() {
        // Spreadsheet tools write whole counts as "12.0".
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 => f as u64,
        _ => 0,
    }
}

/// Sums the counts, saturating at `u64::MAX`.
pub fn sum_counts(counts: &[(String, u64)]) -> u64 {
    counts
        .iter()
        .fold(0u64, |acc, (_, c)| acc.saturating_add(*c))
}

fn round_one_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// The count of each modality column of the item, read from the totals row.
pub fn count_modalities(item: &Item, total_row: Option<&[String]>) -> Vec<(String, u64)> {
    item.modality_columns
        .iter()
        .map(|(label, col)| {
            let count = total_row
                .map(|row| parse_count(RawTable::cell(row, *col)))
                .unwrap_or(0);
            (label.clone(), count)
        })
        .collect()
}

/// The scale whose label set is exactly the set of the given labels.
pub fn matching_scale<'a>(labels: &[&str], scales: &'a [OrderedScale]) -> Option<&'a OrderedScale> {
    let found: HashSet<&str> = labels.iter().cloned().collect();
    scales.iter().find(|scale| {
        let expected: HashSet<&str> = scale.labels.iter().map(|s| s.as_str()).collect();
        expected == found
    })
}

/// Computes the percentage breakdown. Returns None when the total is zero.
///
/// When the labels match one of the scales, the rows follow the scale order
/// and take its colors. The counts are not affected.
pub fn aggregate_counts(counts: &[(String, u64)], scales: &[OrderedScale]) -> Option<ItemAggregate> {
    let total = sum_counts(counts);
    if total == 0 {
        return None;
    }
    let mut modalities: Vec<ModalityAggregate> = counts
        .iter()
        .map(|(label, count)| ModalityAggregate {
            label: label.clone(),
            count: *count,
            percentage: round_one_decimal(*count as f64 / total as f64 * 100.0),
            color: None,
        })
        .collect();

    let labels: Vec<&str> = counts.iter().map(|(l, _)| l.as_str()).collect();
    let coloring = match matching_scale(&labels, scales) {
        Some(scale) => {
            modalities.sort_by_key(|m| scale.position(&m.label));
            for m in modalities.iter_mut() {
                m.color = scale.color_of(&m.label).map(|c| c.to_string());
            }
            Coloring::Scale(scale.name.clone())
        }
        None => Coloring::Automatic,
    };

    Some(ItemAggregate {
        total,
        modalities,
        coloring,
    })
}

/// Collects the non-empty comments of the item, column after column.
/// The totals row is not read.
pub fn extract_comments(item: &Item, table: &RawTable) -> Vec<String> {
    let rows = table.respondent_rows();
    item.comment_columns
        .iter()
        .flat_map(|&col| {
            rows.iter()
                .map(move |row| RawTable::cell(row, col).trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        })
        .collect()
}

/// The question label of an open-question column.
pub fn open_question_label(header: &str) -> String {
    if header.contains(OPEN_QUESTION_MARKER) {
        header.replace(OPEN_QUESTION_MARKER, "").trim().to_string()
    } else {
        header
            .split(COLUMN_DELIMITER)
            .next()
            .unwrap_or("")
            .trim()
            .to_string()
    }
}

/// Reads the open questions at the given positions of the full table.
/// Positions beyond the table width are skipped.
pub fn extract_open_questions(table: &RawTable, columns: &[usize]) -> Vec<OpenQuestion> {
    let mut res: Vec<OpenQuestion> = Vec::new();
    for &col in columns {
        let header = match table.headers.get(col) {
            Some(h) => h,
            None => {
                debug!(
                    "extract_open_questions: column {} is beyond the table width {}, skipping",
                    col,
                    table.num_columns()
                );
                continue;
            }
        };
        let answers: Vec<String> = table
            .respondent_rows()
            .iter()
            .map(|row| RawTable::cell(row, col).trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        res.push(OpenQuestion {
            column: col,
            label: open_question_label(header),
            answers,
        });
    }
    res
}

fn build_item_report(item: &Item, table: &RawTable, scales: &[OrderedScale]) -> ItemReport {
    let counts = count_modalities(item, table.total_row());
    let total = sum_counts(&counts);
    let aggregate = aggregate_counts(&counts, scales);
    if item.has_modalities() && aggregate.is_none() {
        // A missing total and unreadable counts both end up here.
        warn!(
            "build_item_report: item {:?}: no total available to compute percentages",
            item.label
        );
    }
    ItemReport {
        label: item.label.clone(),
        total,
        aggregate,
        comments: extract_comments(item, table),
        has_modalities: item.has_modalities(),
        has_comment_columns: item.has_comment_columns(),
    }
}

/// Runs the whole analysis of a survey export.
///
/// Arguments:
/// * `table` the parsed export, totals row last
/// * `layout` where the items and open questions are
/// * `scales` the ordered vocabularies used to sort and color modalities
pub fn run_survey_stats(
    table: &RawTable,
    layout: &SurveyLayout,
    scales: &[OrderedScale],
) -> Result<SurveyReport, TallyError> {
    layout.validate()?;
    let num_columns = table.num_columns();
    if num_columns <= layout.identifier_columns {
        return Err(TallyError::InsufficientColumns {
            found: num_columns,
            required: layout.identifier_columns + 1,
        });
    }
    let window = layout.clipped_window(num_columns);
    info!(
        "run_survey_stats: {} rows, analyzing {} columns ({:?})",
        table.rows.len(),
        window.len(),
        window
    );
    if table.total_row().is_none() {
        warn!("run_survey_stats: the table has no data row, all totals will be zero");
    }

    let items = classify_columns(&table.headers, window.clone());
    info!("run_survey_stats: {} items", items.len());
    for item in items.iter() {
        debug!(
            "run_survey_stats: item {:?}: {} modalities, {} comment columns",
            item.label,
            item.modality_columns.len(),
            item.comment_columns.len()
        );
    }

    let reports: Vec<ItemReport> = items
        .iter()
        .map(|item| build_item_report(item, table, scales))
        .collect();

    let open_questions = extract_open_questions(table, &layout.open_question_columns);
    info!("run_survey_stats: {} open questions", open_questions.len());

    Ok(SurveyReport {
        row_count: table.rows.len(),
        analyzed_columns: window.len(),
        items: reports,
        open_questions,
    })
}

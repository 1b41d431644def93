// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;
use std::ops::Range;

/// The raw content of a survey export.
///
/// The header holds the column labels. The last data row is the precomputed
/// totals row, every other data row is one respondent.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    /// The row holding the precomputed counts, if the table has any data row.
    pub fn total_row(&self) -> Option<&[String]> {
        self.rows.last().map(|r| r.as_slice())
    }

    /// All the data rows except the totals row.
    pub fn respondent_rows(&self) -> &[Vec<String>] {
        match self.rows.len() {
            0 => &[],
            n => &self.rows[..n - 1],
        }
    }

    /// Ragged rows are padded with empty cells.
    pub fn cell<'a>(row: &'a [String], column: usize) -> &'a str {
        row.get(column).map(|s| s.as_str()).unwrap_or("")
    }
}

/// A column label split into the survey item and the answer category.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnHeader {
    pub base: String,
    pub modality: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ColumnKind {
    /// A counted answer category. The label may be empty when the item has a
    /// single counted option.
    Modality(String),
    /// Free text attached to the item.
    Comment,
}

/// A survey question, built once from the header scan.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Item {
    pub label: String,
    /// (modality label, absolute column index), in discovery order.
    pub modality_columns: Vec<(String, usize)>,
    pub comment_columns: Vec<usize>,
}

impl Item {
    pub fn new(label: &str) -> Item {
        Item {
            label: label.to_string(),
            modality_columns: Vec::new(),
            comment_columns: Vec::new(),
        }
    }

    pub fn has_modalities(&self) -> bool {
        !self.modality_columns.is_empty()
    }

    pub fn has_comment_columns(&self) -> bool {
        !self.comment_columns.is_empty()
    }
}

// ******** Output data structures *********

#[derive(PartialEq, Debug, Clone)]
pub struct ModalityAggregate {
    pub label: String,
    pub count: u64,
    /// Rounded to one decimal place.
    pub percentage: f64,
    /// Fixed color from a matched scale, as `#rrggbb`.
    pub color: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Coloring {
    /// The modalities matched the named scale: order and colors come from it.
    Scale(String),
    /// Discovery order, colors picked by the renderer.
    Automatic,
}

/// The percentage breakdown of an item. Only built when the total is positive.
#[derive(PartialEq, Debug, Clone)]
pub struct ItemAggregate {
    pub total: u64,
    pub modalities: Vec<ModalityAggregate>,
    pub coloring: Coloring,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OpenQuestion {
    /// Absolute column index in the full table.
    pub column: usize,
    pub label: String,
    pub answers: Vec<String>,
}

/// Snapshot of one item as handed to the renderers and the exporter.
#[derive(PartialEq, Debug, Clone)]
pub struct ItemReport {
    pub label: String,
    /// Sum of the counts of the modality columns. Zero when the totals row is
    /// missing or unreadable.
    pub total: u64,
    pub aggregate: Option<ItemAggregate>,
    pub comments: Vec<String>,
    pub has_modalities: bool,
    pub has_comment_columns: bool,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SurveyReport {
    /// Number of data rows, totals row included.
    pub row_count: usize,
    /// Number of columns inside the response window.
    pub analyzed_columns: usize,
    pub items: Vec<ItemReport>,
    pub open_questions: Vec<OpenQuestion>,
}

/// Errors that prevent the analysis from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TallyError {
    InsufficientColumns { found: usize, required: usize },
    InvalidLayout(String),
}

impl Error for TallyError {}

impl Display for TallyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyError::InsufficientColumns { found, required } => write!(
                f,
                "insufficient columns: found {}, need at least {} (identifier + response columns)",
                found, required
            ),
            TallyError::InvalidLayout(msg) => write!(f, "invalid survey layout: {}", msg),
        }
    }
}

// ********* Configuration **********

/// Where the interesting columns live in the export.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveyLayout {
    /// Leading columns identifying the respondent. A table needs strictly
    /// more columns than this.
    pub identifier_columns: usize,
    /// 0-based, end exclusive. Clipped to the table width.
    pub response_columns: Range<usize>,
    /// 0-based indices in the full table, in display order.
    pub open_question_columns: Vec<usize>,
}

impl Default for SurveyLayout {
    /// Columns C to AZ hold the items, BO, BQ and BS the final open questions.
    fn default() -> Self {
        SurveyLayout {
            identifier_columns: 2,
            response_columns: 2..52,
            open_question_columns: vec![66, 68, 70],
        }
    }
}

impl SurveyLayout {
    pub fn validate(&self) -> Result<(), TallyError> {
        if self.response_columns.start > self.response_columns.end {
            return Err(TallyError::InvalidLayout(format!(
                "response columns start after they end: {:?}",
                self.response_columns
            )));
        }
        Ok(())
    }

    /// The response window for a table of the given width.
    pub fn clipped_window(&self, num_columns: usize) -> Range<usize> {
        let end = self.response_columns.end.min(num_columns);
        let start = self.response_columns.start.min(end);
        start..end
    }
}

/// An ordered answer vocabulary with one fixed color per label.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OrderedScale {
    pub name: String,
    /// Most positive first.
    pub labels: Vec<String>,
    /// `#rrggbb`, parallel to `labels`.
    pub colors: Vec<String>,
}

impl OrderedScale {
    pub fn new(name: &str, entries: &[(&str, &str)]) -> OrderedScale {
        OrderedScale {
            name: name.to_string(),
            labels: entries.iter().map(|(l, _)| l.to_string()).collect(),
            colors: entries.iter().map(|(_, c)| c.to_string()).collect(),
        }
    }

    /// The four-level satisfaction scale.
    pub fn satisfaction() -> OrderedScale {
        OrderedScale::new(
            "satisfaction",
            &[
                ("Très satisfait", "#1b7837"),
                ("Satisfait", "#5aae61"),
                ("Peu satisfait", "#80cdc1"),
                ("Pas du tout satisfait", "#f46d43"),
            ],
        )
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn color_of(&self, label: &str) -> Option<&str> {
        self.position(label)
            .and_then(|idx| self.colors.get(idx))
            .map(|s| s.as_str())
    }
}

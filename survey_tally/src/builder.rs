pub use crate::config::*;

/// A builder for assembling a survey table row by row.
///
/// The readers use it to normalise what they parse; it is also the simplest
/// way to run an analysis from code.
///
/// ```
/// use survey_tally::builder::Builder;
/// use survey_tally::{run_survey_stats, OrderedScale, SurveyLayout};
///
/// let mut builder = Builder::new(&["Id", "Name", "Q1.Oui", "Q1.Non"]);
/// builder.add_row(&["1", "Anna", "1", ""]);
/// builder.add_row(&["", "Total", "1", "0"]);
///
/// let report = run_survey_stats(&builder.build(), &SurveyLayout::default(), &[OrderedScale::satisfaction()])?;
/// assert_eq!(report.items[0].total, 1);
/// # Ok::<(), survey_tally::TallyError>(())
/// ```
pub struct Builder {
    pub(crate) _headers: Vec<String>,
    pub(crate) _rows: Vec<Vec<String>>,
}

impl Builder {
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Builder {
        Builder {
            _headers: headers.iter().map(|s| s.as_ref().to_string()).collect(),
            _rows: Vec::new(),
        }
    }

    /// Adds a data row. Rows shorter than the header are padded with empty
    /// cells, longer rows are truncated.
    pub fn add_row<S: AsRef<str>>(&mut self, cells: &[S]) {
        self.add_row_owned(cells.iter().map(|s| s.as_ref().to_string()).collect())
    }

    pub fn add_row_owned(&mut self, mut cells: Vec<String>) {
        cells.resize(self._headers.len(), String::new());
        self._rows.push(cells);
    }

    pub fn num_rows(&self) -> usize {
        self._rows.len()
    }

    pub fn build(self) -> RawTable {
        RawTable {
            headers: self._headers,
            rows: self._rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_rows_are_padded() {
        let mut b = Builder::new(&["a", "b", "c"]);
        b.add_row(&["1"]);
        b.add_row(&["1", "2", "3", "4"]);
        let t = b.build();
        assert_eq!(t.rows[0], vec!["1", "", ""]);
        assert_eq!(t.rows[1], vec!["1", "2", "3"]);
        assert_eq!(t.respondent_rows().len(), 1);
        assert_eq!(t.total_row().map(|r| r.len()), Some(3));
    }
}

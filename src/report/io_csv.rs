use crate::report::io_common::decode_text;
use crate::report::*;

use log::debug;
use snafu::prelude::*;
use std::fs;
use survey_tally::builder::Builder;
use survey_tally::RawTable;

/// The separator of the survey exports.
pub const CSV_DELIMITER: u8 = b';';

pub fn read_csv_table(path: &str) -> BSurveyResult<RawTable> {
    let bytes = fs::read(path).context(OpeningInputSnafu { path })?;
    let content = decode_text(&bytes);
    parse_csv_content(&content, path)
}

/// Parses the decoded content of an export. The first record is the header.
pub fn parse_csv_content(content: &str, path: &str) -> BSurveyResult<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .context(ParsingCsvSnafu { path })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("parse_csv_content: headers: {:?}", headers);

    let mut builder = Builder::new(&headers);
    for (idx, record) in rdr.records().enumerate() {
        let record = record.context(ParsingCsvSnafu { path })?;
        if record.len() != headers.len() {
            debug!(
                "parse_csv_content: row {} has {} fields, the header has {}",
                idx + 2,
                record.len(),
                headers.len()
            );
        }
        builder.add_row_owned(record.iter().map(|s| s.to_string()).collect());
    }
    debug!("parse_csv_content: {} data rows", builder.num_rows());
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicolon_export() {
        let content = "Id;Nom;Q1.Oui;Q1.Commentaire\n1;Anna;1;\"bien; vraiment\"\n2;Bob\n;Total;1;\n";
        let table = parse_csv_content(content, "test.csv").unwrap();
        assert_eq!(table.headers, vec!["Id", "Nom", "Q1.Oui", "Q1.Commentaire"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0][3], "bien; vraiment");
        assert_eq!(table.rows[1], vec!["2", "Bob", "", ""]);
        assert_eq!(table.total_row().map(|r| r[2].as_str()), Some("1"));
    }

    #[test]
    fn missing_file() {
        let err = read_csv_table("/nonexistent/export.csv").unwrap_err();
        assert!(matches!(*err, SurveyError::OpeningInput { .. }));
    }
}

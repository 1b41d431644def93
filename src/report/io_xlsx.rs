use crate::report::*;

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;
use survey_tally::builder::Builder;
use survey_tally::RawTable;

fn get_range(path: &str, worksheet_name: Option<&str>) -> BSurveyResult<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet_name {
        Some(name) => {
            debug!(
                "read_xlsx_table: worksheets: {:?}, using {:?}",
                workbook.sheet_names(),
                name
            );
            workbook
                .worksheet_range(name)
                .context(MissingWorksheetSnafu {
                    path,
                    worksheet: name,
                })?
                .context(OpeningExcelSnafu { path })?
        }
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyInputSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    Ok(wrange)
}

/// Reads the cell the way it would appear in a CSV export.
fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        x => {
            debug!("cell_text: unexpected cell {:?}", x);
            format!("{:?}", x)
        }
    }
}

pub fn read_xlsx_table(path: &str, worksheet_name: Option<&str>) -> BSurveyResult<RawTable> {
    let wrange = get_range(path, worksheet_name)?;
    let mut rows = wrange.rows();
    let header = rows.next().context(EmptyInputSnafu { path })?;
    let headers: Vec<String> = header.iter().map(cell_text).collect();
    debug!("read_xlsx_table: headers: {:?}", headers);

    let mut builder = Builder::new(&headers);
    for row in rows {
        builder.add_row_owned(row.iter().map(cell_text).collect());
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_as_text() {
        assert_eq!(cell_text(&DataType::Float(12.0)), "12");
        assert_eq!(cell_text(&DataType::Float(0.5)), "0.5");
        assert_eq!(cell_text(&DataType::Int(3)), "3");
        assert_eq!(cell_text(&DataType::Empty), "");
        assert_eq!(
            cell_text(&DataType::String("Très satisfait".to_string())),
            "Très satisfait"
        );
    }

    #[test]
    fn missing_workbook() {
        let err = read_xlsx_table("/nonexistent/export.xlsx", None).unwrap_err();
        assert!(matches!(*err, SurveyError::OpeningExcel { .. }));
    }
}

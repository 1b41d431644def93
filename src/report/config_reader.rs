use crate::report::*;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;
use std::fs;
use survey_tally::{OrderedScale, SurveyLayout};

pub const DEFAULT_TITLE: &str = "Enquête à chaud";
pub const DEFAULT_SUBTITLE: &str = "Rapport d'analyse";
pub const DEFAULT_HTML_FILE_NAME: &str = "enquete_a_chaud_rapport.html";
pub const DEFAULT_PPTX_FILE_NAME: &str = "enquete_a_chaud_rapport.pptx";
pub const DEFAULT_SUMMARY_FILE_NAME: &str = "enquete_a_chaud_summary.json";

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "reportTitle")]
    pub report_title: Option<String>,
    #[serde(rename = "reportSubtitle")]
    pub report_subtitle: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "pptxFileName")]
    pub pptx_file_name: Option<String>,
    #[serde(rename = "htmlFileName")]
    pub html_file_name: Option<String>,
    #[serde(rename = "summaryFileName")]
    pub summary_file_name: Option<String>,
}

/// Column references are either 1-based numbers or Excel letters.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutSettings {
    #[serde(rename = "identifierColumns")]
    pub identifier_columns: Option<usize>,
    #[serde(rename = "firstResponseColumn")]
    _first_response_column: Option<JSValue>,
    #[serde(rename = "lastResponseColumn")]
    _last_response_column: Option<JSValue>,
    #[serde(rename = "openQuestionColumns")]
    _open_question_columns: Option<Vec<JSValue>>,
    #[serde(rename = "inputType")]
    pub input_type: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl LayoutSettings {
    pub fn to_layout(&self) -> SurveyResult<SurveyLayout> {
        let default = SurveyLayout::default();
        let start = match &self._first_response_column {
            Some(x) => read_column_ref(x)?,
            None => default.response_columns.start,
        };
        let end = match &self._last_response_column {
            Some(x) => read_column_ref(x)? + 1,
            None => default.response_columns.end,
        };
        let open_question_columns = match &self._open_question_columns {
            Some(xs) => xs
                .iter()
                .map(read_column_ref)
                .collect::<SurveyResult<Vec<usize>>>()?,
            None => default.open_question_columns,
        };
        let layout = SurveyLayout {
            identifier_columns: self
                .identifier_columns
                .unwrap_or(default.identifier_columns),
            response_columns: start..end,
            open_question_columns,
        };
        layout.validate().context(TallySnafu {})?;
        Ok(layout)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScaleSettings {
    pub name: String,
    pub labels: Vec<String>,
    pub colors: Vec<String>,
}

impl ScaleSettings {
    pub fn to_scale(&self) -> SurveyResult<OrderedScale> {
        ensure!(
            self.labels.len() == self.colors.len(),
            InvalidScaleSnafu {
                name: self.name.clone(),
                reason: format!(
                    "{} labels but {} colors",
                    self.labels.len(),
                    self.colors.len()
                ),
            }
        );
        if let Some(c) = self
            .colors
            .iter()
            .find(|c| chart::parse_hex_color(c).is_none())
        {
            return InvalidScaleSnafu {
                name: self.name.clone(),
                reason: format!("{:?} is not a #rrggbb color", c),
            }
            .fail();
        }
        Ok(OrderedScale {
            name: self.name.clone(),
            labels: self.labels.clone(),
            colors: self.colors.clone(),
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub layout: LayoutSettings,
    pub scales: Option<Vec<ScaleSettings>>,
}

impl SurveyConfig {
    /// The configured scales, or the satisfaction scale when none is given.
    pub fn ordered_scales(&self) -> SurveyResult<Vec<OrderedScale>> {
        match &self.scales {
            Some(scales) => scales.iter().map(|s| s.to_scale()).collect(),
            None => Ok(vec![OrderedScale::satisfaction()]),
        }
    }
}

pub fn read_config(path: &str) -> BSurveyResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SurveyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> BSurveyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// "A" is 0, "Z" is 25, "AA" is 26.
fn excel_column_index(s: &str) -> Option<usize> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut acc: usize = 0;
    for c in s.to_ascii_uppercase().chars() {
        acc = acc
            .checked_mul(26)?
            .checked_add((c as usize) - ('A' as usize) + 1)?;
    }
    Some(acc - 1)
}

/// Reads a column reference and returns the 0-based column index.
pub fn read_column_ref(x: &JSValue) -> SurveyResult<usize> {
    let one_based = match x {
        JSValue::Number(n) => n.as_u64().map(|x| x as usize),
        JSValue::String(s) => match excel_column_index(s.trim()) {
            Some(idx) => return Ok(idx),
            None => s.trim().parse::<usize>().ok(),
        },
        _ => None,
    };
    match one_based {
        Some(n) if n >= 1 => Ok(n - 1),
        _ => ParsingColumnReferenceSnafu {
            content: x.to_string(),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_references() {
        assert_eq!(read_column_ref(&json!("A")).unwrap(), 0);
        assert_eq!(read_column_ref(&json!("c")).unwrap(), 2);
        assert_eq!(read_column_ref(&json!("AZ")).unwrap(), 51);
        assert_eq!(read_column_ref(&json!("BO")).unwrap(), 66);
        assert_eq!(read_column_ref(&json!("BS")).unwrap(), 70);
        assert_eq!(read_column_ref(&json!(3)).unwrap(), 2);
        assert_eq!(read_column_ref(&json!("67")).unwrap(), 66);
        assert!(read_column_ref(&json!(0)).is_err());
        assert!(read_column_ref(&json!("B2")).is_err());
        assert!(read_column_ref(&json!(true)).is_err());
    }

    #[test]
    fn empty_config_gives_defaults() {
        let config: SurveyConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.layout.to_layout().unwrap(), SurveyLayout::default());
        assert_eq!(
            config.ordered_scales().unwrap(),
            vec![OrderedScale::satisfaction()]
        );
    }

    #[test]
    fn layout_and_scales_from_json() {
        let config: SurveyConfig = serde_json::from_value(json!({
            "outputSettings": {"reportTitle": "Forum", "outputDirectory": "out"},
            "layout": {
                "identifierColumns": 1,
                "firstResponseColumn": "B",
                "lastResponseColumn": 10,
                "openQuestionColumns": ["L", 14]
            },
            "scales": [
                {"name": "yes_no", "labels": ["Oui", "Non"], "colors": ["#00ff00", "#FF0000"]}
            ]
        }))
        .unwrap();
        assert_eq!(
            config.layout.to_layout().unwrap(),
            SurveyLayout {
                identifier_columns: 1,
                response_columns: 1..10,
                open_question_columns: vec![11, 13],
            }
        );
        let scales = config.ordered_scales().unwrap();
        assert_eq!(scales.len(), 1);
        assert_eq!(scales[0].color_of("Non"), Some("#FF0000"));
        assert_eq!(config.output_settings.report_title, Some("Forum".to_string()));
    }

    #[test]
    fn bad_scales_are_rejected() {
        let uneven = ScaleSettings {
            name: "x".to_string(),
            labels: vec!["a".to_string(), "b".to_string()],
            colors: vec!["#000000".to_string()],
        };
        assert!(matches!(
            uneven.to_scale(),
            Err(SurveyError::InvalidScale { .. })
        ));
        let not_a_color = ScaleSettings {
            name: "x".to_string(),
            labels: vec!["a".to_string()],
            colors: vec!["green".to_string()],
        };
        assert!(not_a_color.to_scale().is_err());
    }

    #[test]
    fn reversed_window_is_rejected() {
        let config: SurveyConfig = serde_json::from_value(json!({
            "layout": {"firstResponseColumn": "Z", "lastResponseColumn": "C"}
        }))
        .unwrap();
        assert!(matches!(
            config.layout.to_layout(),
            Err(SurveyError::Tally { .. })
        ));
    }
}

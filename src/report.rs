use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_tally::*;

use std::fs;
use std::path::{Path, PathBuf};

use crate::args::Args;
use crate::report::chart::PieChart;
use crate::report::config_reader::*;
use crate::report::pptx::ChartStatus;

pub mod chart;
pub mod config_reader;
pub mod html;
pub mod io_common;
pub mod io_csv;
pub mod io_xlsx;
pub mod pptx;
pub mod summary;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing CSV file {path}"))]
    ParsingCsv { source: csv::Error, path: String },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Missing worksheet {worksheet:?} in {path}"))]
    MissingWorksheet { path: String, worksheet: String },
    #[snafu(display("The input file {path} contains no header row"))]
    EmptyInput { path: String },
    #[snafu(display("Unknown input type {input_type:?}: expected csv or xlsx"))]
    UnknownInputType { input_type: String },
    #[snafu(display("Error reading JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Cannot understand column reference {content}"))]
    ParsingColumnReference { content: String },
    #[snafu(display("Invalid scale {name:?}: {reason}"))]
    InvalidScale { name: String, reason: String },
    #[snafu(display("Cannot analyze the survey"))]
    Tally { source: TallyError },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error assembling the slide deck"))]
    Archive { source: zip::result::ZipError },
    #[snafu(display("Error writing {part} in the slide deck"))]
    WritingArchive {
        source: std::io::Error,
        part: String,
    },
    #[snafu(display("Difference detected between the computed summary and the reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;
pub type BSurveyResult<T> = Result<T, Box<SurveyError>>;

/// The settings after merging the command line and the configuration file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReportSettings {
    pub title: String,
    pub subtitle: String,
    pub output_directory: PathBuf,
    pub pptx_file_name: String,
    pub html_file_name: String,
    pub summary_file_name: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            title: DEFAULT_TITLE.to_string(),
            subtitle: DEFAULT_SUBTITLE.to_string(),
            output_directory: PathBuf::from("."),
            pptx_file_name: DEFAULT_PPTX_FILE_NAME.to_string(),
            html_file_name: DEFAULT_HTML_FILE_NAME.to_string(),
            summary_file_name: DEFAULT_SUMMARY_FILE_NAME.to_string(),
        }
    }
}

/// What a run produced.
#[derive(PartialEq, Debug, Clone)]
pub struct RunOutcome {
    pub html_path: PathBuf,
    pub pptx_path: PathBuf,
    pub summary_path: PathBuf,
    pub slide_count: usize,
    pub chart_statuses: Vec<(String, ChartStatus)>,
}

fn resolve_settings(config: &SurveyConfig, args: &Args) -> ReportSettings {
    let os = &config.output_settings;
    let defaults = ReportSettings::default();
    ReportSettings {
        title: args
            .title
            .clone()
            .or_else(|| os.report_title.clone())
            .unwrap_or(defaults.title),
        subtitle: os.report_subtitle.clone().unwrap_or(defaults.subtitle),
        output_directory: args
            .out
            .clone()
            .or_else(|| os.output_directory.clone())
            .map(PathBuf::from)
            .unwrap_or(defaults.output_directory),
        pptx_file_name: os.pptx_file_name.clone().unwrap_or(defaults.pptx_file_name),
        html_file_name: os.html_file_name.clone().unwrap_or(defaults.html_file_name),
        summary_file_name: os
            .summary_file_name
            .clone()
            .unwrap_or(defaults.summary_file_name),
    }
}

pub fn read_survey_table(
    path: &str,
    input_type: &str,
    worksheet_name: Option<&str>,
) -> BSurveyResult<RawTable> {
    info!(
        "Attempting to read survey file {:?} as {}",
        io_common::simplify_file_name(path),
        input_type
    );
    let table = match input_type {
        "csv" => io_csv::read_csv_table(path),
        "xlsx" => io_xlsx::read_xlsx_table(path, worksheet_name),
        x => Err(Box::new(SurveyError::UnknownInputType {
            input_type: x.to_string(),
        })),
    }?;
    info!(
        "read_survey_table: {} columns, {} data rows",
        table.num_columns(),
        table.rows.len()
    );
    Ok(table)
}

fn write_output(dir: &Path, file_name: &str, content: &[u8]) -> BSurveyResult<PathBuf> {
    let p = dir.join(file_name);
    let path = p.display().to_string();
    fs::write(&p, content).context(WritingOutputSnafu { path: path.clone() })?;
    info!("Wrote {} ({} bytes)", path, content.len());
    Ok(p)
}

pub fn run_report(args: &Args) -> BSurveyResult<RunOutcome> {
    let config = match &args.config {
        Some(p) => read_config(p)?,
        None => SurveyConfig::default(),
    };
    debug!("config: {:?}", config);

    let settings = resolve_settings(&config, args);
    let layout = config.layout.to_layout()?;
    let scales = config.ordered_scales()?;
    info!("layout: {:?}", layout);

    let input_type = args
        .input_type
        .clone()
        .or_else(|| config.layout.input_type.clone())
        .unwrap_or_else(|| "csv".to_string());
    let worksheet_name = args
        .excel_worksheet_name
        .clone()
        .or_else(|| config.layout.excel_worksheet_name.clone());

    let table = read_survey_table(&args.input, &input_type, worksheet_name.as_deref())?;
    let report = run_survey_stats(&table, &layout, &scales).context(TallySnafu {})?;

    let charts: Vec<Option<PieChart>> = report
        .items
        .iter()
        .map(|item| {
            item.aggregate
                .as_ref()
                .map(|agg| PieChart::from_aggregate(&item.label, agg))
        })
        .collect();

    fs::create_dir_all(&settings.output_directory).context(WritingOutputSnafu {
        path: settings.output_directory.display().to_string(),
    })?;

    let page = html::render_html(&report, &charts, &settings);
    let html_path = write_output(
        &settings.output_directory,
        &settings.html_file_name,
        page.as_bytes(),
    )?;

    let deck = pptx::build_deck(&report, &charts, &settings)?;
    for (label, status) in deck.chart_statuses.iter() {
        debug!("chart for {:?}: {:?}", label, status);
    }
    let pptx_path = write_output(
        &settings.output_directory,
        &settings.pptx_file_name,
        &deck.bytes,
    )?;
    info!(
        "Slide deck {:?} ({}) ready with {} slides",
        settings.pptx_file_name,
        pptx::PPTX_MIME_TYPE,
        deck.slide_count
    );

    let summary_js = summary::build_summary_js(&settings, &args.input, &report);
    let pretty_summary =
        serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    let summary_path = write_output(
        &settings.output_directory,
        &settings.summary_file_name,
        pretty_summary.as_bytes(),
    )?;

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &args.reference {
        summary::check_reference(&pretty_summary, reference_path)?;
        info!("The summary matches the reference {:?}", reference_path);
    }

    let degraded = deck
        .chart_statuses
        .iter()
        .filter(|(_, s)| matches!(s, ChartStatus::Degraded(_)))
        .count();
    if degraded > 0 {
        warn!("{} slides were exported without their chart", degraded);
    }

    Ok(RunOutcome {
        html_path,
        pptx_path,
        summary_path,
        slide_count: deck.slide_count,
        chart_statuses: deck.chart_statuses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    const EXPORT: &str = "Id;Nom;Accueil.Très satisfait;Accueil.Satisfait;Accueil.Peu satisfait;Accueil.Pas du tout satisfait;Accueil.Commentaire;Horaires.Oui;Horaires.Non;Remarques.Commentaire
1;Anna;1;;;;Très bon accueil;1;;
2;Bob;;1;;;   ;;1;Trop court
3;Clara;1;;;;;1;;
;Total;2;1;0;0;;N/A;;
";

    fn args_for(input: &Path, out: &Path) -> Args {
        Args {
            input: input.display().to_string(),
            config: None,
            out: Some(out.display().to_string()),
            input_type: None,
            excel_worksheet_name: None,
            reference: None,
            title: None,
            verbose: false,
        }
    }

    fn slide_names(pptx_path: &Path) -> Vec<String> {
        let file = fs::File::open(pptx_path).unwrap();
        let archive = zip::ZipArchive::new(file).unwrap();
        let mut names: Vec<String> = archive
            .file_names()
            .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
            .map(|n| n.to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn end_to_end_csv() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("export.csv");
        fs::write(&input, EXPORT).unwrap();
        let out = dir.path().join("out");

        let outcome = run_report(&args_for(&input, &out)).unwrap();

        // title + 3 items, no open question in range
        assert_eq!(outcome.slide_count, 4);
        assert_eq!(slide_names(&outcome.pptx_path).len(), 4);
        assert_eq!(
            outcome.chart_statuses,
            vec![
                ("Accueil".to_string(), ChartStatus::Embedded),
                ("Horaires".to_string(), ChartStatus::Omitted),
                ("Remarques".to_string(), ChartStatus::Omitted),
            ]
        );

        let page = fs::read_to_string(&outcome.html_path).unwrap();
        assert!(page.contains("Très bon accueil"));
        assert!(page.contains("Aucun total disponible"));
        assert!(page.contains("Aucune modalité fermée"));

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&outcome.summary_path).unwrap()).unwrap();
        assert_eq!(summary["items"][0]["total"], 3);
        assert_eq!(summary["items"][0]["modalities"][0]["percentage"], 66.7);
        assert_eq!(summary["items"][2]["comments"][0], "Trop court");
    }

    #[test]
    fn latin1_export_is_decoded() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("export.csv");
        let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(EXPORT);
        fs::write(&input, &bytes).unwrap();

        let outcome = run_report(&args_for(&input, dir.path())).unwrap();
        let mut content = String::new();
        fs::File::open(&outcome.summary_path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert!(content.contains("Très satisfait"));
    }

    #[test]
    fn too_few_columns_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("export.csv");
        fs::write(&input, "Id;Nom\n1;Anna\n;Total\n").unwrap();
        let err = run_report(&args_for(&input, dir.path())).unwrap_err();
        assert!(matches!(
            *err,
            SurveyError::Tally {
                source: TallyError::InsufficientColumns { .. }
            }
        ));
    }

    #[test]
    fn reference_summary_is_checked() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("export.csv");
        fs::write(&input, EXPORT).unwrap();
        let first = run_report(&args_for(&input, dir.path())).unwrap();

        let mut args = args_for(&input, &dir.path().join("second"));
        args.reference = Some(first.summary_path.display().to_string());
        assert!(run_report(&args).is_ok());

        let altered = dir.path().join("altered.json");
        let content = fs::read_to_string(&first.summary_path)
            .unwrap()
            .replace("Trop court", "Trop long");
        fs::write(&altered, content).unwrap();
        args.reference = Some(altered.display().to_string());
        let err = run_report(&args).unwrap_err();
        assert!(matches!(*err, SurveyError::ReferenceMismatch {}));
    }

    #[test]
    fn config_moves_open_questions() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("export.csv");
        fs::write(&input, EXPORT).unwrap();
        let config = dir.path().join("config.json");
        fs::write(
            &config,
            r#"{
                "outputSettings": { "reportTitle": "Séminaire" },
                "layout": { "lastResponseColumn": "I", "openQuestionColumns": ["J", 99] }
            }"#,
        )
        .unwrap();
        let mut args = args_for(&input, dir.path());
        args.config = Some(config.display().to_string());

        let outcome = run_report(&args).unwrap();
        // title + Accueil + Horaires + one open question
        assert_eq!(outcome.slide_count, 4);
        let summary = fs::read_to_string(&outcome.summary_path).unwrap();
        assert!(summary.contains("Séminaire"));
        assert!(summary.contains("\"question\": \"Remarques\""));
    }

    #[test]
    fn unknown_input_type() {
        let err = read_survey_table("whatever.ods", "ods", None).unwrap_err();
        assert!(matches!(*err, SurveyError::UnknownInputType { .. }));
    }
}

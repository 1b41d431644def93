use clap::Parser;

/// This is a reporting program for post-event survey exports.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The survey export. CSV files must use ';' as separator.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (file path, optional) A JSON file describing the layout of the export, the ordered scales and the
    /// output settings. For more information about the file format, read the manual of survey_tally.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory path, optional) Where the report, the slide deck and the summary are written. Setting this
    /// option overrides the directory that may be specified with the --config option. Defaults to the current
    /// directory.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (default csv) The type of the input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use. By default, the first worksheet.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, optional) A reference summary in JSON format. If provided, surveyrep will check that the
    /// computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// The title of the report and of the first slide.
    #[clap(long, value_parser)]
    pub title: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

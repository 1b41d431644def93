mod args;
mod report;

use clap::Parser;
use log::{info, warn, LevelFilter};
use snafu::ErrorCompat;

use crate::args::Args;
use crate::report::pptx::ChartStatus;

fn main() {
    let args = Args::parse();
    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    info!("args: {:?}", args);

    match report::run_report(&args) {
        Ok(outcome) => {
            println!("Report: {}", outcome.html_path.display());
            println!(
                "Slide deck: {} ({} slides)",
                outcome.pptx_path.display(),
                outcome.slide_count
            );
            println!("Summary: {}", outcome.summary_path.display());
            for (label, status) in outcome.chart_statuses.iter() {
                if let ChartStatus::Degraded(reason) = status {
                    println!("No chart for {:?}: {}", label, reason);
                }
            }
        }
        Err(e) => {
            warn!("Error occured {:?}", e);
            eprintln!("An error occured: {}", e);
            let mut source = std::error::Error::source(&*e);
            while let Some(s) = source {
                eprintln!("  caused by: {}", s);
                source = std::error::Error::source(s);
            }
            if let Some(bt) = ErrorCompat::backtrace(&*e) {
                eprintln!("{}", bt);
            }
            std::process::exit(1);
        }
    }
}

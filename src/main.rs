mod alignment_record;
mod cli;
mod cost_signal;
mod feature_output;
mod genome_ref;
mod globals;
mod int_range;
mod log_utils;
mod logger;
mod os_utils;
mod refine_breakpoints;
mod run_stats;
mod scan;
mod scan_alignments;
mod segment_events;
mod smooth_signal;

use std::{error, process};

use hhmmss::Hhmmss;
use log::info;

use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_output_dir_and_logger;
use crate::scan::run_scan;

fn run(settings: &cli::Settings) -> Result<(), Box<dyn error::Error>> {
    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!(
        "cmdline: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );
    info!("Running on {} threads", settings.shared.thread_count);

    let start = std::time::Instant::now();

    run_scan(&settings.shared, &settings.scan)?;

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    let settings = cli::validate_and_fix_settings(cli::parse_settings());

    // Setup logger, including creation of the output directory for the log file:
    setup_output_dir_and_logger(
        settings.get_output_dir(),
        settings.shared.clobber,
        settings.shared.debug,
    );

    if let Err(err) = run(&settings) {
        log::error!("{err}");
        process::exit(2);
    }
}

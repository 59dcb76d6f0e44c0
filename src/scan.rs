use std::fs::File;
use std::io::BufWriter;

use log::info;
use simple_error::{SimpleResult, try_with};

use crate::cli;
use crate::feature_output::{FeatureHeaderInfo, GffFeatureWriter};
use crate::genome_ref::{GenomeRef, get_genome_ref_from_fasta};
use crate::refine_breakpoints::BreakpointRefiner;
use crate::run_stats::{ScanRunStats, write_scan_run_stats};
use crate::scan_alignments::scan_alignment_file;

pub const FEATURE_FILENAME: &str = "discordance.gff";
pub const RUN_STATS_FILENAME: &str = "run.stats.json";
pub const SETTINGS_FILENAME: &str = "scan.settings.json";

/// Find and refine the discordant regions of all reads in the input alignment file
///
/// The output directory must already exist.
///
pub fn run_scan(
    shared_settings: &cli::SharedSettings,
    settings: &cli::ScanSettings,
) -> SimpleResult<()> {
    cli::write_scan_settings(&settings.output_dir, settings);

    let start = std::time::Instant::now();

    let genome_ref = if settings.is_refine_enabled() {
        match &settings.ref_filename {
            Some(ref_filename) => Some(get_genome_ref_from_fasta(ref_filename)?),
            None => None,
        }
    } else {
        info!("Breakpoint refinement is disabled");
        None
    };
    let refiner = genome_ref
        .as_ref()
        .map(|x: &GenomeRef| BreakpointRefiner::new(settings.get_refiner_settings(), x));

    let feature_filename = settings.output_dir.join(FEATURE_FILENAME);
    info!("Writing discordant region features to file: '{feature_filename}'");
    let f = try_with!(
        File::create(&feature_filename),
        "Unable to create feature output file: '{feature_filename}'"
    );
    let header_info = FeatureHeaderInfo {
        window: settings.window,
        min_size: settings.min_size,
    };
    let mut writer = try_with!(
        GffFeatureWriter::new(BufWriter::new(f), &header_info),
        "Unable to write feature output file header: '{feature_filename}'"
    );

    let (record_stats, event_stats) = scan_alignment_file(
        &settings.bam_filename,
        settings.ref_filename.as_deref(),
        shared_settings.thread_count,
        &settings.get_record_scan_settings(),
        refiner.as_ref(),
        &mut writer,
    )?;

    let run_stats = ScanRunStats {
        record_stats,
        event_stats,
        output_feature_count: writer.feature_count(),
        total_scan_time_secs: start.elapsed().as_secs_f64(),
    };
    write_scan_run_stats(&settings.output_dir, &run_stats);

    Ok(())
}

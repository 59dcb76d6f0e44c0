use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use const_format::concatcp;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, bail};
use unwrap::unwrap;

use crate::refine_breakpoints::{AlignmentScores, RefinerSettings};
use crate::scan::SETTINGS_FILENAME;
use crate::scan_alignments::RecordScanSettings;

#[derive(Args, Deserialize, Serialize)]
pub struct ScanSettings {
    /// Directory for all output (must not already exist)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_output"))]
    pub output_dir: Utf8PathBuf,

    /// Read alignment file in SAM, BAM or CRAM format
    #[arg(long = "bam", value_name = "FILE")]
    pub bam_filename: String,

    /// Genome reference in FASTA format
    ///
    /// Required for breakpoint refinement and for reading CRAM input.
    ///
    #[arg(long = "ref", value_name = "FILE")]
    pub ref_filename: Option<String>,

    /// Number of alignment operation units averaged in the smoothed discordance signal
    #[arg(long, default_value_t = 50)]
    pub window: usize,

    /// Minimum reference or read span of a reported discordant region
    #[arg(long, default_value_t = 300)]
    pub min_size: usize,

    /// Report discordant regions without refining their breakpoints
    #[arg(long)]
    pub no_refine: bool,

    /// Size of the reference window used for breakpoint refinement
    #[arg(long, default_value_t = 300)]
    pub ref_window: usize,

    /// Distance the breakpoint refinement read windows extend beyond each end of the event
    #[arg(long, default_value_t = 500)]
    pub read_window: usize,

    /// Minimum distance from each refined read breakpoint to the event midpoint
    #[arg(long, default_value_t = 50)]
    pub min_read_gap: usize,

    /// Minimum distance from each refined reference breakpoint to the edges of the reference
    /// window
    #[arg(long, default_value_t = 10)]
    pub min_ref_flank: usize,

    /// Breakpoint refinement alignment scores, given as "match,mismatch,gap"
    #[arg(
        long = "align",
        value_name = "SCORES",
        default_value = "1,-1,-1",
        allow_hyphen_values = true
    )]
    pub scores: AlignmentScores,

    /// Print breakpoint refinement failures for each read to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl ScanSettings {
    pub fn is_refine_enabled(&self) -> bool {
        !self.no_refine
    }

    pub fn get_refiner_settings(&self) -> RefinerSettings {
        RefinerSettings {
            ref_window: self.ref_window,
            query_window: self.read_window,
            min_query_gap: self.min_read_gap,
            min_ref_flank: self.min_ref_flank,
            scores: self.scores,
        }
    }

    pub fn get_record_scan_settings(&self) -> RecordScanSettings {
        RecordScanSettings {
            window: self.window,
            min_size: self.min_size,
            verbose: self.verbose,
        }
    }
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_scan_settings(settings: ScanSettings) -> SimpleResult<ScanSettings> {
    fn check_input_filename(filename: &str, label: &str) -> SimpleResult<()> {
        if filename.is_empty() {
            bail!("Must specify {label} file");
        }
        let path = Utf8Path::new(filename);
        if !path.exists() {
            bail!("Can't find specified {label} file: '{filename}'");
        }
        if !path.is_file() {
            bail!("Specified {label} file path does not appear to be a file: '{filename}'");
        }
        Ok(())
    }

    check_input_filename(&settings.bam_filename, "alignment")?;

    match &settings.ref_filename {
        Some(ref_filename) => check_input_filename(ref_filename, "reference")?,
        None => {
            if settings.is_refine_enabled() {
                bail!("Must specify reference file unless --no-refine is given");
            }
        }
    }

    if settings.window == 0 {
        bail!("--window argument must be greater than 0");
    }

    if settings.is_refine_enabled() {
        if settings.ref_window == 0 {
            bail!("--ref-window argument must be greater than 0");
        }
        if settings.read_window == 0 {
            bail!("--read-window argument must be greater than 0");
        }

        let scores = &settings.scores;
        if scores.match_ <= 0 {
            bail!("--align match score must be positive, found: '{scores}'");
        }
        if scores.mismatch >= 0 || scores.gap >= 0 {
            bail!("--align mismatch and gap scores must be negative, found: '{scores}'");
        }
    }

    Ok(settings)
}

/// Write scan settings out in json format
pub fn write_scan_settings(output_dir: &Utf8Path, settings: &ScanSettings) {
    use log::info;

    let filename = output_dir.join(SETTINGS_FILENAME);

    info!("Writing scan settings to file: '{filename}'");

    let f = unwrap!(
        std::fs::File::create(&filename),
        "Unable to create scan settings json file: '{filename}'"
    );

    unwrap!(
        serde_json::to_writer_pretty(&f, &settings),
        "Unable to write scan settings json file: '{filename}'"
    );
}

//! Write discordant events as GFF2 features
//!

use std::io::{self, Write};

use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::segment_events::CandidateEvent;

pub const FEATURE_TYPE: &str = "discordance";

/// Values reported in the comment lines following the GFF header
///
pub struct FeatureHeaderInfo {
    pub window: usize,
    pub min_size: usize,
}

/// Format one event as a GFF2 feature line, without the trailing newline
///
/// The feature's reference interval is converted to GFF's 1-indexed closed convention. GFF does
/// not allow zero length features, so an empty reference interval is widened by one base at its
/// end. The read interval is reported in the read's sequencing orientation.
///
pub fn format_event_feature(event: &CandidateEvent) -> String {
    let record = event.record;
    let ref_start = event.ref_range.start;
    let mut ref_end = event.ref_range.end;
    if ref_end == ref_start {
        ref_end += 1;
    }

    let query_range = record.get_seq_order_query_range(&event.query_range);

    let mut attributes = format!(
        "Read \"{} {} {}\"",
        record.query_name,
        query_range.start + 1,
        query_range.end
    );
    if let Some(dup) = event.duplication_len {
        attributes += &format!("; Dup {dup}");
    }

    format!(
        "{}\t{}\t{}\t{}\t{}\t.\t{}\t.\t{}",
        record.ref_name,
        PROGRAM_NAME,
        FEATURE_TYPE,
        ref_start + 1,
        ref_end,
        record.strand,
        attributes
    )
}

/// Sequential GFF2 writer for discordant event features
///
/// The header is written on construction.
///
pub struct GffFeatureWriter<W: Write> {
    out: W,
    feature_count: usize,
}

impl<W: Write> GffFeatureWriter<W> {
    pub fn new(mut out: W, header_info: &FeatureHeaderInfo) -> io::Result<Self> {
        writeln!(out, "##gff-version 2")?;
        writeln!(out, "##source-version {PROGRAM_NAME} {PROGRAM_VERSION}")?;
        writeln!(out, "##date {}", chrono::Local::now().format("%Y-%m-%d"))?;
        writeln!(out, "# smoothing window={}", header_info.window)?;
        writeln!(out, "# minimum feature length={}", header_info.min_size)?;
        Ok(Self {
            out,
            feature_count: 0,
        })
    }

    pub fn write_event(&mut self, event: &CandidateEvent) -> io::Result<()> {
        writeln!(self.out, "{}", format_event_feature(event))?;
        self.feature_count += 1;
        Ok(())
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

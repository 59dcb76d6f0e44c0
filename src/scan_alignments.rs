//! Scan an alignment file for discordant events in each read
//!

use std::io::Write;

use log::info;
use rayon::prelude::*;
use rust_htslib::bam::{self, Read};
use simple_error::{SimpleResult, try_with};
use unwrap::unwrap;

use crate::alignment_record::AlignmentRecord;
use crate::cost_signal::get_cost_signal;
use crate::feature_output::GffFeatureWriter;
use crate::log_utils::debug_msg;
use crate::refine_breakpoints::{BreakpointRefiner, RefineSkip};
use crate::run_stats::{EventStats, RecordStats};
use crate::segment_events::{CandidateEvent, EventSegmenter};
use crate::smooth_signal::smooth_cost_signal;

/// Number of alignment records read from the input before the batch is distributed to workers
const RECORD_BATCH_SIZE: usize = 2000;

/// Settings used for each record in the scan
pub struct RecordScanSettings {
    pub window: usize,
    pub min_size: usize,

    /// Print refinement diagnostics directly to stderr
    pub verbose: bool,
}

pub struct RecordScanResult<'a> {
    /// Events in the order they occur along the record's alignment
    pub events: Vec<CandidateEvent<'a>>,

    pub event_stats: EventStats,

    /// True if the record's cost signal was too short to smooth
    pub is_short: bool,
}

/// Find all discordant events in one alignment record, and refine each one if possible
///
/// When refinement is skipped for an event, the event is reported with its unrefined
/// coordinates.
///
pub fn scan_alignment_record<'a>(
    record: &'a AlignmentRecord,
    settings: &RecordScanSettings,
    refiner: Option<&BreakpointRefiner>,
) -> RecordScanResult<'a> {
    let mut event_stats = EventStats::default();

    let signal = get_cost_signal(record);
    if signal.len() <= settings.window {
        return RecordScanResult {
            events: Vec::new(),
            event_stats,
            is_short: true,
        };
    }
    let smoothed = smooth_cost_signal(&signal, settings.window);

    let mut events = Vec::new();
    for event in EventSegmenter::new(record, smoothed, settings.min_size) {
        event_stats.candidate_event_count += 1;

        let refined = match refiner {
            Some(refiner) => refiner.refine(&event),
            None => Err(RefineSkip::Disabled),
        };

        match refined {
            Ok(refined_event) => {
                event_stats.refined_event_count += 1;
                if refined_event.duplication_len.is_some() {
                    event_stats.duplication_event_count += 1;
                }
                events.push(refined_event);
            }
            Err(reason) => {
                if reason != RefineSkip::Disabled {
                    debug_msg!(
                        settings.verbose,
                        "Breakpoint refinement failed for read '{}' event {:?}: {}",
                        record.query_name,
                        event,
                        reason
                    );
                }
                event_stats.add_refine_skip(&reason);
                events.push(event);
            }
        }
    }

    RecordScanResult {
        events,
        event_stats,
        is_short: false,
    }
}

/// Read the next batch of mapped records from the alignment file
///
/// Returns an empty batch at the end of the file.
///
fn read_record_batch(
    bam_reader: &mut bam::Reader,
    header: &bam::HeaderView,
    record_stats: &mut RecordStats,
) -> SimpleResult<Vec<AlignmentRecord>> {
    let mut batch = Vec::with_capacity(RECORD_BATCH_SIZE);
    let mut record = bam::Record::new();
    while batch.len() < RECORD_BATCH_SIZE {
        match bam_reader.read(&mut record) {
            None => break,
            Some(r) => {
                record_stats.total_record_count += 1;
                try_with!(
                    r,
                    "Failed to parse alignment record {}",
                    record_stats.total_record_count
                );
            }
        }

        if record.is_unmapped() {
            record_stats.unmapped_record_count += 1;
            continue;
        }

        let alignment_record = try_with!(
            AlignmentRecord::from_bam_record(&record, header),
            "Failed to convert alignment record {}",
            record_stats.total_record_count
        );
        batch.push(alignment_record);
    }
    Ok(batch)
}

/// Scan all records of an alignment file and write the discordant events found in each
///
/// Records are read in batches which are processed on `thread_count` worker threads. Events
/// are written in input record order.
///
/// Returns stats for all records and events in the file.
///
pub fn scan_alignment_file<W: Write>(
    bam_filename: &str,
    ref_filename: Option<&str>,
    thread_count: usize,
    settings: &RecordScanSettings,
    refiner: Option<&BreakpointRefiner>,
    writer: &mut GffFeatureWriter<W>,
) -> SimpleResult<(RecordStats, EventStats)> {
    assert!(thread_count > 0);

    info!("Processing alignment file '{bam_filename}'");

    let mut bam_reader = try_with!(
        bam::Reader::from_path(bam_filename),
        "Failed to open alignment file '{bam_filename}'"
    );
    if let Some(ref_filename) = ref_filename {
        try_with!(
            bam_reader.set_reference(ref_filename),
            "Failed to set reference '{ref_filename}' for alignment file '{bam_filename}'"
        );
    }
    let header = bam_reader.header().clone();

    let worker_pool = unwrap!(
        rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .build(),
        "Unable to create worker thread pool"
    );

    let mut record_stats = RecordStats::default();
    let mut event_stats = EventStats::default();
    loop {
        let batch = read_record_batch(&mut bam_reader, &header, &mut record_stats)?;
        if batch.is_empty() {
            break;
        }

        let results = worker_pool.install(|| {
            batch
                .par_iter()
                .map(|record| scan_alignment_record(record, settings, refiner))
                .collect::<Vec<_>>()
        });

        for result in results {
            if result.is_short {
                record_stats.short_record_count += 1;
            }
            event_stats.merge(&result.event_stats);
            for event in result.events.iter() {
                try_with!(writer.write_event(event), "Failed to write feature output");
            }
        }
    }

    try_with!(writer.flush(), "Failed to write feature output");

    info!(
        "Finished processing {} alignment records, found {} discordant events",
        record_stats.total_record_count, event_stats.candidate_event_count
    );

    Ok((record_stats, event_stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment_record::OpKind;
    use crate::alignment_record::tests::get_test_record;
    use crate::genome_ref::GenomeRef;
    use crate::int_range::IntRange;
    use crate::refine_breakpoints::{AlignmentScores, RefinerSettings};

    fn get_test_settings(window: usize, min_size: usize) -> RecordScanSettings {
        RecordScanSettings {
            window,
            min_size,
            verbose: false,
        }
    }

    #[test]
    fn test_scan_deletion_record() {
        use OpKind::*;
        let record = get_test_record(&[(Match, 50), (Deletion, 80), (Match, 50)]);
        let result = scan_alignment_record(&record, &get_test_settings(10, 50), None);

        assert!(!result.is_short);
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].ref_range, IntRange::from_pair(50, 132));
        assert_eq!(result.event_stats.candidate_event_count, 1);
        assert_eq!(result.event_stats.refine_skip_counts["disabled"], 1);
    }

    #[test]
    fn test_scan_short_record() {
        let record = get_test_record(&[(OpKind::Match, 10)]);
        let result = scan_alignment_record(&record, &get_test_settings(10, 50), None);
        assert!(result.is_short);
        assert!(result.events.is_empty());
    }

    #[test]
    fn test_scan_and_refine_insertion_record() {
        // Reference without T bases so that the poly-T insertion can't align
        let contig = {
            let mut state = 17u64;
            (0..1000)
                .map(|_| {
                    state = state
                        .wrapping_mul(6364136223846793005)
                        .wrapping_add(1442695040888963407);
                    b"ACG"[((state >> 33) % 3) as usize]
                })
                .collect::<Vec<_>>()
        };

        // Insert 100 T bases at position 500 with a 20 base target site duplication
        let mut query_seq = contig[..500].to_vec();
        query_seq.extend(std::iter::repeat_n(b'T', 100));
        query_seq.extend(&contig[480..]);

        use OpKind::*;
        let mut record = get_test_record(&[(Match, 500), (Insertion, 120), (Match, 500)]);
        record.query_seq = query_seq;

        let mut genome_ref = GenomeRef::default();
        genome_ref.chroms.insert("chr1".to_string(), contig);

        let refiner_settings = RefinerSettings {
            ref_window: 300,
            query_window: 500,
            min_query_gap: 20,
            min_ref_flank: 10,
            scores: AlignmentScores {
                match_: 1,
                mismatch: -2,
                gap: -3,
            },
        };
        let refiner = BreakpointRefiner::new(refiner_settings, &genome_ref);

        let settings = get_test_settings(50, 100);
        let result = scan_alignment_record(&record, &settings, Some(&refiner));

        assert_eq!(result.events.len(), 1);
        let event = &result.events[0];
        assert_eq!(event.ref_range, IntRange::from_pair(480, 480));
        assert_eq!(event.query_range, IntRange::from_pair(500, 600));
        assert_eq!(event.duplication_len, Some(20));
        assert_eq!(result.event_stats.refined_event_count, 1);
        assert_eq!(result.event_stats.duplication_event_count, 1);

        // The same event is reported unrefined without a refiner
        let result = scan_alignment_record(&record, &settings, None);
        assert_eq!(result.events.len(), 1);
        let event = &result.events[0];
        assert_eq!(event.ref_range, IntRange::from_pair(490, 511));
        assert_eq!(event.query_range, IntRange::from_pair(493, 629));
        assert_eq!(event.duplication_len, None);
    }
}

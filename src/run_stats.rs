//! Track stats for the whole riftfinder run
//!

use std::collections::BTreeMap;
use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};
use unwrap::unwrap;

use crate::refine_breakpoints::RefineSkip;
use crate::scan::RUN_STATS_FILENAME;

#[derive(Default, Deserialize, Serialize)]
pub struct RecordStats {
    pub total_record_count: usize,
    pub unmapped_record_count: usize,

    /// Records with fewer operation units than the smoothing window, which can't produce a
    /// smoothed signal
    pub short_record_count: usize,
}

#[derive(Default, Deserialize, Serialize)]
pub struct EventStats {
    pub candidate_event_count: usize,
    pub refined_event_count: usize,
    pub duplication_event_count: usize,

    /// Count of unrefined events by the reason refinement was skipped
    pub refine_skip_counts: BTreeMap<String, usize>,
}

impl EventStats {
    pub fn add_refine_skip(&mut self, reason: &RefineSkip) {
        *self
            .refine_skip_counts
            .entry(reason.label().to_string())
            .or_default() += 1;
    }

    pub fn merge(&mut self, other: &Self) {
        self.candidate_event_count += other.candidate_event_count;
        self.refined_event_count += other.refined_event_count;
        self.duplication_event_count += other.duplication_event_count;
        for (label, count) in other.refine_skip_counts.iter() {
            *self.refine_skip_counts.entry(label.clone()).or_default() += count;
        }
    }
}

#[derive(Default, Deserialize, Serialize)]
pub struct ScanRunStats {
    pub record_stats: RecordStats,
    pub event_stats: EventStats,
    pub output_feature_count: usize,
    pub total_scan_time_secs: f64,
}

/// Write run_stats structure out in json format
pub fn write_scan_run_stats(output_dir: &Utf8Path, run_stats: &ScanRunStats) {
    let filename = output_dir.join(RUN_STATS_FILENAME);

    info!("Writing run statistics to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create run statistics json file: '{filename}'"
    );

    unwrap!(
        serde_json::to_writer_pretty(&f, &run_stats),
        "Unable to write run statistics json file: '{filename}'"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refine_breakpoints::JunctionSide;

    #[test]
    fn test_event_stats_merge() {
        let mut stats = EventStats::default();
        stats.candidate_event_count = 2;
        stats.add_refine_skip(&RefineSkip::NoQuerySequence);

        let mut other = EventStats::default();
        other.candidate_event_count = 3;
        other.refined_event_count = 1;
        other.add_refine_skip(&RefineSkip::NoQuerySequence);
        other.add_refine_skip(&RefineSkip::NoAlignment {
            side: JunctionSide::Right,
        });

        stats.merge(&other);
        assert_eq!(stats.candidate_event_count, 5);
        assert_eq!(stats.refined_event_count, 1);
        assert_eq!(stats.refine_skip_counts["no_query_sequence"], 2);
        assert_eq!(stats.refine_skip_counts["no_alignment"], 1);
    }
}

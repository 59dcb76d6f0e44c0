//! Segment a smoothed cost signal into candidate discordant events
//!

use std::fmt;

use crate::alignment_record::AlignmentRecord;
use crate::int_range::IntRange;
use crate::smooth_signal::SmoothedSample;

/// A discordant region of one read's alignment
///
/// Reference and query ranges are zero-indexed and half-open. Query positions are in the
/// stored (reference-forward) orientation of the read.
///
#[derive(Clone)]
pub struct CandidateEvent<'a> {
    pub record: &'a AlignmentRecord,
    pub ref_range: IntRange,
    pub query_range: IntRange,

    /// Length of the target site duplication, set only when breakpoint refinement found the
    /// non-colinear junction pattern
    pub duplication_len: Option<i64>,
}

impl<'a> CandidateEvent<'a> {
    pub fn new(record: &'a AlignmentRecord, ref_range: IntRange, query_range: IntRange) -> Self {
        Self {
            record,
            ref_range,
            query_range,
            duplication_len: None,
        }
    }

    /// True if the read has more sequence than the reference in the event region
    pub fn is_insertion(&self) -> bool {
        self.query_range.size() > self.ref_range.size()
    }
}

impl fmt::Debug for CandidateEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "read: {} ref: {}:{:?} query: {:?} dup: {:?}",
            self.record.query_name,
            self.record.ref_name,
            self.ref_range,
            self.query_range,
            self.duplication_len
        )
    }
}

/// Segmentation state carried between smoothed samples
///
#[derive(Clone, Copy, Debug, PartialEq)]
enum FoldState {
    Closed,
    Open { ref_start: i64, query_start: i64 },
}

/// Iterate through the candidate events found in one record's smoothed cost signal
///
/// An event opens when the smoothed cost crosses from non-negative to negative, and closes
/// when it crosses back. Closed events are kept only if the reference or query span is at least
/// `min_size`. An event still open at the end of the signal is discarded.
///
pub struct EventSegmenter<'a> {
    record: &'a AlignmentRecord,
    smoothed: Vec<SmoothedSample>,
    min_size: i64,

    /// Index of the next smoothed sample to scan
    index: usize,

    state: FoldState,
}

impl<'a> EventSegmenter<'a> {
    pub fn new(
        record: &'a AlignmentRecord,
        smoothed: Vec<SmoothedSample>,
        min_size: usize,
    ) -> Self {
        Self {
            record,
            smoothed,
            min_size: min_size as i64,
            index: 1,
            state: FoldState::Closed,
        }
    }
}

impl<'a> Iterator for EventSegmenter<'a> {
    type Item = CandidateEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.smoothed.len() {
            let prev = &self.smoothed[self.index - 1];
            let current = &self.smoothed[self.index];
            self.index += 1;

            match self.state {
                FoldState::Closed => {
                    if prev.cost >= 0.0 && current.cost < 0.0 {
                        self.state = FoldState::Open {
                            ref_start: current.ref_pos + 1,
                            query_start: current.query_pos + 1,
                        };
                    }
                }
                FoldState::Open {
                    ref_start,
                    query_start,
                } => {
                    if prev.cost < 0.0 && current.cost >= 0.0 {
                        self.state = FoldState::Closed;
                        let ref_range = IntRange::from_pair(ref_start, current.ref_pos);
                        let query_range = IntRange::from_pair(query_start, current.query_pos);
                        if ref_range.size() >= self.min_size || query_range.size() >= self.min_size
                        {
                            return Some(CandidateEvent::new(self.record, ref_range, query_range));
                        }
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment_record::OpKind;
    use crate::alignment_record::tests::get_test_record;
    use crate::cost_signal::get_cost_signal;
    use crate::smooth_signal::smooth_cost_signal;

    /// Build a smoothed signal directly, with positions following the sample index
    fn get_smoothed(costs: &[f64]) -> Vec<SmoothedSample> {
        costs
            .iter()
            .enumerate()
            .map(|(i, &cost)| SmoothedSample {
                ref_pos: 100 + i as i64,
                query_pos: 10 * i as i64,
                cost,
            })
            .collect()
    }

    #[test]
    fn test_single_event() {
        let record = get_test_record(&[]);
        let smoothed = get_smoothed(&[0.5, 0.0, -1.0, -0.5, -0.1, 0.0, 1.0]);
        let events = EventSegmenter::new(&record, smoothed, 0).collect::<Vec<_>>();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].ref_range, IntRange::from_pair(103, 105));
        assert_eq!(events[0].query_range, IntRange::from_pair(21, 50));
        assert_eq!(events[0].duplication_len, None);
    }

    #[test]
    fn test_unclosed_event() {
        let record = get_test_record(&[]);
        let smoothed = get_smoothed(&[0.5, 0.5, -1.0, -1.0, -1.0]);
        assert_eq!(EventSegmenter::new(&record, smoothed, 0).count(), 0);
    }

    #[test]
    fn test_leading_negative_signal() {
        // The signal must cross from non-negative to negative to open an event
        let record = get_test_record(&[]);
        let smoothed = get_smoothed(&[-1.0, -1.0, 1.0, 1.0]);
        assert_eq!(EventSegmenter::new(&record, smoothed, 0).count(), 0);
    }

    #[test]
    fn test_min_size() {
        let record = get_test_record(&[]);
        let costs = [1.0, -1.0, -1.0, -1.0, -1.0, 1.0];

        // Event spans 3 reference and 39 query positions
        let events = EventSegmenter::new(&record, get_smoothed(&costs), 5).collect::<Vec<_>>();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].ref_range.size(), 3);
        assert_eq!(events[0].query_range.size(), 39);

        assert_eq!(
            EventSegmenter::new(&record, get_smoothed(&costs), 40).count(),
            0
        );

        // Reference-only span meeting the threshold
        let smoothed = costs
            .iter()
            .enumerate()
            .map(|(i, &cost)| SmoothedSample {
                ref_pos: 10 * i as i64,
                query_pos: 0,
                cost,
            })
            .collect::<Vec<_>>();
        let events = EventSegmenter::new(&record, smoothed, 30).collect::<Vec<_>>();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].ref_range, IntRange::from_pair(11, 50));
        assert_eq!(events[0].query_range, IntRange::from_pair(1, 0));
    }

    #[test]
    fn test_multiple_events() {
        let record = get_test_record(&[]);
        let smoothed = get_smoothed(&[1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0, -1.0, 0.0]);
        let events = EventSegmenter::new(&record, smoothed, 0).collect::<Vec<_>>();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].ref_range, IntRange::from_pair(102, 103));
        assert_eq!(events[1].ref_range, IntRange::from_pair(106, 108));
    }

    #[test]
    fn test_deletion_from_alignment() {
        use OpKind::*;
        let record = get_test_record(&[(Match, 50), (Deletion, 80), (Match, 50)]);
        let window = 10;
        let signal = get_cost_signal(&record);
        let smoothed = smooth_cost_signal(&signal, window);
        let events = EventSegmenter::new(&record, smoothed, 50).collect::<Vec<_>>();

        assert_eq!(events.len(), 1);
        let event = &events[0];
        let half_window = (window / 2) as i64;
        assert!((event.ref_range.start - 50).abs() <= half_window);
        assert!((event.ref_range.end - 130).abs() <= half_window);
        assert_eq!(event.ref_range, IntRange::from_pair(50, 132));
        assert_eq!(event.query_range, IntRange::from_pair(49, 52));
        assert!(!event.is_insertion());
    }
}

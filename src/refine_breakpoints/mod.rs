//! Refine the breakpoints of insertion-like discordant events
//!
//! Refinement aligns the read sequence on each side of the event's query midpoint back to the
//! reference around the event's reference midpoint:
//!
//! ```text
//!                    l      s   e      r
//!  ref:         -----|------+~~~+------|----------
//!
//!  query_left:  ----|-----------+~~~~~~|
//!                   l           s      m
//!  query_right:                        |~~~~~~+-----------|---
//!                                      m      e           r
//! ```
//!
//! where `~` is the discordant region found by segmentation and `m` is its query midpoint. The
//! left query window starts `query_window` bases before the event's query start and the right
//! query window ends `query_window` bases after the event's query end, so both windows reach
//! the read flanks however long the inserted sequence is. The end of the left alignment anchors
//! the left breakpoint and the start of the right alignment anchors the right breakpoint.
//!
//! If the right anchor falls at or after the left anchor on the reference, the junction is
//! colinear. Equal anchors are a clean insertion and get no duplication length. Otherwise the
//! reference segment between the two anchors occurs on both sides of the inserted sequence in
//! the read, which is interpreted as a target site duplication:
//!
//! ```text
//!                              e   s
//!  ref:             -----------+---+-----------------
//!                             / \ / \
//!                            /   /   \
//!                           /   / \   \
//!  query: ------------------+---+-----+---+----------
//!                               s     e
//! ```
//!
//! In this case the reference breakpoint is collapsed to the right anchor and the duplication
//! length is reported.
//!

mod local_align;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use self::local_align::AlignmentScores;
use self::local_align::local_align;
use crate::genome_ref::GenomeRef;
use crate::int_range::IntRange;
use crate::segment_events::CandidateEvent;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RefinerSettings {
    /// Size of the reference window centered on the event's reference midpoint
    pub ref_window: usize,

    /// Distance the query windows extend beyond the event's query start (left window) and query
    /// end (right window). Both windows are bounded by the event's query midpoint.
    pub query_window: usize,

    /// Minimum distance from each query anchor to the query midpoint
    pub min_query_gap: usize,

    /// Minimum distance from each reference anchor to either edge of the reference window
    ///
    /// Both edges are checked for both anchors, so an anchor that runs to within this distance of
    /// the opposite window edge is also rejected.
    pub min_ref_flank: usize,

    pub scores: AlignmentScores,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JunctionSide {
    Left,
    Right,
}

impl fmt::Display for JunctionSide {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JunctionSide::Left => write!(f, "left"),
            JunctionSide::Right => write!(f, "right"),
        }
    }
}

/// Reasons that breakpoint refinement is not applied to a candidate event
///
/// None of these are errors. The unrefined event is reported instead.
///
#[derive(Clone, Debug, PartialEq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RefineSkip {
    Disabled,
    NotInsertion {
        query_len: i64,
        ref_len: i64,
    },
    NoContig {
        ref_name: String,
    },
    NoQuerySequence,
    EmptyRefWindow,
    NoAlignment {
        side: JunctionSide,
    },
    InsufficientRefFlank {
        side: JunctionSide,
        flank: i64,
        min_ref_flank: usize,
    },
    InsufficientQueryGap {
        side: JunctionSide,
        gap: i64,
        min_query_gap: usize,
    },
}

impl RefineSkip {
    /// Short label for run statistics
    pub fn label(&self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for RefineSkip {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use RefineSkip::*;
        match self {
            Disabled => write!(f, "breakpoint refinement is disabled"),
            NotInsertion { query_len, ref_len } => write!(
                f,
                "not an insertion: query length {query_len} does not exceed reference length {ref_len}"
            ),
            NoContig { ref_name } => write!(f, "no reference sequence for '{ref_name}'"),
            NoQuerySequence => write!(f, "no query sequence stored for the read"),
            EmptyRefWindow => write!(f, "event reference window is outside of the contig"),
            NoAlignment { side } => {
                write!(f, "no local alignment found for the {side} junction")
            }
            InsufficientRefFlank {
                side,
                flank,
                min_ref_flank,
            } => write!(
                f,
                "insufficient reference flank: {side} anchor is {flank} from the reference window edge, less than {min_ref_flank}"
            ),
            InsufficientQueryGap {
                side,
                gap,
                min_query_gap,
            } => write!(
                f,
                "insufficient query gap: {side} anchor is {gap} from the query midpoint, less than {min_query_gap}"
            ),
        }
    }
}

/// A slice of a contig sequence and its offset in the contig
///
struct RefinementWindow<'a> {
    offset: i64,
    seq: &'a [u8],
}

impl<'a> RefinementWindow<'a> {
    /// Get a window of up to `window_size` bases centered on `center`, clamped to the contig
    ///
    fn new(contig: &'a [u8], center: i64, window_size: usize) -> Option<Self> {
        let half_size = (window_size / 2) as i64;
        let range = IntRange::from_pair(center - half_size, center + half_size)
            .clamp_to_size(contig.len() as i64);
        if range.size() <= 0 {
            return None;
        }
        Some(Self {
            offset: range.start,
            seq: &contig[range.start as usize..range.end as usize],
        })
    }

    fn len(&self) -> i64 {
        self.seq.len() as i64
    }
}

/// A breakpoint position in the reference window and query window coordinates of the alignment
/// that found it
struct Anchor {
    ref_pos: i64,
    query_pos: i64,
}

pub struct BreakpointRefiner<'a> {
    settings: RefinerSettings,
    genome_ref: &'a GenomeRef,
}

impl<'a> BreakpointRefiner<'a> {
    pub fn new(settings: RefinerSettings, genome_ref: &'a GenomeRef) -> Self {
        Self {
            settings,
            genome_ref,
        }
    }

    /// Check that both reference anchors are at least min_ref_flank from each edge of the
    /// reference window
    ///
    fn check_ref_flank(
        &self,
        side: JunctionSide,
        anchor: &Anchor,
        ref_window: &RefinementWindow,
    ) -> Result<(), RefineSkip> {
        let flank = std::cmp::min(anchor.ref_pos, ref_window.len() - anchor.ref_pos);
        if flank < self.settings.min_ref_flank as i64 {
            return Err(RefineSkip::InsufficientRefFlank {
                side,
                flank,
                min_ref_flank: self.settings.min_ref_flank,
            });
        }
        Ok(())
    }

    fn check_query_gap(&self, side: JunctionSide, gap: i64) -> Result<(), RefineSkip> {
        if gap < self.settings.min_query_gap as i64 {
            return Err(RefineSkip::InsufficientQueryGap {
                side,
                gap,
                min_query_gap: self.settings.min_query_gap,
            });
        }
        Ok(())
    }

    /// Align `query_range` of the read to the reference window and return the requested
    /// anchor
    fn get_anchor(
        &self,
        side: JunctionSide,
        ref_window: &RefinementWindow,
        query_seq: &[u8],
        query_range: &IntRange,
    ) -> Result<Anchor, RefineSkip> {
        let query_window = &query_seq[query_range.start as usize..query_range.end as usize];
        let alignment = local_align(ref_window.seq, query_window, &self.settings.scores)
            .ok_or(RefineSkip::NoAlignment { side })?;
        let anchor = match side {
            JunctionSide::Left => alignment.last_segment().map(|x| Anchor {
                ref_pos: x.ref_range.end,
                query_pos: x.query_range.end,
            }),
            JunctionSide::Right => alignment.first_segment().map(|x| Anchor {
                ref_pos: x.ref_range.start,
                query_pos: x.query_range.start,
            }),
        };
        anchor.ok_or(RefineSkip::NoAlignment { side })
    }

    /// Refine the breakpoints of a candidate insertion event
    ///
    /// The event's query range must be in the stored orientation of the read sequence.
    ///
    /// Returns the refined event, or the reason that refinement could not be applied. The
    /// input event is not modified in either case.
    ///
    pub fn refine<'b>(&self, event: &CandidateEvent<'b>) -> Result<CandidateEvent<'b>, RefineSkip> {
        if !event.is_insertion() {
            return Err(RefineSkip::NotInsertion {
                query_len: event.query_range.size(),
                ref_len: event.ref_range.size(),
            });
        }

        let record = event.record;
        let contig = self.genome_ref.chroms.get(&record.ref_name).ok_or_else(|| {
            RefineSkip::NoContig {
                ref_name: record.ref_name.clone(),
            }
        })?;

        let query_seq = record.query_seq.as_slice();
        if query_seq.is_empty() {
            return Err(RefineSkip::NoQuerySequence);
        }

        let ref_window = RefinementWindow::new(
            contig,
            event.ref_range.center(),
            self.settings.ref_window,
        )
        .ok_or(RefineSkip::EmptyRefWindow)?;

        let query_len = query_seq.len() as i64;
        let query_mid = event.query_range.center();
        let query_window = self.settings.query_window as i64;
        let left_query_range =
            IntRange::from_pair(event.query_range.start - query_window, query_mid)
                .clamp_to_size(query_len);
        let right_query_range =
            IntRange::from_pair(query_mid, event.query_range.end + query_window)
                .clamp_to_size(query_len);

        let left = self.get_anchor(JunctionSide::Left, &ref_window, query_seq, &left_query_range)?;
        let right = self.get_anchor(
            JunctionSide::Right,
            &ref_window,
            query_seq,
            &right_query_range,
        )?;

        self.check_ref_flank(JunctionSide::Left, &left, &ref_window)?;
        self.check_ref_flank(JunctionSide::Right, &right, &ref_window)?;

        self.check_query_gap(JunctionSide::Left, left_query_range.size() - left.query_pos)?;
        self.check_query_gap(JunctionSide::Right, right.query_pos)?;

        let mut ref_range =
            IntRange::from_pair(ref_window.offset + left.ref_pos, ref_window.offset + right.ref_pos);
        // Only a strictly reversed pair of anchors is a duplication. Equal anchors are the clean
        // colinear insertion.
        let duplication_len = if ref_range.end < ref_range.start {
            let dup = ref_range.start - ref_range.end;
            ref_range.start = ref_range.end;
            Some(dup)
        } else {
            None
        };

        let query_range = IntRange::from_pair(
            left_query_range.start + left.query_pos,
            right_query_range.start + right.query_pos,
        );

        Ok(CandidateEvent {
            record,
            ref_range,
            query_range,
            duplication_len,
        })
    }
}

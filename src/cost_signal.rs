//! Per-position alignment cost signal
//!
//! Each unit of each alignment operation contributes one cost sample at the reference/query
//! position where the unit starts. Runs of net-negative cost mark regions where the read is
//! discordant with the reference.
//!

use crate::alignment_record::{AlignmentOperation, AlignmentRecord, OpKind};

/// Fixed cost of one unit of the given operation type
///
/// Any operation type without a specific cost contributes zero.
///
pub fn get_op_cost(kind: OpKind) -> i32 {
    use OpKind::*;
    match kind {
        Match => 1,
        Mismatch => -1,
        Insertion | Deletion => -2,
        SoftClip => 0,
        AlignMatch | RefSkip | HardClip | Pad => 0,
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CostSample {
    pub ref_pos: i64,
    pub query_pos: i64,
    pub cost: i32,
}

/// Iterate through the cost samples of one alignment record
///
pub struct CostSignalBuilder<'a> {
    ops: std::slice::Iter<'a, AlignmentOperation>,

    /// The operation currently being expanded, and the number of its units not yet emitted
    current: Option<(OpKind, u32)>,

    ref_pos: i64,
    query_pos: i64,
}

impl<'a> CostSignalBuilder<'a> {
    pub fn new(record: &'a AlignmentRecord) -> Self {
        Self {
            ops: record.ops.iter(),
            current: None,
            ref_pos: record.ref_start,
            query_pos: 0,
        }
    }
}

impl Iterator for CostSignalBuilder<'_> {
    type Item = CostSample;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.current {
                Some((kind, remaining)) if remaining > 0 => {
                    let sample = CostSample {
                        ref_pos: self.ref_pos,
                        query_pos: self.query_pos,
                        cost: get_op_cost(kind),
                    };
                    let (ref_offset, query_offset) = kind.consumes();
                    self.ref_pos += ref_offset;
                    self.query_pos += query_offset;
                    self.current = Some((kind, remaining - 1));
                    return Some(sample);
                }
                _ => {
                    let op = self.ops.next()?;
                    self.current = Some((op.kind, op.len));
                }
            }
        }
    }
}

/// Get the full cost signal for an alignment record
///
pub fn get_cost_signal(record: &AlignmentRecord) -> Vec<CostSample> {
    let mut signal = Vec::with_capacity(record.op_unit_count());
    signal.extend(CostSignalBuilder::new(record));
    signal
}

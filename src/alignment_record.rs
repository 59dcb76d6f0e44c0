//! Decoded alignment records consumed by the discordance scan
//!
//! The scan works from this simplified, owned form of an alignment record so that the signal
//! and refinement logic is independent of htslib.
//!

use std::fmt;

use rust_htslib::bam::{self, record::Cigar};
use simple_error::{SimpleResult, bail};

use crate::int_range::IntRange;

/// Edit operation types found in an alignment CIGAR string
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpKind {
    /// Sequence match (=)
    Match,
    /// Sequence mismatch (X)
    Mismatch,
    Insertion,
    Deletion,
    SoftClip,
    /// Alignment match (M), which does not distinguish match from mismatch
    AlignMatch,
    RefSkip,
    HardClip,
    Pad,
}

impl OpKind {
    /// Number of (reference, query) positions consumed by one unit of this operation type
    ///
    pub fn consumes(&self) -> (i64, i64) {
        use OpKind::*;
        match self {
            Match | Mismatch | AlignMatch => (1, 1),
            Insertion | SoftClip => (0, 1),
            Deletion | RefSkip => (1, 0),
            HardClip | Pad => (0, 0),
        }
    }
}

/// A length-counted edit operation
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AlignmentOperation {
    pub kind: OpKind,
    pub len: u32,
}

impl AlignmentOperation {
    pub fn new(kind: OpKind, len: u32) -> Self {
        Self { kind, len }
    }
}

impl From<&Cigar> for AlignmentOperation {
    fn from(c: &Cigar) -> Self {
        use Cigar::*;
        let (kind, len) = match *c {
            Match(len) => (OpKind::AlignMatch, len),
            Ins(len) => (OpKind::Insertion, len),
            Del(len) => (OpKind::Deletion, len),
            RefSkip(len) => (OpKind::RefSkip, len),
            SoftClip(len) => (OpKind::SoftClip, len),
            HardClip(len) => (OpKind::HardClip, len),
            Pad(len) => (OpKind::Pad, len),
            Equal(len) => (OpKind::Match, len),
            Diff(len) => (OpKind::Mismatch, len),
        };
        Self::new(kind, len)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strand {
    Plus,
    Minus,
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

/// One read's alignment to a reference contig
///
/// All positions are zero-indexed.
///
#[derive(Clone, Debug)]
pub struct AlignmentRecord {
    pub ref_name: String,
    pub ref_start: i64,
    pub strand: Strand,
    pub ops: Vec<AlignmentOperation>,
    pub query_name: String,

    /// Full length of the query sequence, including any soft-clipped bases
    ///
    /// For records without stored sequence this is the query length consumed by the alignment.
    pub query_len: usize,

    /// Query sequence as stored in the alignment file, in reference-forward orientation
    ///
    /// This may be empty if the alignment file does not store sequence for the record.
    pub query_seq: Vec<u8>,
}

impl AlignmentRecord {
    /// Total number of operation units in the record, which is also the length of its cost
    /// signal
    ///
    pub fn op_unit_count(&self) -> usize {
        self.ops.iter().map(|x| x.len as usize).sum()
    }

    /// Translate a query range in stored orientation into the read's sequencing orientation
    ///
    /// Plus strand records are returned unchanged. Minus strand ranges are mirrored over the
    /// full stored query length, including soft-clipped bases.
    ///
    pub fn get_seq_order_query_range(&self, query_range: &IntRange) -> IntRange {
        let mut query_range = query_range.clone();
        if self.strand == Strand::Minus {
            query_range.reverse(self.query_len as i64);
        }
        query_range
    }

    /// Convert a mapped htslib record into an AlignmentRecord
    ///
    /// Returns an error for records with coordinates that can't be interpreted, such as a
    /// negative mapping position or a reference id missing from the header.
    ///
    pub fn from_bam_record(record: &bam::Record, header: &bam::HeaderView) -> SimpleResult<Self> {
        let query_name = String::from_utf8_lossy(record.qname()).to_string();

        let tid = record.tid();
        if tid < 0 || tid as u32 >= header.target_count() {
            bail!("Invalid reference id {tid} in alignment record for read '{query_name}'");
        }
        let ref_name = String::from_utf8_lossy(header.tid2name(tid as u32)).to_string();

        let ref_start = record.pos();
        if ref_start < 0 {
            bail!("Invalid alignment position {ref_start} for read '{query_name}'");
        }

        let strand = if record.is_reverse() {
            Strand::Minus
        } else {
            Strand::Plus
        };

        let ops = record
            .cigar()
            .iter()
            .map(AlignmentOperation::from)
            .collect::<Vec<_>>();

        let query_seq = record.seq().as_bytes();

        let query_consumed = ops
            .iter()
            .map(|x| x.kind.consumes().1 * x.len as i64)
            .sum::<i64>();

        // Records without stored sequence take the query length from the alignment
        let query_len = if query_seq.is_empty() {
            query_consumed as usize
        } else {
            if query_consumed != query_seq.len() as i64 {
                bail!(
                    "Alignment for read '{query_name}' consumes {query_consumed} query bases but the stored sequence length is {}",
                    query_seq.len()
                );
            }
            query_seq.len()
        };

        Ok(Self {
            ref_name,
            ref_start,
            strand,
            ops,
            query_name,
            query_len,
            query_seq,
        })
    }
}

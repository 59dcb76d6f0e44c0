use std::str::FromStr;

use bio::alignment::pairwise::{Aligner, Scoring};
use bio::alignment::{Alignment, AlignmentOperation};
use serde::{Deserialize, Serialize};
use simple_error::{SimpleError, bail};

use crate::int_range::IntRange;

/// Match, mismatch and gap weights used for breakpoint refinement alignments
///
/// Gaps are scored linearly, so a gap of length n scores n * gap.
///
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AlignmentScores {
    pub match_: i32,
    pub mismatch: i32,
    pub gap: i32,
}

impl Default for AlignmentScores {
    fn default() -> Self {
        Self {
            match_: 1,
            mismatch: -1,
            gap: -1,
        }
    }
}

impl FromStr for AlignmentScores {
    type Err = SimpleError;

    /// Parse from a "match,mismatch,gap" string
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s.split(',').collect::<Vec<_>>();
        if fields.len() != 3 {
            bail!("Expected 3 comma-separated alignment scores but found: '{s}'");
        }
        let mut scores = [0i32; 3];
        for (score, field) in scores.iter_mut().zip(fields.iter()) {
            *score = match field.trim().parse() {
                Ok(x) => x,
                Err(e) => bail!("Invalid alignment score '{field}' in '{s}': {e}"),
            };
        }
        Ok(Self {
            match_: scores[0],
            mismatch: scores[1],
            gap: scores[2],
        })
    }
}

impl std::fmt::Display for AlignmentScores {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{},{},{}", self.match_, self.mismatch, self.gap)
    }
}

/// A gap-free block of a local alignment
///
/// Ranges are in the coordinates of the reference and query sequences given to the aligner.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlignedSegment {
    pub ref_range: IntRange,
    pub query_range: IntRange,
}

/// Local alignment summarized as its gap-free blocks in alignment order
///
#[derive(Debug)]
pub struct LocalAlignment {
    pub segments: Vec<AlignedSegment>,
    pub score: i32,
}

impl LocalAlignment {
    pub fn first_segment(&self) -> Option<&AlignedSegment> {
        self.segments.first()
    }

    pub fn last_segment(&self) -> Option<&AlignedSegment> {
        self.segments.last()
    }
}

/// Split a rust bio alignment into gap-free segments
///
/// x is the query and y is the reference
///
fn bio_alignment_to_segments(rb_aln: &Alignment) -> Vec<AlignedSegment> {
    let mut segments = Vec::new();
    let mut ref_pos = rb_aln.ystart as i64;
    let mut query_pos = rb_aln.xstart as i64;
    let mut segment_start: Option<(i64, i64)> = None;

    let mut close_segment =
        |segment_start: &mut Option<(i64, i64)>, ref_pos: i64, query_pos: i64| {
            if let Some((ref_start, query_start)) = segment_start.take() {
                segments.push(AlignedSegment {
                    ref_range: IntRange::from_pair(ref_start, ref_pos),
                    query_range: IntRange::from_pair(query_start, query_pos),
                });
            }
        };

    use AlignmentOperation::*;
    for op in rb_aln.operations.iter() {
        match op {
            Match | Subst => {
                if segment_start.is_none() {
                    segment_start = Some((ref_pos, query_pos));
                }
                ref_pos += 1;
                query_pos += 1;
            }
            Ins => {
                close_segment(&mut segment_start, ref_pos, query_pos);
                query_pos += 1;
            }
            Del => {
                close_segment(&mut segment_start, ref_pos, query_pos);
                ref_pos += 1;
            }
            Xclip(_) | Yclip(_) => {}
        }
    }
    close_segment(&mut segment_start, ref_pos, query_pos);

    segments
}

/// Smith-Waterman alignment of a query segment against a reference segment
///
/// Returns None if either sequence is empty or no positive scoring alignment exists.
///
pub fn local_align(
    ref_seq: &[u8],
    query_seq: &[u8],
    scores: &AlignmentScores,
) -> Option<LocalAlignment> {
    if ref_seq.is_empty() || query_seq.is_empty() {
        return None;
    }

    let scoring = Scoring::from_scores(0, scores.gap, scores.match_, scores.mismatch);
    let mut aligner =
        Aligner::with_capacity_and_scoring(query_seq.len(), ref_seq.len(), scoring);
    let rb_aln = aligner.local(query_seq, ref_seq);

    let segments = bio_alignment_to_segments(&rb_aln);
    if segments.is_empty() {
        return None;
    }
    Some(LocalAlignment {
        segments,
        score: rb_aln.score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use unwrap::unwrap;

    #[test]
    fn test_parse_alignment_scores() {
        let scores = unwrap!(AlignmentScores::from_str("1,-2,-3"));
        assert_eq!(
            scores,
            AlignmentScores {
                match_: 1,
                mismatch: -2,
                gap: -3
            }
        );
        assert_eq!(scores.to_string(), "1,-2,-3");

        assert!(AlignmentScores::from_str("1,-2").is_err());
        assert!(AlignmentScores::from_str("1,x,-3").is_err());
    }

    #[test]
    fn test_ungapped_local_align() {
        let scores = AlignmentScores::default();

        // Ref:   AACTGTATAA
        // Query: --CTGTA---
        let aln = unwrap!(local_align(b"AACTGTATAA", b"CTGTA", &scores));
        assert_eq!(aln.score, 5);
        assert_eq!(aln.segments.len(), 1);
        let segment = unwrap!(aln.first_segment());
        assert_eq!(segment.ref_range, IntRange::from_pair(2, 7));
        assert_eq!(segment.query_range, IntRange::from_pair(0, 5));
    }

    #[test]
    fn test_gapped_local_align() {
        let scores = AlignmentScores {
            match_: 1,
            mismatch: -3,
            gap: -1,
        };

        // Ref:   CCACGTAGGCTTACGACC
        // Query: --ACGTAGG-TTACGA--
        let aln = unwrap!(local_align(b"CCACGTAGGCTTACGACC", b"ACGTAGGTTACGA", &scores));
        assert_eq!(aln.score, 12);
        assert_eq!(
            aln.segments,
            vec![
                AlignedSegment {
                    ref_range: IntRange::from_pair(2, 9),
                    query_range: IntRange::from_pair(0, 7),
                },
                AlignedSegment {
                    ref_range: IntRange::from_pair(10, 16),
                    query_range: IntRange::from_pair(7, 13),
                },
            ]
        );
    }

    #[test]
    fn test_no_local_align() {
        let scores = AlignmentScores::default();
        assert!(local_align(b"", b"ACGT", &scores).is_none());
        assert!(local_align(b"AAAA", b"TTTT", &scores).is_none());
    }
}

use std::fmt;

/// A simple type for integer ranges
///
/// All ranges follow the bed file range convention: 0-indexed, half-closed, [start,end)
///
/// This struct is used instead of the native rust Range type just to focus on the specific goals of
/// primarily genomic region intervals. Ranges produced during discordance segmentation can be
/// empty or even inverted in one dimension, so no ordering of start and end is enforced.
///
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct IntRange {
    pub start: i64,
    pub end: i64,
}

impl IntRange {
    pub fn from_pair(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn size(&self) -> i64 {
        self.end - self.start
    }

    pub fn center(&self) -> i64 {
        (self.start + self.end) / 2
    }

    /// Return a copy of the range restricted to [0,size)
    ///
    pub fn clamp_to_size(&self, size: i64) -> Self {
        Self {
            start: self.start.clamp(0, size),
            end: self.end.clamp(0, size),
        }
    }

    /// Translate a range to its reversed version, given a certain region size
    ///
    /// # Example
    ///
    /// reverse_range([1,3), 6) -> [3,5)
    ///
    /// Fwd:
    ///  [-)
    /// 012345
    ///
    /// Rev:
    ///    [-)
    /// 012345
    ///
    pub fn reverse(&mut self, size: i64) {
        let istart = self.start;
        self.start = size - self.end;
        self.end = size - istart;
    }
}

impl fmt::Debug for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}-{})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center() {
        assert_eq!(IntRange::from_pair(500, 600).center(), 550);
        assert_eq!(IntRange::from_pair(500, 501).center(), 500);
        assert_eq!(IntRange::from_pair(500, 500).center(), 500);
    }

    #[test]
    fn test_clamp_to_size() {
        let r = IntRange::from_pair(-20, 130);
        assert_eq!(r.clamp_to_size(100), IntRange::from_pair(0, 100));

        let r = IntRange::from_pair(20, 30);
        assert_eq!(r.clamp_to_size(100), r);
    }

    #[test]
    fn test_reverse() {
        let mut r = IntRange::from_pair(1, 3);
        r.reverse(6);
        assert_eq!(r, IntRange::from_pair(3, 5));
    }
}

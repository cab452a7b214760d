//! Interval-union bookkeeping behind syntax-error extraction.

use std::collections::BTreeMap;

/// An ordered union of half-open `[start, end)` ranges that coalesces
/// overlapping and adjacent insertions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalUnion {
    /// start → end, with all ranges disjoint and non-adjacent.
    ranges: BTreeMap<usize, usize>,
}

impl IntervalUnion {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `[start, end)`, merging with any ranges it touches. Empty ranges
    /// are ignored.
    pub fn add(&mut self, start: usize, end: usize) {
        if end <= start {
            return;
        }
        let mut merged_start = start;
        let mut merged_end = end;
        let touching: Vec<usize> = self
            .ranges
            .range(..=end)
            .filter(|&(_, &e)| e >= start)
            .map(|(&s, _)| s)
            .collect();
        for s in touching {
            if let Some(e) = self.ranges.remove(&s) {
                merged_start = merged_start.min(s);
                merged_end = merged_end.max(e);
            }
        }
        self.ranges.insert(merged_start, merged_end);
    }

    /// The complement of this union within `[0, len)`.
    #[must_use]
    pub fn invert_against(&self, len: usize) -> Self {
        let mut inverted = BTreeMap::new();
        let mut prev_end = 0;
        for (&start, &end) in &self.ranges {
            if start > prev_end && prev_end < len {
                inverted.insert(prev_end, start.min(len));
            }
            prev_end = prev_end.max(end);
        }
        if prev_end < len {
            inverted.insert(prev_end, len);
        }
        Self { ranges: inverted }
    }

    /// Whether `pos` falls inside one of the ranges.
    #[must_use]
    pub fn contains(&self, pos: usize) -> bool {
        self.ranges
            .range(..=pos)
            .next_back()
            .is_some_and(|(_, &end)| pos < end)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The ranges in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.ranges.iter().map(|(&s, &e)| (s, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(union: &IntervalUnion) -> Vec<(usize, usize)> {
        union.iter().collect()
    }

    #[test]
    fn disjoint_ranges_stay_separate() {
        let mut union = IntervalUnion::new();
        union.add(0, 2);
        union.add(5, 7);
        assert_eq!(ranges(&union), vec![(0, 2), (5, 7)]);
    }

    #[test]
    fn overlapping_and_adjacent_ranges_merge() {
        let mut union = IntervalUnion::new();
        union.add(0, 3);
        union.add(2, 5);
        union.add(5, 6);
        assert_eq!(ranges(&union), vec![(0, 6)]);
    }

    #[test]
    fn bridging_range_merges_neighbours() {
        let mut union = IntervalUnion::new();
        union.add(0, 2);
        union.add(4, 6);
        union.add(1, 5);
        assert_eq!(ranges(&union), vec![(0, 6)]);
    }

    #[test]
    fn empty_ranges_are_ignored() {
        let mut union = IntervalUnion::new();
        union.add(3, 3);
        assert!(union.is_empty());
    }

    #[test]
    fn inversion_covers_the_gaps() {
        let mut union = IntervalUnion::new();
        union.add(2, 4);
        union.add(6, 8);
        let inverted = union.invert_against(10);
        assert_eq!(ranges(&inverted), vec![(0, 2), (4, 6), (8, 10)]);

        let empty = IntervalUnion::new();
        assert_eq!(ranges(&empty.invert_against(3)), vec![(0, 3)]);

        let full = {
            let mut u = IntervalUnion::new();
            u.add(0, 3);
            u
        };
        assert!(full.invert_against(3).is_empty());
    }

    #[test]
    fn containment() {
        let mut union = IntervalUnion::new();
        union.add(2, 4);
        assert!(!union.contains(1));
        assert!(union.contains(2));
        assert!(union.contains(3));
        assert!(!union.contains(4));
    }
}

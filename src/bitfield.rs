//! Odd-only candidate buffer.
//!
//! Slot `i` stands for the odd integer `2i + 1`; slot 0 is the number 1.
//! A field for `size` holds every odd number `<= size`, so it has
//! `(size + 1) / 2` slots. Slots start `true` ("not yet proven composite")
//! and only ever go `true → false`.
//!
//! There is no interior synchronization. Concurrent crossing works by
//! [`BitField::split_segments`], which carves the buffer into disjoint
//! `&mut` sub-slices before any worker starts, so the borrow checker rather
//! than index arithmetic keeps two workers off the same slot.
//!
//! Slots are whole `bool`s, one byte per odd number, so a field costs about
//! `size / 2` bytes: eight times the packed-`u64` layout. Segment edges then
//! need no word alignment. Large sizes should go through [`BitField::try_new`].

use std::collections::TryReserveError;
use std::mem;

use crate::partition::Segment;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitField {
    bits: Vec<bool>,
}

impl BitField {
    /// Aborts the process if the buffer cannot be allocated.
    pub fn new(size: u64) -> Self {
        Self { bits: vec![true; slot_count(size)] }
    }

    /// Like [`BitField::new`], but reports allocation failure instead of aborting.
    pub fn try_new(size: u64) -> Result<Self, TryReserveError> {
        let len = slot_count(size);
        let mut bits = Vec::new();
        bits.try_reserve_exact(len)?;
        bits.resize(len, true);
        Ok(Self { bits })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize) -> bool {
        self.bits[i]
    }

    #[inline]
    pub fn clear(&mut self, i: usize) {
        self.bits[i] = false;
    }

    /// Candidate flag for the odd number `n`.
    #[inline]
    pub fn is_candidate(&self, n: u64) -> bool {
        self.get((n / 2) as usize)
    }

    pub fn count_candidates(&self) -> u64 {
        self.bits.iter().filter(|&&b| b).count() as u64
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Hand out one exclusive view per segment.
    ///
    /// Segments must be ascending and contiguous (each one starts where the
    /// previous ended) and must not reach past the field. Anything else means
    /// the partitioning is broken, which is a bug rather than bad input, so
    /// this panics.
    pub fn split_segments(&mut self, segments: &[Segment]) -> Vec<SegmentView<'_>> {
        let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
            return Vec::new();
        };

        for pair in segments.windows(2) {
            if pair[0].end != pair[1].start {
                panic!(
                    "partition invariant violated: segments {} and {} are not contiguous",
                    pair[0], pair[1]
                );
            }
        }
        if let Some(bad) = segments.iter().find(|s| s.start > s.end) {
            panic!("partition invariant violated: segment {} is inverted", bad);
        }

        let lo = slot_at_or_above(first.start);
        let hi = slot_at_or_above(last.end);
        if hi > self.bits.len() {
            panic!(
                "partition invariant violated: segment {} reaches slot {} of a {}-slot field",
                last,
                hi,
                self.bits.len()
            );
        }

        let mut rest: &mut [bool] = &mut self.bits[lo..hi];
        let mut base = lo;
        let mut views = Vec::with_capacity(segments.len());
        for &segment in segments {
            let n = slot_at_or_above(segment.end) - slot_at_or_above(segment.start);
            let (head, tail) = mem::take(&mut rest).split_at_mut(n);
            rest = tail;
            views.push(SegmentView { segment, base, bits: head });
            base += n;
        }
        views
    }
}

#[inline]
fn slot_count(size: u64) -> usize {
    ((size + 1) / 2) as usize
}

/// Slot of the smallest odd number `>= n`.
#[inline]
fn slot_at_or_above(n: u64) -> usize {
    (n / 2) as usize
}

// ─── SegmentView ───────────────────────────────────────────────────────────

/// Exclusive window onto the slots of the odd numbers inside one segment.
#[derive(Debug)]
pub struct SegmentView<'a> {
    segment: Segment,
    base: usize,
    bits: &'a mut [bool],
}

impl SegmentView<'_> {
    #[inline]
    pub fn segment(&self) -> Segment {
        self.segment
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Mark the odd number `n` composite. `n` must lie in this segment.
    #[inline]
    pub fn clear_number(&mut self, n: u64) {
        if !self.segment.contains(n) {
            panic!(
                "partition invariant violated: {} is outside segment {}",
                n, self.segment
            );
        }
        self.bits[(n / 2) as usize - self.base] = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_covers_odd_numbers_up_to_size() {
        assert_eq!(BitField::new(5).len(), 3); // 1 3 5
        assert_eq!(BitField::new(10).len(), 5); // 1 3 5 7 9
        assert_eq!(BitField::new(11).len(), 6); // … 11
    }

    #[test]
    fn test_starts_all_set() {
        let b = BitField::new(100);
        assert_eq!(b.count_candidates(), 50);
        assert!(b.as_slice().iter().all(|&x| x));
    }

    #[test]
    fn test_clear() {
        let mut b = BitField::new(30);
        b.clear(4);
        b.clear(4);
        assert!(!b.get(4));
        assert!(!b.is_candidate(9));
        assert!(b.is_candidate(11));
        assert_eq!(b.count_candidates(), 14);
    }

    #[test]
    fn test_try_new_matches_new() {
        assert_eq!(BitField::try_new(1_001).unwrap(), BitField::new(1_001));
    }

    #[test]
    fn test_try_new_reports_impossible_allocation() {
        assert!(BitField::try_new(u64::MAX - 1).is_err());
    }

    #[test]
    fn test_split_views_map_to_field_slots() {
        let mut b = BitField::new(30);
        let segs = [Segment::new(9, 20), Segment::new(20, 30)];
        {
            let mut views = b.split_segments(&segs);
            assert_eq!(views.len(), 2);
            // odd numbers 9..19 and 21..29
            assert_eq!(views[0].len(), 6);
            assert_eq!(views[1].len(), 5);
            views[0].clear_number(15);
            views[1].clear_number(21);
            views[1].clear_number(29);
        }
        let cleared: Vec<u64> = (0..b.len()).filter(|&i| !b.get(i)).map(|i| 2 * i as u64 + 1).collect();
        assert_eq!(cleared, vec![15, 21, 29]);
    }

    #[test]
    fn test_split_allows_empty_segments() {
        let mut b = BitField::new(27);
        let segs = [Segment::new(25, 26), Segment::new(26, 27), Segment::new(27, 27)];
        let views = b.split_segments(&segs);
        assert_eq!(views.iter().map(|v| v.len()).collect::<Vec<_>>(), vec![1, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "partition invariant violated")]
    fn test_split_rejects_overlap() {
        let mut b = BitField::new(100);
        b.split_segments(&[Segment::new(9, 50), Segment::new(40, 100)]);
    }

    #[test]
    #[should_panic(expected = "partition invariant violated")]
    fn test_split_rejects_gap() {
        let mut b = BitField::new(100);
        b.split_segments(&[Segment::new(9, 40), Segment::new(50, 100)]);
    }

    #[test]
    #[should_panic(expected = "partition invariant violated")]
    fn test_split_rejects_out_of_range() {
        let mut b = BitField::new(30);
        b.split_segments(&[Segment::new(9, 64)]);
    }

    #[test]
    #[should_panic(expected = "partition invariant violated")]
    fn test_view_rejects_foreign_number() {
        let mut b = BitField::new(30);
        let mut views = b.split_segments(&[Segment::new(9, 20), Segment::new(20, 30)]);
        views[0].clear_number(21);
    }
}

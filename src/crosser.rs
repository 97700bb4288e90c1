//! Sequential crossing of one segment.
//!
//! Clears `first, first + 2f, first + 4f, …` while below the segment end.
//! Stepping by `2f` keeps every hit odd. The single-threaded path is the same
//! routine run over the whole domain as one segment.

use crate::bitfield::SegmentView;

/// Clear every odd multiple of `factor` from `first_multiple` to the end of
/// `view`'s segment. Returns how many slots were written.
pub fn cross_segment(view: &mut SegmentView<'_>, first_multiple: u64, factor: u64) -> u64 {
    let end = view.segment().end;
    let step = 2 * factor;
    let mut m = first_multiple;
    let mut writes = 0;
    while m < end {
        view.clear_number(m);
        writes += 1;
        m = match m.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    writes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitfield::BitField;
    use crate::partition::{first_multiple, plan, Segment};

    fn cleared(b: &BitField) -> Vec<u64> {
        (0..b.len()).filter(|&i| !b.get(i)).map(|i| 2 * i as u64 + 1).collect()
    }

    #[test]
    fn test_whole_domain() {
        let mut b = BitField::new(30);
        let seg = Segment::new(9, 30);
        let mut views = b.split_segments(&[seg]);
        let writes = cross_segment(&mut views[0], first_multiple(seg.start, 3), 3);
        assert_eq!(writes, 4);
        drop(views);
        assert_eq!(cleared(&b), vec![9, 15, 21, 27]);
    }

    #[test]
    fn test_end_is_exclusive() {
        // 27 sits exactly on the segment end and must survive
        let mut b = BitField::new(27);
        let mut views = b.split_segments(&[Segment::new(9, 27)]);
        cross_segment(&mut views[0], 9, 3);
        drop(views);
        assert_eq!(cleared(&b), vec![9, 15, 21]);
    }

    #[test]
    fn test_split_matches_whole() {
        let mut whole = BitField::new(1_000);
        let seg = Segment::new(49, 1_000);
        let mut views = whole.split_segments(&[seg]);
        cross_segment(&mut views[0], 49, 7);
        drop(views);

        for workers in [2, 3, 5, 8, 13] {
            let mut parts = BitField::new(1_000);
            let assignments = plan(49, 1_000, 7, workers);
            let segs: Vec<Segment> = assignments.iter().map(|a| a.segment).collect();
            let mut views = parts.split_segments(&segs);
            for (view, a) in views.iter_mut().zip(&assignments) {
                cross_segment(view, a.first_multiple, 7);
            }
            drop(views);
            assert_eq!(parts, whole, "workers={}", workers);
        }
    }

    #[test]
    fn test_first_multiple_past_end_writes_nothing() {
        let mut b = BitField::new(100);
        let mut views = b.split_segments(&[Segment::new(50, 52)]);
        assert_eq!(cross_segment(&mut views[0], first_multiple(50, 7), 7), 0);
    }
}

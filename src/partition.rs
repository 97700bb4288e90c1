//! Work partitioning for the crossing phase.
//!
//! One factor level sweeps the number range `[factor², end)`. That range is
//! cut into `workers` contiguous half-open segments of near-equal length, and
//! each segment gets the first odd multiple of the factor it has to clear.

use std::fmt;

// ─── Segment ───────────────────────────────────────────────────────────────

/// Half-open range of integers `[start, end)` owned by exactly one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Segment {
    pub start: u64,
    pub end: u64,
}

impl Segment {
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    #[inline]
    pub fn contains(&self, n: u64) -> bool {
        self.start <= n && n < self.end
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A segment together with where its sweep begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Assignment {
    pub segment: Segment,
    pub first_multiple: u64,
}

// ─── Arithmetic ────────────────────────────────────────────────────────────

/// Integer square root, overflow-safe for all u64 values.
#[inline]
pub fn isqrt(n: u64) -> u64 {
    if n == 0 { return 0; }
    let mut x = (n as f64).sqrt() as u64;
    while x > 0 && x.checked_mul(x).map_or(true, |sq| sq > n) { x -= 1; }
    while (x + 1).checked_mul(x + 1).map_or(false, |sq| sq <= n) { x += 1; }
    x
}

/// Smallest odd multiple of `factor` that is `>= max(segment_start, factor²)`.
///
/// The quotient is forced odd with `| 1`; with an odd factor the product is
/// then odd too, so it always lands on a slot of the odd-only bit field.
#[inline]
pub fn first_multiple(segment_start: u64, factor: u64) -> u64 {
    assert!(factor > 0, "factor must be positive");
    let q = segment_start.div_ceil(factor) | 1;
    q.max(factor).saturating_mul(factor)
}

// ─── Partitioning ──────────────────────────────────────────────────────────

/// Split `[domain_start, domain_end)` into `workers` contiguous segments.
///
/// Segment `k` is `[start + k·s, min(start + (k+1)·s, end))` with
/// `s = ceil(len / workers)`. Trailing segments are empty when there are
/// more workers than integers. Always returns exactly `workers` entries.
pub fn partition(domain_start: u64, domain_end: u64, workers: usize) -> Vec<Segment> {
    assert!(workers > 0, "worker count must be at least 1");
    let end = domain_end.max(domain_start);
    let len = end - domain_start;
    let step = len.div_ceil(workers as u64);

    (0..workers as u64)
        .map(|k| {
            let lo = domain_start.saturating_add(k.saturating_mul(step)).min(end);
            let hi = lo.saturating_add(step).min(end);
            Segment::new(lo, hi)
        })
        .collect()
}

/// Partition a factor level's domain and attach each segment's first multiple.
pub fn plan(domain_start: u64, domain_end: u64, factor: u64, workers: usize) -> Vec<Assignment> {
    partition(domain_start, domain_end, workers)
        .into_iter()
        .map(|segment| Assignment {
            segment,
            first_multiple: first_multiple(segment.start, factor),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(start: u64, end: u64, workers: usize) {
        let segs = partition(start, end, workers);
        assert_eq!(segs.len(), workers);
        let mut cursor = start;
        for s in &segs {
            assert_eq!(s.start, cursor, "gap or overlap at {}", s);
            assert!(s.start <= s.end);
            cursor = s.end;
        }
        assert_eq!(cursor, end);
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(4), 2);
        assert_eq!(isqrt(10), 3);
        assert_eq!(isqrt(30), 5);
        assert_eq!(isqrt(u64::MAX), 4_294_967_295);
        assert_eq!(isqrt(1 << 52), 1 << 26);
    }

    #[test]
    fn test_even_split() {
        let segs = partition(0, 100, 4);
        assert_eq!(segs, vec![
            Segment::new(0, 25),
            Segment::new(25, 50),
            Segment::new(50, 75),
            Segment::new(75, 100),
        ]);
    }

    #[test]
    fn test_uneven_split() {
        // len 10, 3 workers → s = 4
        let segs = partition(9, 19, 3);
        assert_eq!(segs, vec![Segment::new(9, 13), Segment::new(13, 17), Segment::new(17, 19)]);
    }

    #[test]
    fn test_more_workers_than_integers() {
        let segs = partition(25, 27, 5);
        assert_eq!(segs[0], Segment::new(25, 26));
        assert_eq!(segs[1], Segment::new(26, 27));
        assert!(segs[2..].iter().all(|s| s.is_empty() && s.start == 27));
        assert_exact_cover(25, 27, 5);
    }

    #[test]
    fn test_cover_grid() {
        for (start, end) in [(0, 1), (9, 30), (25, 1_000), (961, 1_000_000), (3, 4)] {
            for workers in [1, 2, 3, 7, 8, 16, 33] {
                assert_exact_cover(start, end, workers);
            }
        }
    }

    #[test]
    fn test_first_multiple() {
        // 0 → clamped up to factor²
        assert_eq!(first_multiple(0, 5), 25);
        assert_eq!(first_multiple(9, 3), 9);
        // ceil(10/3) = 4, forced odd → 5
        assert_eq!(first_multiple(10, 3), 15);
        // 30 is even, next odd multiple is 35
        assert_eq!(first_multiple(26, 5), 35);
        assert_eq!(first_multiple(35, 5), 35);
    }

    #[test]
    fn test_first_multiple_is_odd_and_in_reach() {
        for factor in (3..60).step_by(2) {
            for start in 0..500 {
                let m = first_multiple(start, factor);
                assert_eq!(m % 2, 1);
                assert_eq!(m % factor, 0);
                assert!(m >= start.max(factor * factor));
                // nothing odd and smaller qualifies
                assert!(m < 2 * factor + start.max(factor * factor));
            }
        }
    }

    #[test]
    fn test_plan_attaches_first_multiples() {
        let plan = plan(9, 30, 3, 2);
        assert_eq!(plan[0], Assignment { segment: Segment::new(9, 20), first_multiple: 9 });
        assert_eq!(plan[1], Assignment { segment: Segment::new(20, 30), first_multiple: 21 });
    }
}

//! Text rendering of run results.

use std::fmt;
use std::time::Duration;

use crate::coordinator::{SieveOutcome, SieveResult};
use crate::progress::ProgressSnapshot;

pub fn format_commas(n: u64) -> String {
    let s = n.to_string();
    let mut r = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 { r.push(','); }
        r.push(c);
    }
    r.chars().rev().collect()
}

pub fn format_duration(d: Duration) -> String {
    let ns = d.as_nanos();
    if ns < 1_000 { format!("{} ns", ns) }
    else if ns < 1_000_000 { format!("{:.1} µs", ns as f64 / 1e3) }
    else if ns < 1_000_000_000 { format!("{:.2} ms", ns as f64 / 1e6) }
    else { format!("{:.2} s", ns as f64 / 1e9) }
}

/// One-line progress bar for a terminal status line.
pub fn progress_line(p: &ProgressSnapshot, width: usize) -> String {
    let filled = (p.fraction() * width as f64).round() as usize;
    format!(
        "[{}{}] factor {} / {}  ({} levels)",
        "#".repeat(filled.min(width)),
        " ".repeat(width.saturating_sub(filled)),
        format_commas(p.factor),
        format_commas(p.limit),
        p.levels,
    )
}

/// Final summary lines for a completed run. Cancelled runs render nothing.
pub struct Summary<'a>(pub &'a SieveResult);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let SieveOutcome::Completed { prime_count } = self.0.outcome else {
            return Ok(());
        };
        write!(f, "Found {} primes up to {}", format_commas(prime_count), format_commas(self.0.size))?;
        if let Some(elapsed) = self.0.elapsed {
            write!(f, "\nTime: {}", format_duration(elapsed))?;
        }
        Ok(())
    }
}

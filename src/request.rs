//! Validated run parameters.

use std::fmt;
use std::num::NonZeroUsize;

use crate::error::{Result, SieveError};

/// Smallest size a request accepts.
pub const MIN_SIZE: u64 = 5;

/// How the loop bound and the final count are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SieveMode {
    /// Bit-for-bit compatible with the legacy tool: factors strictly below
    /// `isqrt(size)`, crossing domain `[factor², size)`, and the slot for 1
    /// counted as a prime.
    #[default]
    Compatible,
    /// Deviates on purpose: factors up to and including `isqrt(size)`,
    /// domain `[factor², size]`, 1 dropped and 2 added. The count is π(size).
    Corrected,
}

impl fmt::Display for SieveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SieveMode::Compatible => f.write_str("compatible"),
            SieveMode::Corrected => f.write_str("corrected"),
        }
    }
}

/// Parameters of one sieve run. Fields are fixed once built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SieveRequest {
    size: u64,
    parallelism: NonZeroUsize,
    single_threaded: bool,
    measure_time: bool,
    mode: SieveMode,
}

impl SieveRequest {
    /// Request for `size` using every logical core.
    pub fn new(size: u64) -> Result<Self> {
        if size < MIN_SIZE {
            return Err(SieveError::SizeTooSmall { size });
        }
        // corrected mode sweeps up to size + 1, and no allocation may exceed isize::MAX
        if size == u64::MAX || (size + 1) / 2 > isize::MAX as u64 {
            return Err(SieveError::SizeTooLarge { size });
        }
        Ok(Self {
            size,
            parallelism: default_parallelism(),
            single_threaded: false,
            measure_time: false,
            mode: SieveMode::default(),
        })
    }

    /// Build from the decimal strings a command line hands over.
    pub fn parse(size: &str, parallelism: Option<&str>) -> Result<Self> {
        let size = size
            .trim()
            .parse::<u64>()
            .map_err(|_| SieveError::InvalidSize { input: size.to_string() })?;
        let request = Self::new(size)?;
        match parallelism {
            Some(raw) => {
                let n = raw
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| SieveError::InvalidParallelism { input: raw.to_string() })?;
                request.with_parallelism(n)
            }
            None => Ok(request),
        }
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Result<Self> {
        self.parallelism = NonZeroUsize::new(parallelism)
            .ok_or_else(|| SieveError::InvalidParallelism { input: parallelism.to_string() })?;
        Ok(self)
    }

    pub fn single_threaded(mut self, yes: bool) -> Self {
        self.single_threaded = yes;
        self
    }

    pub fn measure_time(mut self, yes: bool) -> Self {
        self.measure_time = yes;
        self
    }

    pub fn mode(mut self, mode: SieveMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism.get()
    }

    pub fn is_single_threaded(&self) -> bool {
        self.single_threaded
    }

    pub fn measures_time(&self) -> bool {
        self.measure_time
    }

    pub fn sieve_mode(&self) -> SieveMode {
        self.mode
    }

    /// Workers the crossing phase fans out to.
    pub fn worker_count(&self) -> usize {
        if self.single_threaded { 1 } else { self.parallelism.get() }
    }
}

fn default_parallelism() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_boundary() {
        assert!(matches!(SieveRequest::new(4), Err(SieveError::SizeTooSmall { size: 4 })));
        assert_eq!(SieveRequest::new(5).unwrap().size(), 5);
    }

    #[test]
    fn test_size_too_large() {
        assert!(matches!(SieveRequest::new(u64::MAX), Err(SieveError::SizeTooLarge { .. })));
    }

    #[test]
    fn test_defaults() {
        let r = SieveRequest::new(1_000).unwrap();
        assert_eq!(r.parallelism(), num_cpus::get().max(1));
        assert!(!r.is_single_threaded());
        assert!(!r.measures_time());
        assert_eq!(r.sieve_mode(), SieveMode::Compatible);
    }

    #[test]
    fn test_parse() {
        let r = SieveRequest::parse(" 1000 ", Some("4")).unwrap();
        assert_eq!(r.size(), 1_000);
        assert_eq!(r.parallelism(), 4);
        assert_eq!(r.worker_count(), 4);
    }

    #[test]
    fn test_parse_rejects_bad_size() {
        for bad in ["", "abc", "-5", "12.5", "4"] {
            let err = SieveRequest::parse(bad, None).unwrap_err();
            assert!(err.is_validation(), "{bad:?}");
        }
        assert!(matches!(
            SieveRequest::parse("ten", None),
            Err(SieveError::InvalidSize { input }) if input == "ten"
        ));
    }

    #[test]
    fn test_parse_rejects_bad_parallelism() {
        for bad in ["0", "-1", "two", ""] {
            assert!(matches!(
                SieveRequest::parse("100", Some(bad)),
                Err(SieveError::InvalidParallelism { .. })
            ));
        }
    }

    #[test]
    fn test_single_threaded_overrides_workers() {
        let r = SieveRequest::new(100).unwrap().with_parallelism(8).unwrap().single_threaded(true);
        assert_eq!(r.parallelism(), 8);
        assert_eq!(r.worker_count(), 1);
    }

    #[test]
    fn test_builder_flags() {
        let r = SieveRequest::new(100).unwrap().measure_time(true).mode(SieveMode::Corrected);
        assert!(r.measures_time());
        assert_eq!(r.sieve_mode(), SieveMode::Corrected);
        assert_eq!(r.sieve_mode().to_string(), "corrected");
    }
}

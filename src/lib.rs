//! Parallel, cancellable odd-only sieve of Eratosthenes.
//!
//! ```
//! use primer::{sieve, SieveRequest};
//!
//! let result = sieve(SieveRequest::new(100).unwrap()).unwrap();
//! assert_eq!(result.prime_count(), Some(25));
//! ```

pub mod bitfield;
pub mod cancel;
pub mod coordinator;
pub mod crosser;
pub mod error;
pub mod logging;
pub mod partition;
pub mod progress;
pub mod report;
pub mod request;

pub use bitfield::{BitField, SegmentView};
pub use cancel::CancellationToken;
pub use coordinator::{sieve, sieve_with_cancel, CoordinatorState, SieveCoordinator, SieveOutcome, SieveResult};
pub use error::SieveError;
pub use partition::{first_multiple, isqrt, partition, plan, Assignment, Segment};
pub use progress::{ProgressSnapshot, SieveProgress};
pub use request::{SieveMode, SieveRequest, MIN_SIZE};

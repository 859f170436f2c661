//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Payment listener poll fails:
//!     → PollBackoff::fail (doubling delay, capped, jittered)
//!     → next poll after the delay; PollBackoff::reset on success
//! ```

pub mod backoff;

pub use backoff::PollBackoff;

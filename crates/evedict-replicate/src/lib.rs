//! Client for long-running text-generation jobs on Replicate.
//!
//! A job is submitted once, then polled through its status URL until it
//! reaches a terminal state or the [`PollPolicy`] runs out of attempts. The
//! provider's polymorphic `output` field is resolved here into a single
//! string, so callers never see the wire shape.

pub mod client;
pub mod error;
pub mod job;

pub use client::ReplicateClient;
pub use error::GenerationError;
pub use job::{JobHandle, JobStatus, PollPolicy, RawOutput};

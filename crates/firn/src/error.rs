//! Error types for id generation and node-identity resolution.
//!
//! Two enums split the taxonomy by phase: [`ConfigError`] covers startup
//! (node-identity resolution fails fast, before any id is generated), and
//! [`Error`] covers generation itself. Sequence exhaustion is deliberately
//! absent from both; it is a throttling state, reported as
//! [`IdGenStatus::Pending`](crate::IdGenStatus::Pending).

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors surfaced while generating ids.
#[derive(Clone, Copy, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The time source reported an earlier millisecond than the last one
    /// recorded by the generator.
    ///
    /// Generating against a stale timestamp risks duplicate ids, so the call
    /// is rejected instead. The caller decides whether to retry once the
    /// clock has caught up or to abort. [`MonotonicClock`] can never trigger
    /// this; wall-clock sources such as [`SystemClock`] can.
    ///
    /// [`MonotonicClock`]: crate::MonotonicClock
    /// [`SystemClock`]: crate::SystemClock
    #[error("clock moved backwards: last generated at {last} ms, time source reports {now} ms")]
    ClockRegression {
        /// Timestamp of the most recently generated id.
        last: u64,
        /// The (earlier) timestamp the time source just reported.
        now: u64,
    },
}

/// Errors surfaced while resolving the node identity at startup.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A worker or datacenter id from configuration or environment does not
    /// fit its 5-bit field.
    ///
    /// Out-of-range values are rejected rather than masked: two processes
    /// configured as 7 and 39 would otherwise silently collide on 7.
    #[error("{field} {value} out of range (max {max})")]
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },

    /// An environment variable was present but did not parse as an integer.
    ///
    /// A set-but-malformed value means the operator intended to pin the
    /// identity; falling through to a derived default would mask the typo.
    #[error("environment variable {var} is not an unsigned integer: {value:?}")]
    MalformedEnv { var: &'static str, value: String },
}

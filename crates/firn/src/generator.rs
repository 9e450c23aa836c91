use std::cmp::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    error::{Error, Result},
    id::RecordId,
    node::NodeIdentity,
    status::IdGenStatus,
    time::TimeSource,
};

/// A lock-based id generator, safe for concurrent use within one process.
///
/// State is the last issued id, packed; every transition (sequence
/// increment, timestamp rollover, regression check) happens under a single
/// [`Mutex`], so concurrent callers are serialized. At 4096 ids per
/// millisecond per node the lock is not a throughput concern for typical
/// workloads.
///
/// Cloning is cheap and clones share state: hand clones to every component
/// that needs ids instead of stashing one instance in a global.
///
/// # Example
///
/// ```
/// use firn::{IdGenerator, MonotonicClock, NodeConfig, NodeIdentity};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let node = NodeIdentity::resolve(&NodeConfig::default())?;
/// let generator = IdGenerator::new(node, MonotonicClock::default());
///
/// let id = generator.next_id()?;
/// let next = generator.next_id()?;
/// assert!(next > id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct IdGenerator<T: TimeSource = crate::MonotonicClock> {
    state: Arc<Mutex<RecordId>>,
    time: T,
}

impl<T: TimeSource> IdGenerator<T> {
    /// Creates a generator for the given node identity, starting from a zero
    /// timestamp and sequence.
    pub fn new(node: NodeIdentity, time: T) -> Self {
        Self::from_parts(0, node, 0, time)
    }

    /// Creates a generator preloaded with explicit state.
    ///
    /// Useful for restoring from persisted state or pinning the starting
    /// point in tests; prefer [`Self::new`] otherwise.
    pub fn from_parts(timestamp: u64, node: NodeIdentity, sequence: u64, time: T) -> Self {
        let id = RecordId::from_parts(timestamp, node.datacenter_id(), node.worker_id(), sequence);
        Self {
            state: Arc::new(Mutex::new(id)),
            time,
        }
    }

    /// Attempts to generate the next id without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the time source reports an
    /// earlier millisecond than the last recorded one. The stale timestamp
    /// is never reused; state is left untouched so the call can be retried
    /// once the clock has caught up.
    pub fn try_next_id(&self) -> Result<IdGenStatus> {
        let now = self.time.current_millis();

        let mut id = self.state.lock();
        let current_ts = id.timestamp();
        match now.cmp(&current_ts) {
            Ordering::Equal => {
                if id.has_sequence_room() {
                    *id = id.increment_sequence();
                    Ok(IdGenStatus::Ready { id: *id })
                } else {
                    Ok(IdGenStatus::Pending { yield_for: 1 })
                }
            }
            Ordering::Greater => {
                *id = id.rollover_to_timestamp(now);
                Ok(IdGenStatus::Ready { id: *id })
            }
            Ordering::Less => Err(Self::cold_clock_behind(now, current_ts)),
        }
    }

    /// Generates the next id, yielding the thread across sequence-exhausted
    /// ticks.
    ///
    /// The wait is bounded: [`IdGenStatus::Pending`] only occurs when 4096
    /// ids were already issued in the current millisecond, and ends at the
    /// next millisecond boundary.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::ClockRegression`] from [`Self::try_next_id`].
    pub fn next_id(&self) -> Result<RecordId> {
        loop {
            match self.try_next_id()? {
                IdGenStatus::Ready { id } => return Ok(id),
                IdGenStatus::Pending { .. } => std::thread::yield_now(),
            }
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last: u64) -> Error {
        debug_assert!(now < last);
        Error::ClockRegression { last, now }
    }
}

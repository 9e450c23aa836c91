use crate::RecordId;

/// The outcome of one attempt to generate an id.
///
/// [`IdGenStatus::Ready`] carries a freshly generated id.
/// [`IdGenStatus::Pending`] means the 4096-value sequence space for the
/// current millisecond is exhausted; the caller should wait `yield_for`
/// milliseconds (in practice, one) and try again. Exhaustion is throttling,
/// not failure, so it is not modeled as an error.
///
/// # Example
///
/// ```
/// use firn::{IdGenerator, IdGenStatus, MonotonicClock, NodeIdentity};
///
/// let node = NodeIdentity::new(3, 1).unwrap();
/// let generator = IdGenerator::new(node, MonotonicClock::default());
/// match generator.try_next_id() {
///     Ok(IdGenStatus::Ready { id }) => println!("id: {id}"),
///     Ok(IdGenStatus::Pending { yield_for }) => println!("retry in {yield_for} ms"),
///     Err(e) => eprintln!("clock fault: {e}"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique id was generated and is ready to use.
    Ready {
        /// The generated id.
        id: RecordId,
    },
    /// The sequence is exhausted for the current millisecond tick.
    Pending {
        /// How many milliseconds to wait before trying again.
        yield_for: u64,
    },
}

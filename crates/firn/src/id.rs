use core::fmt;

/// A 64-bit record identifier.
///
/// - 1 bit reserved (always 0, so the value stays positive as an `i64`)
/// - 41 bits timestamp (ms since [`FIRN_EPOCH`])
/// - 5 bits datacenter id
/// - 5 bits worker id
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63            63 62            22 21              17 16          12 11             0
///              +---------------+----------------+------------------+-------------+---------------+
///  Field:      | reserved (1)  | timestamp (41) | datacenter id (5)| worker id(5)| sequence (12) |
///              +---------------+----------------+------------------+-------------+---------------+
///              |<------------------ MSB ---------- 64 bits ----------- LSB --------------------->|
/// ```
///
/// Identifiers from generators with distinct (datacenter id, worker id)
/// pairs can never be equal, and identifiers from a single generator sort by
/// creation order.
///
/// [`FIRN_EPOCH`]: crate::FIRN_EPOCH
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RecordId {
    id: u64,
}

impl RecordId {
    /// Bitmask for extracting the 41-bit timestamp field. Occupies bits 22
    /// through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

    /// Bitmask for extracting the 5-bit datacenter id field. Occupies bits 17
    /// through 21.
    pub const DATACENTER_ID_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for extracting the 5-bit worker id field. Occupies bits 12
    /// through 16.
    pub const WORKER_ID_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for extracting the 12-bit sequence field. Occupies bits 0
    /// through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    /// Number of bits to shift the timestamp to its position (bit 22).
    pub const TIMESTAMP_SHIFT: u64 = 22;

    /// Number of bits to shift the datacenter id to its position (bit 17).
    pub const DATACENTER_ID_SHIFT: u64 = 17;

    /// Number of bits to shift the worker id to its position (bit 12).
    pub const WORKER_ID_SHIFT: u64 = 12;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u64 = 0;

    pub const fn from(timestamp: u64, datacenter_id: u64, worker_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let datacenter_id =
            (datacenter_id & Self::DATACENTER_ID_MASK) << Self::DATACENTER_ID_SHIFT;
        let worker_id = (worker_id & Self::WORKER_ID_MASK) << Self::WORKER_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | datacenter_id | worker_id | sequence,
        }
    }

    /// Constructs an identifier from its components.
    ///
    /// Debug builds assert that every component fits its field; release
    /// builds mask. Range checking of node identities happens once at
    /// resolution time, not here.
    pub fn from_parts(timestamp: u64, datacenter_id: u64, worker_id: u64, sequence: u64) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(
            datacenter_id <= Self::DATACENTER_ID_MASK,
            "datacenter_id overflow"
        );
        debug_assert!(worker_id <= Self::WORKER_ID_MASK, "worker_id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        Self::from(timestamp, datacenter_id, worker_id, sequence)
    }

    /// Extracts the timestamp from the packed id.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the datacenter id from the packed id.
    pub const fn datacenter_id(&self) -> u64 {
        (self.id >> Self::DATACENTER_ID_SHIFT) & Self::DATACENTER_ID_MASK
    }

    /// Extracts the worker id from the packed id.
    pub const fn worker_id(&self) -> u64 {
        (self.id >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
    }

    /// Extracts the sequence number from the packed id.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the maximum representable timestamp value.
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    /// Returns the maximum representable datacenter id.
    pub const fn max_datacenter_id() -> u64 {
        Self::DATACENTER_ID_MASK
    }

    /// Returns the maximum representable worker id.
    pub const fn max_worker_id() -> u64 {
        Self::WORKER_ID_MASK
    }

    /// Returns the maximum representable sequence value.
    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Converts this id into its raw `u64` representation.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Converts a raw `u64` into an id.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the id as a signed 64-bit integer.
    ///
    /// The reserved sign bit is never set, so the result is always positive.
    /// Intended for stores whose integer column is signed.
    pub const fn to_i64(&self) -> i64 {
        self.id as i64
    }

    /// Returns the id as a zero-padded 20-digit string.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }

    /// Returns true if the current sequence value can be incremented.
    pub(crate) fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::max_sequence()
    }

    /// Returns a new id with the sequence incremented.
    pub(crate) fn increment_sequence(&self) -> Self {
        Self::from_parts(
            self.timestamp(),
            self.datacenter_id(),
            self.worker_id(),
            self.sequence() + 1,
        )
    }

    /// Returns a new id for a newer timestamp with the sequence reset.
    pub(crate) fn rollover_to_timestamp(&self, ts: u64) -> Self {
        Self::from_parts(ts, self.datacenter_id(), self.worker_id(), 0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordId")
            .field("id", &self.id)
            .field("timestamp", &self.timestamp())
            .field("datacenter_id", &self.datacenter_id())
            .field("worker_id", &self.worker_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

impl From<RecordId> for u64 {
    fn from(id: RecordId) -> Self {
        id.to_raw()
    }
}

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Default epoch: Wednesday, January 1, 2025 00:00:00 UTC.
///
/// The zero-point for the 41-bit timestamp field. Chosen once per deployment
/// and never changed afterwards; ids generated against different epochs do
/// not sort correctly relative to each other.
pub const FIRN_EPOCH: Duration = Duration::from_millis(1_735_689_600_000);

/// Standard UNIX epoch: Thursday, January 1, 1970 00:00:00 UTC.
pub const UNIX_EPOCH_MS: Duration = Duration::from_millis(0);

/// A source of epoch-relative timestamps in milliseconds.
///
/// This abstraction lets the generator run against the real clock in
/// production and a fixed or scripted clock in tests.
///
/// # Example
///
/// ```
/// use firn::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the configured epoch.
    fn current_millis(&self) -> u64;
}

/// A monotonic time source aligned to a fixed epoch.
///
/// The wall-clock offset from the epoch is captured once at construction;
/// afterwards every reading is `offset + elapsed` measured on a monotonic
/// timer ([`Instant`]). External clock adjustments (NTP steps, daylight
/// savings) cannot move this clock backward, so a generator driven by it
/// never observes a regression.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    start: Instant,
    epoch_offset: u64,
}

impl Default for MonotonicClock {
    /// Constructs a monotonic clock aligned to [`FIRN_EPOCH`].
    fn default() -> Self {
        Self::with_epoch(FIRN_EPOCH)
    }
}

impl MonotonicClock {
    /// Constructs a monotonic clock using `epoch` as the origin (t = 0),
    /// given in milliseconds since the Unix epoch.
    ///
    /// # Panics
    ///
    /// Panics if the current system time is earlier than `epoch`. This is a
    /// deployment invariant, checked once at startup.
    pub fn with_epoch(epoch: Duration) -> Self {
        let system_now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before UNIX_EPOCH");
        let epoch_offset = system_now
            .checked_sub(epoch)
            .expect("system clock before configured epoch")
            .as_millis() as u64;

        Self {
            start: Instant::now(),
            epoch_offset,
        }
    }
}

impl TimeSource for MonotonicClock {
    fn current_millis(&self) -> u64 {
        self.epoch_offset + self.start.elapsed().as_millis() as u64
    }
}

/// A wall-clock time source aligned to a fixed epoch.
///
/// Unlike [`MonotonicClock`], readings follow the system clock directly and
/// therefore *can* move backward under NTP steps or manual adjustment. A
/// generator driven by this source may report
/// [`Error::ClockRegression`](crate::Error::ClockRegression).
#[derive(Clone, Debug)]
pub struct SystemClock {
    epoch: Duration,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::with_epoch(FIRN_EPOCH)
    }
}

impl SystemClock {
    pub fn with_epoch(epoch: Duration) -> Self {
        Self { epoch }
    }
}

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .saturating_sub(self.epoch)
            .as_millis() as u64
    }
}

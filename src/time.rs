/// This library uses a simple discrete time model: every quantity of
/// time is an integral number of ticks.
pub type Time = u64;

/// Syntactic sugar to give a hint that a time value indicates a
/// point in time, i.e., an offset from the start of a window.
pub type Instant = Time;

/// Syntactic sugar to give a hint that a time value denotes an
/// interval length.
pub type Duration = Time;

/// Syntactic sugar to give a hint that a time value represents some
/// amount of processor service (demanded or supplied).
pub type Service = Time;

/// Fraction of the processor (utilization, bandwidth).
pub type Share = f64;

/// Smallest bandwidth slack that is treated as strictly positive.
pub const BANDWIDTH_TOLERANCE: Share = 1e-6;

/// Integer division rounding towards positive infinity.
pub(crate) fn divide_with_ceil(a: Duration, b: Duration) -> u64 {
    a / b + (a % b > 0) as u64
}

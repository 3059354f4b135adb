//! Reporting sink interface.
//!
//! The sink receives finished session metrics and, when stack reporting is
//! enabled, resolved stack traces. Aggregation across sessions (client- or
//! server-side) is the sink's responsibility; the recommended derived
//! metrics are `SUM(duration) / SUM(small_drop_score)`, the number of
//! seconds between one-frame-or-more drops, and the same ratio for the
//! large score. The first tells you how smooth an interaction is, the
//! second how bad its worst moments get.
//!
//! Fractional drops are reported deliberately: 7 dropped frames count as
//! 1.75 large drops when a large drop is 4 frames. This keeps the metric's
//! inverse proportional to time spent at the target frame rate regardless
//! of the threshold choice.

/// Consumer of tracking results.
///
/// The tracker holds this sink weakly: its lifetime is the host's concern,
/// and a sink dropped mid-session simply stops receiving callbacks.
pub trait MetricsSink: Send + Sync {
    /// One finished tracking session.
    ///
    /// Fired at most once per session, on the tick-receiving thread, and
    /// only when the session accumulated a non-zero duration.
    fn on_metrics_reported(&self, duration_ms: u64, small_drop_score: f64, large_drop_score: f64);

    /// One resolved stack captured while frames were being dropped.
    ///
    /// Fired zero or more times per session, off the tick-receiving thread.
    /// `stack` is a pipe-delimited list of `module:address` pairs, e.g.
    /// `libc.so.6:0x7f1a2b3c|myapp:0x55d4e5f6|`; unresolvable addresses
    /// use the module name `???`. `slide` is the load address of the host
    /// binary, formatted `0x…`, constant for the process lifetime and
    /// needed to align the addresses with the static module layout.
    fn on_stack_resolved(&self, stack: &str, slide: &str);
}

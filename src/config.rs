//! Tracker configuration.
//!
//! The standard configuration is strongly recommended: the thresholds are
//! part of the metric's definition, and changing them changes what the
//! reported numbers mean. They are exposed so that the computation stays
//! transparent rather than to invite tuning.

/// Configuration for a [`Tracker`](crate::Tracker).
///
/// Immutable once constructed. `standard()` returns the configuration the
/// small-drop / large-drop metrics were calibrated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Number of dropped frames that defines a "small" drop event.
    ///
    /// Must be at least 1.
    pub small_drop_threshold: u32,

    /// Number of dropped frames that defines a "large" drop event.
    ///
    /// Must be at least 1. A value below `small_drop_threshold` breaks the
    /// severity ordering of the two scores.
    pub large_drop_threshold: u32,

    /// Ceiling applied to the per-frame drop count before aggregation.
    ///
    /// Pathological stalls (lock contention, priority inversion) would
    /// otherwise dominate the aggregate; past this many dropped frames the
    /// extra count only adds noise.
    pub max_drops_per_frame: u32,

    /// When true, call stacks are sampled while tracking and resolved stacks
    /// are delivered through [`MetricsSink::on_stack_resolved`](crate::MetricsSink::on_stack_resolved).
    pub report_stack_traces: bool,
}

impl TrackerConfig {
    /// The standard configuration: small drop = 1 frame, large drop = 4
    /// frames, drop count capped at 15, stack reporting off.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            small_drop_threshold: 1,
            large_drop_threshold: 4,
            max_drops_per_frame: 15,
            report_stack_traces: false,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::standard()
    }
}

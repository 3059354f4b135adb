//! The start/stop tracking state machine.
//!
//! A `Tracker` measures one interaction at a time: the host calls
//! [`Tracker::start`] when the interaction begins (say, a scroll gesture),
//! forwards every display refresh to [`Tracker::on_tick`], and calls
//! [`Tracker::stop`] when it ends. The tracker owns the aggregation state,
//! drives the process-wide sampling services, and reports finished sessions
//! to its sink.
//!
//! Overlap policy, by design rather than by error: a `start` during an
//! active session silently discards everything accumulated so far and
//! restarts, and a `stop` without a session is a no-op. Neither is
//! surfaced to the caller.

use std::sync::{Arc, Weak};

use log::{debug, warn};

use crate::aggregation::AggregationState;
use crate::clock::{FrameClock, FrameTick};
use crate::config::TrackerConfig;
use crate::errors::TrackerError;
use crate::sampling::{StackSampler, RING_CAPACITY};
use crate::sink::MetricsSink;
use crate::symbolization::resolver::{StackJob, StackResolver};

/// Animation performance tracker.
///
/// All methods must be called on the thread that receives clock ticks;
/// that thread also becomes the stack-sampling interrupt target when stack
/// reporting is enabled.
pub struct Tracker {
    config: TrackerConfig,
    clock: Arc<dyn FrameClock>,
    sink: Weak<dyn MetricsSink>,

    tracking: bool,
    first_tick: bool,
    previous_timestamp: f64,
    prepared: bool,
    state: AggregationState,

    sampler: Option<&'static StackSampler>,
    resolver: Option<&'static StackResolver>,
}

impl Tracker {
    /// Create a tracker.
    ///
    /// Must be called on the tick-receiving thread: when
    /// `config.report_stack_traces` is set, construction installs the
    /// process-wide sampling services and the calling thread becomes the
    /// interrupt target for the process lifetime. The sink is held weakly;
    /// dropping it stops the callbacks, not the tracker.
    #[must_use]
    pub fn new(
        config: TrackerConfig,
        clock: Arc<dyn FrameClock>,
        sink: Weak<dyn MetricsSink>,
    ) -> Self {
        let (sampler, resolver) = if config.report_stack_traces {
            (Some(StackSampler::install()), Some(StackResolver::install()))
        } else {
            (None, None)
        };

        Self {
            config,
            clock,
            sink,
            tracking: false,
            first_tick: true,
            previous_timestamp: 0.0,
            prepared: false,
            state: AggregationState::new(),
            sampler,
            resolver,
        }
    }

    /// Begin a tracking session.
    ///
    /// Starting while a session is active discards the pending data
    /// silently (no report) and restarts accumulation.
    pub fn start(&mut self) {
        if self.tracking {
            debug!("start while tracking: discarding the pending session");
            self.reset_session();
            return;
        }

        if let Err(err) = self.prepare() {
            warn!("{err}; tracking not started");
            return;
        }

        self.clock.set_paused(false);
        self.tracking = true;
        self.reset_session();

        if let Some(sampler) = self.sampler {
            sampler.resume();
        }
        debug!("tracking session started");
    }

    /// End the active session, reporting its metrics if it accumulated any
    /// duration. A `stop` without an active session is a no-op.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn stop(&mut self) {
        if !self.tracking {
            return;
        }
        self.tracking = false;
        self.clock.set_paused(true);

        if self.state.total_duration() > 0.0 {
            if let Some(sink) = self.sink.upgrade() {
                let duration_ms = (self.state.total_duration() * 1000.0).round() as u64;
                sink.on_metrics_reported(
                    duration_ms,
                    self.state.small_drop_score(),
                    self.state.large_drop_score(),
                );
            }
        }

        // The sampler is parked even for an empty session; it must not keep
        // firing between sessions.
        if let Some(sampler) = self.sampler {
            sampler.pause();
        }
        debug!("tracking session stopped, duration {:.3}s", self.state.total_duration());
    }

    /// Feed one display refresh into the active session.
    ///
    /// The first tick after `start` is a baseline only, since there is no
    /// prior timestamp to classify against. Ticks outside a session are
    /// ignored.
    pub fn on_tick(&mut self, tick: FrameTick) {
        if !self.tracking {
            return;
        }

        if self.first_tick {
            self.first_tick = false;
            self.previous_timestamp = tick.timestamp;
            return;
        }

        let frame_time = tick.timestamp - self.previous_timestamp;
        self.previous_timestamp = tick.timestamp;

        let dropped = self.state.record_frame(frame_time, tick.frame_duration, &self.config);
        if dropped >= 1 && self.config.report_stack_traces {
            self.capture_drop_stacks(dropped);
        }
    }

    /// True while a session is active.
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// The running totals of the current (or most recent) session.
    #[must_use]
    pub fn aggregation(&self) -> &AggregationState {
        &self.state
    }

    /// Connect the clock on first use; the connection is reused by every
    /// later session.
    fn prepare(&mut self) -> Result<(), TrackerError> {
        if self.prepared {
            return Ok(());
        }
        self.clock.connect()?;
        self.prepared = true;
        Ok(())
    }

    fn reset_session(&mut self) {
        self.first_tick = true;
        self.previous_timestamp = 0.0;
        self.state.reset();
        if let Some(sampler) = self.sampler {
            sampler.ring().clear_dirty();
        }
    }

    /// Walk the ring backward over the samples covering a drop of
    /// `dropped` frames and queue every verified copy for resolution.
    fn capture_drop_stacks(&self, dropped: u32) {
        let (Some(sampler), Some(resolver)) = (self.sampler, self.resolver) else {
            return;
        };
        let ring = sampler.ring();

        // One slot per missed frame plus the frame itself, bounded by the
        // ring. The walk uses the clamped count: samples past the ceiling
        // describe the same stall the metric already refuses to weight.
        let walk = (dropped as usize).min(RING_CAPACITY - 1);

        ring.clear_dirty();
        for back in 0..=walk {
            let copy = ring.copy_slot_back(back);
            if ring.is_dirty() {
                // The interrupt fired mid-walk; this copy and everything
                // behind it can no longer be verified.
                break;
            }
            if copy.is_empty() {
                continue;
            }
            resolver.submit(StackJob {
                frames: copy.frames().to_vec(),
                sink: self.sink.clone(),
            });
        }
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        if self.prepared {
            self.clock.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    const IDEAL: f64 = 0.016;

    #[derive(Default)]
    struct RecordingClock {
        connects: AtomicUsize,
        disconnects: AtomicUsize,
        pause_calls: Mutex<Vec<bool>>,
        fail_connect: bool,
    }

    impl FrameClock for RecordingClock {
        fn connect(&self) -> Result<(), TrackerError> {
            if self.fail_connect {
                return Err(TrackerError::ClockConnectFailed("test clock refused".into()));
            }
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn set_paused(&self, paused: bool) {
            self.pause_calls.lock().unwrap().push(paused);
        }

        fn disconnect(&self) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        reports: Mutex<Vec<(u64, f64, f64)>>,
        stacks: Mutex<Vec<String>>,
    }

    impl MetricsSink for RecordingSink {
        fn on_metrics_reported(&self, duration_ms: u64, small: f64, large: f64) {
            self.reports.lock().unwrap().push((duration_ms, small, large));
        }

        fn on_stack_resolved(&self, stack: &str, _slide: &str) {
            self.stacks.lock().unwrap().push(stack.to_string());
        }
    }

    fn tick_at(ms: f64) -> FrameTick {
        FrameTick { timestamp: ms / 1000.0, frame_duration: IDEAL }
    }

    #[test]
    fn session_reports_metrics_once() {
        let clock = Arc::new(RecordingClock::default());
        let concrete = Arc::new(RecordingSink::default());
        let sink_dyn: Arc<dyn MetricsSink> = Arc::clone(&concrete) as _;
        let mut tracker = Tracker::new(
            TrackerConfig::standard(),
            Arc::clone(&clock) as Arc<dyn FrameClock>,
            Arc::downgrade(&sink_dyn),
        );

        tracker.start();
        for ms in [0.0, 16.0, 32.0, 80.0, 96.0] {
            tracker.on_tick(tick_at(ms));
        }
        tracker.stop();

        let reports = concrete.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        let (duration_ms, small, large) = reports[0];
        // Gaps 16/16/48/16 ms: the 48 ms gap drops two frames.
        assert_eq!(duration_ms, 96);
        assert!((small - 2.0).abs() < 1e-9);
        assert_eq!(large, 0.0);
    }

    #[test]
    fn double_start_discards_pending_session() {
        let clock = Arc::new(RecordingClock::default());
        let concrete = Arc::new(RecordingSink::default());
        let sink_dyn: Arc<dyn MetricsSink> = Arc::clone(&concrete) as _;
        let mut tracker = Tracker::new(
            TrackerConfig::standard(),
            Arc::clone(&clock) as Arc<dyn FrameClock>,
            Arc::downgrade(&sink_dyn),
        );

        tracker.start();
        tracker.on_tick(tick_at(0.0));
        tracker.on_tick(tick_at(48.0));
        assert!(tracker.aggregation().total_duration() > 0.0);

        tracker.start();

        assert!(tracker.is_tracking());
        assert_eq!(*tracker.aggregation(), AggregationState::new());
        assert!(concrete.reports.lock().unwrap().is_empty());
    }

    #[test]
    fn stop_without_session_is_noop() {
        let clock = Arc::new(RecordingClock::default());
        let concrete = Arc::new(RecordingSink::default());
        let sink_dyn: Arc<dyn MetricsSink> = Arc::clone(&concrete) as _;
        let mut tracker = Tracker::new(
            TrackerConfig::standard(),
            Arc::clone(&clock) as Arc<dyn FrameClock>,
            Arc::downgrade(&sink_dyn),
        );

        tracker.stop();

        assert!(!tracker.is_tracking());
        assert!(concrete.reports.lock().unwrap().is_empty());
        assert!(clock.pause_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_session_is_never_reported() {
        let clock = Arc::new(RecordingClock::default());
        let concrete = Arc::new(RecordingSink::default());
        let sink_dyn: Arc<dyn MetricsSink> = Arc::clone(&concrete) as _;
        let mut tracker = Tracker::new(
            TrackerConfig::standard(),
            Arc::clone(&clock) as Arc<dyn FrameClock>,
            Arc::downgrade(&sink_dyn),
        );

        tracker.start();
        // Only the baseline tick: no gap was ever classified.
        tracker.on_tick(tick_at(0.0));
        tracker.stop();

        assert!(concrete.reports.lock().unwrap().is_empty());
    }

    #[test]
    fn clock_is_connected_once_and_reused() {
        let clock = Arc::new(RecordingClock::default());
        let concrete = Arc::new(RecordingSink::default());
        let sink_dyn: Arc<dyn MetricsSink> = Arc::clone(&concrete) as _;
        let mut tracker = Tracker::new(
            TrackerConfig::standard(),
            Arc::clone(&clock) as Arc<dyn FrameClock>,
            Arc::downgrade(&sink_dyn),
        );

        tracker.start();
        tracker.stop();
        tracker.start();
        tracker.stop();

        assert_eq!(clock.connects.load(Ordering::SeqCst), 1);
        assert_eq!(*clock.pause_calls.lock().unwrap(), vec![false, true, false, true]);

        drop(tracker);
        assert_eq!(clock.disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn connect_failure_leaves_tracker_idle() {
        let clock = Arc::new(RecordingClock { fail_connect: true, ..Default::default() });
        let concrete = Arc::new(RecordingSink::default());
        let sink_dyn: Arc<dyn MetricsSink> = Arc::clone(&concrete) as _;
        let mut tracker = Tracker::new(
            TrackerConfig::standard(),
            Arc::clone(&clock) as Arc<dyn FrameClock>,
            Arc::downgrade(&sink_dyn),
        );

        tracker.start();

        assert!(!tracker.is_tracking());
        assert!(clock.pause_calls.lock().unwrap().is_empty());

        drop(tracker);
        // Never connected, so never disconnected.
        assert_eq!(clock.disconnects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn ticks_outside_a_session_are_ignored() {
        let clock = Arc::new(RecordingClock::default());
        let concrete = Arc::new(RecordingSink::default());
        let sink_dyn: Arc<dyn MetricsSink> = Arc::clone(&concrete) as _;
        let mut tracker = Tracker::new(
            TrackerConfig::standard(),
            Arc::clone(&clock) as Arc<dyn FrameClock>,
            Arc::downgrade(&sink_dyn),
        );

        tracker.on_tick(tick_at(0.0));
        tracker.on_tick(tick_at(100.0));

        assert_eq!(*tracker.aggregation(), AggregationState::new());
    }

    #[test]
    fn drop_of_k_frames_resolves_at_most_k_plus_one_stacks() {
        // Drives the ring the way the interrupt handler would, without the
        // sampler firing: the walk and its bound become deterministic. The
        // only test in this binary touching the process-wide ring.
        let clock = Arc::new(RecordingClock::default());
        let concrete = Arc::new(RecordingSink::default());
        let sink_dyn: Arc<dyn MetricsSink> = Arc::clone(&concrete) as _;
        let config = TrackerConfig { report_stack_traces: true, ..TrackerConfig::standard() };
        let mut tracker = Tracker::new(
            config,
            Arc::clone(&clock) as Arc<dyn FrameClock>,
            Arc::downgrade(&sink_dyn),
        );

        let ring = &crate::sampling::signal::SAMPLE_RING;
        for _ in 0..RING_CAPACITY {
            ring.capture_current();
        }

        tracker.start();
        tracker.on_tick(tick_at(0.0));
        // An 80 ms gap at 16 ms ideal: k = 4 dropped frames.
        tracker.on_tick(tick_at(80.0));
        tracker.stop();

        // Resolution is asynchronous; wait for the walk's jobs to drain.
        let deadline = Instant::now() + Duration::from_secs(5);
        while concrete.stacks.lock().unwrap().len() < 5 {
            assert!(Instant::now() < deadline, "resolved stacks never arrived");
            std::thread::sleep(Duration::from_millis(10));
        }
        std::thread::sleep(Duration::from_millis(100));

        let stacks = concrete.stacks.lock().unwrap();
        assert_eq!(stacks.len(), 5, "a drop of 4 frames walks exactly 5 slots");
        for stack in stacks.iter() {
            // Captures from a live thread are deeper than the two skipped
            // machinery frames, and every entry is module:address.
            assert!(!stack.is_empty());
            for pair in stack.split_terminator('|') {
                assert!(pair.contains(':'), "malformed entry {pair:?}");
            }
        }
    }

    #[test]
    fn dropped_sink_means_no_report_but_session_completes() {
        let clock = Arc::new(RecordingClock::default());
        let sink_dyn: Arc<dyn MetricsSink> = Arc::new(RecordingSink::default()) as _;
        let weak = Arc::downgrade(&sink_dyn);
        let mut tracker =
            Tracker::new(TrackerConfig::standard(), Arc::clone(&clock) as Arc<dyn FrameClock>, weak);
        drop(sink_dyn);

        tracker.start();
        tracker.on_tick(tick_at(0.0));
        tracker.on_tick(tick_at(16.0));
        tracker.stop();

        assert!(!tracker.is_tracking());
        assert_eq!(*clock.pause_calls.lock().unwrap(), vec![false, true]);
    }
}

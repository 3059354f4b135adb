//! # jank - Animation Smoothness Tracking
//!
//! jank measures how smoothly a host application animates during a bounded
//! interaction (typically a scroll gesture) by classifying every
//! inter-frame gap against the display's ideal frame duration and
//! aggregating two severity-weighted metrics: a small-drop score and a
//! large-drop score. Optionally, it captures the call stacks executing
//! while frames were being dropped, using a profiling signal fired at
//! frame cadence by a dedicated thread, and resolves them to module names
//! off the measurement path.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                       Host Application                        │
//! │     display refresh ──▶ FrameClock / FrameTick                │
//! └──────────────────────────┬────────────────────────────────────┘
//!                            │ on_tick (foreground thread)
//!                            ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     jank (This Crate)                         │
//! │                                                               │
//! │  ┌────────────┐    ┌─────────────┐    ┌──────────────┐        │
//! │  │  Tracker   │───▶│ Aggregation │───▶│ MetricsSink  │        │
//! │  │ start/stop │    │  (scores)   │    │  (reports)   │        │
//! │  └─────┬──────┘    └─────────────┘    └──────▲───────┘        │
//! │        │ drop detected                       │ resolved stacks│
//! │        ▼                                     │                │
//! │  ┌────────────┐  SIGPROF   ┌───────────┐  ┌──┴──────────┐     │
//! │  │  Sampler   │ ─────────▶ │ StackRing │─▶│ StackResolver│    │
//! │  │  (thread)  │  handler   │ (no locks)│  │ (worker)     │    │
//! │  └────────────┘            └───────────┘  └─────────────┘     │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`tracker`]: the start/stop state machine orchestrating a session
//! - [`aggregation`]: frame-drop classification and running totals
//! - [`config`]: the tracker configuration value object
//! - [`clock`] / [`sink`]: the two interfaces the host implements
//! - [`sampling`]: the interrupt-driven stack capture subsystem
//!   - `ring`: signal-safe circular buffer of raw instruction pointers
//!   - `signal`: one-shot SIGPROF registration and the capture handler
//!   - `sampler`: the condition-variable-gated interrupt-firing thread
//! - [`symbolization`]: address-to-module resolution on a serial worker
//! - [`errors`]: structured error types for the fallible setup paths
//!
//! ## The Metric
//!
//! Each gap of `actual` seconds against an `ideal` frame duration drops
//! `round(actual / ideal) - 1` frames, clamped to a configured ceiling.
//! Drops at or past a threshold add `dropped / threshold` to that
//! threshold's score, so `total_duration / score` is the number of seconds
//! between drop-equivalent events, a number that tracks time spent at the
//! target frame rate no matter which thresholds are chosen.
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! let sink: Arc<dyn MetricsSink> = Arc::new(MyReporter::new());
//! let clock: Arc<dyn FrameClock> = Arc::new(MyDisplayLink::new());
//! let mut tracker = Tracker::new(TrackerConfig::standard(), clock, Arc::downgrade(&sink));
//!
//! // scroll began
//! tracker.start();
//! // per display refresh, on the same thread
//! tracker.on_tick(FrameTick { timestamp, frame_duration });
//! // scroll ended
//! tracker.stop();
//! ```
//!
//! ## Key Constraints
//!
//! - **One session at a time**: a `start` during a session discards the
//!   pending data by policy; a `stop` without one is a no-op.
//! - **Signal-handler discipline**: the capture path allocates nothing,
//!   locks nothing, and writes only pre-allocated slots; torn reads are
//!   detected with a dirty flag and discarded, never repaired.
//! - **Process-wide services**: the sampling thread, the signal
//!   registration, and the module table are one-time, latch-guarded
//!   singletons shared by every tracker in the process.

pub mod aggregation;
pub mod clock;
pub mod config;
pub mod errors;
pub mod sampling;
pub mod sink;
pub mod symbolization;
pub mod tracker;

pub use aggregation::AggregationState;
pub use clock::{FrameClock, FrameTick};
pub use config::TrackerConfig;
pub use errors::TrackerError;
pub use sink::MetricsSink;
pub use tracker::Tracker;

//! Frame clock adapter interface.
//!
//! The display-refresh clock is owned by the host UI layer, not by this
//! crate. The host implements [`FrameClock`] over whatever native facility
//! drives its refresh (a display link, a vsync callback, a compositor
//! frame callback) and forwards each refresh to
//! [`Tracker::on_tick`](crate::Tracker::on_tick).

use crate::errors::TrackerError;

/// One display refresh, as delivered by the host's clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Timestamp of this refresh, in seconds on the host's monotonic clock.
    pub timestamp: f64,
    /// The ideal duration of one frame at the display's current refresh
    /// rate, in seconds (e.g. 1/60 s).
    pub frame_duration: f64,
}

/// The tick source consumed by the tracker.
///
/// Contract for implementors:
/// - ticks must carry monotonically increasing timestamps and the current
///   ideal frame duration;
/// - `set_paused` must not destroy the underlying source; the same
///   connection is paused and resumed across tracking sessions;
/// - all calls arrive on the thread that receives the ticks.
pub trait FrameClock: Send + Sync {
    /// Create the underlying tick source. Called once, before the first
    /// session; the connection is reused afterwards.
    ///
    /// # Errors
    /// Returns an error if the host cannot provide a tick source. The
    /// tracker logs the failure and stays idle.
    fn connect(&self) -> Result<(), TrackerError>;

    /// Pause or resume tick delivery without losing the connection.
    fn set_paused(&self, paused: bool);

    /// Tear the tick source down. Called at tracker end of life, only if
    /// `connect` ever succeeded.
    fn disconnect(&self);
}

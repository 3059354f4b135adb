//! SIGPROF registration and the capture handler.
//!
//! Registration must happen exactly once per process lifetime; repeating it
//! is unsafe, so it sits behind a `Once` latch. SIGPROF is the profiling
//! signal and is not otherwise used by the runtime; collisions with other
//! profilers in the same process are possible and unguarded.

use std::sync::Once;

use super::ring::StackRing;

/// The process-wide sample ring. Written only by the handler below, read
/// only by the foreground tick path.
pub(crate) static SAMPLE_RING: StackRing = StackRing::new();

static HANDLER_INSTALLED: Once = Once::new();

/// Register the SIGPROF handler. Idempotent; later calls are no-ops.
#[allow(unsafe_code)]
pub(crate) fn install_handler() {
    HANDLER_INSTALLED.call_once(|| {
        // SAFETY: standard sigaction registration; the handler only touches
        // the static ring through its signal-safe write path. All signals
        // are masked while the handler runs.
        unsafe {
            let mut sa: libc::sigaction = std::mem::zeroed();
            sa.sa_sigaction = stack_capture_handler as *const () as usize;
            sa.sa_flags = libc::SA_SIGINFO;
            libc::sigfillset(&mut sa.sa_mask);
            libc::sigaction(libc::SIGPROF, &sa, std::ptr::null_mut());
        }
    });
}

/// Runs on the tick-receiving thread every ~16 ms while a session with
/// stack reporting is active. Signal-handler contract: writes to the
/// pre-allocated ring only; no allocation, no locks, nothing non-reentrant.
extern "C" fn stack_capture_handler(
    _sig: libc::c_int,
    _info: *mut libc::siginfo_t,
    _ctx: *mut libc::c_void,
) {
    SAMPLE_RING.capture_current();
}

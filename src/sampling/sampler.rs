//! The dedicated sampling thread.
//!
//! Sampling on the measurement path would perturb the very frame timing
//! being measured, and would stop dead exactly when the measured thread
//! stalls, which is the scenario most worth capturing. So a dedicated
//! thread fires the interrupts: parked on a condition variable while no
//! session is active, and in a sleep-and-signal loop at roughly one frame
//! interval while one is.

use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::thread;
use std::time::Duration;

use log::warn;

use crate::errors::TrackerError;

use super::ring::StackRing;
use super::signal;

/// Interval between interrupt deliveries while active: about one frame at
/// 60 Hz, so each ring slot roughly corresponds to one missed frame.
const SAMPLE_INTERVAL: Duration = Duration::from_millis(16);

/// Process-wide sampling service.
///
/// Installed lazily, exactly once; the thread is never torn down, merely
/// parked between sessions and reused by the next one.
pub struct StackSampler {
    shared: Arc<Shared>,
}

struct Shared {
    active: Mutex<bool>,
    resume: Condvar,
    /// Interrupt target: the thread that called [`StackSampler::install`],
    /// i.e. the one receiving clock ticks.
    target: libc::pthread_t,
}

static SAMPLER: OnceLock<StackSampler> = OnceLock::new();

impl StackSampler {
    /// Install the process-wide sampler, registering the signal handler and
    /// spawning the sampling thread on first call. Must first be called
    /// from the tick-receiving thread; that thread becomes the interrupt
    /// target for the process lifetime.
    #[allow(unsafe_code)]
    pub(crate) fn install() -> &'static StackSampler {
        SAMPLER.get_or_init(|| {
            signal::install_handler();

            // SAFETY: pthread_self has no preconditions.
            let target = unsafe { libc::pthread_self() };
            let shared = Arc::new(Shared {
                active: Mutex::new(false),
                resume: Condvar::new(),
                target,
            });

            let loop_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name("jank-sampler".into())
                .spawn(move || sampler_loop(&loop_shared));
            if let Err(err) = spawned {
                let err = TrackerError::ThreadSpawnFailed {
                    thread: "jank-sampler".into(),
                    error: err.to_string(),
                };
                warn!("{err}; stack capture disabled");
            }

            StackSampler { shared }
        })
    }

    /// Begin firing interrupts at the target thread.
    pub(crate) fn resume(&self) {
        let mut active = self.shared.active.lock().unwrap();
        *active = true;
        self.shared.resume.notify_one();
    }

    /// Stop firing. The thread parks on the condition variable until the
    /// next [`Self::resume`].
    pub(crate) fn pause(&self) {
        let mut active = self.shared.active.lock().unwrap();
        *active = false;
    }

    /// The ring the interrupt handler writes into.
    pub(crate) fn ring(&self) -> &'static StackRing {
        &signal::SAMPLE_RING
    }
}

#[allow(unsafe_code)]
fn sampler_loop(shared: &Shared) {
    loop {
        let mut active = shared.active.lock().unwrap();
        while !*active {
            // Parked between sessions; spurious wakeups re-check the flag.
            active = shared.resume.wait(active).unwrap();
        }
        drop(active);

        loop {
            thread::sleep(SAMPLE_INTERVAL);
            if !*shared.active.lock().unwrap() {
                break;
            }

            // SAFETY: the target is the install-time tick thread, assumed
            // alive for the process lifetime since it receives the clock
            // ticks.
            unsafe {
                libc::pthread_kill(shared.target, libc::SIGPROF);
            }
        }
    }
}

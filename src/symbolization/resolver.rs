// String formatting intentionally uses format! for clarity
#![allow(clippy::format_push_string)]

//! Deferred stack resolution, off the measurement path.
//!
//! Verified ring-buffer copies are handed to a single worker thread over a
//! channel: a serial, strictly ordered queue decoupled from both the
//! interrupt context and the foreground tick path. The worker owns the
//! module table outright (all its inputs are copies, so nothing here needs
//! a lock), resolves each frame to a module name, and delivers the
//! formatted stack to the session's sink together with the host binary's
//! slide.

use std::sync::{OnceLock, Weak};
use std::thread;

use crossbeam_channel::{unbounded, Sender};
use log::warn;

use crate::errors::TrackerError;
use crate::sink::MetricsSink;

use super::module_table::ModuleTable;

/// Leading frames of every capture that belong to the capture machinery
/// itself (signal trampoline + unwinder entry), not to the stalled code.
const CAPTURE_MACHINERY_FRAMES: usize = 2;

/// One verified stack copy on its way to the sink.
pub(crate) struct StackJob {
    pub frames: Vec<usize>,
    pub sink: Weak<dyn MetricsSink>,
}

/// Process-wide resolution service: an ordered single-consumer queue and
/// its worker thread. Installed lazily, exactly once.
pub struct StackResolver {
    jobs: Sender<StackJob>,
}

static RESOLVER: OnceLock<StackResolver> = OnceLock::new();

impl StackResolver {
    /// Install the resolver, spawning the worker on first call. The worker
    /// builds the module address table before draining its first job, so
    /// the build never runs on the foreground path and never re-runs.
    pub(crate) fn install() -> &'static StackResolver {
        RESOLVER.get_or_init(|| {
            let (jobs, incoming) = unbounded::<StackJob>();

            let spawned = thread::Builder::new().name("jank-resolver".into()).spawn(move || {
                let table = ModuleTable::load().unwrap_or_else(|err| {
                    warn!("{}", TrackerError::ModuleMapsUnavailable(err.to_string()));
                    ModuleTable::empty()
                });

                for job in incoming {
                    let Some(sink) = job.sink.upgrade() else {
                        continue;
                    };
                    let stack = format_stack(&table, &job.frames);
                    sink.on_stack_resolved(&stack, host_slide());
                }
            });
            if let Err(err) = spawned {
                let err = TrackerError::ThreadSpawnFailed {
                    thread: "jank-resolver".into(),
                    error: err.to_string(),
                };
                warn!("{err}; stack reporting disabled");
            }

            StackResolver { jobs }
        })
    }

    /// Queue one verified copy for resolution. Never blocks.
    pub(crate) fn submit(&self, job: StackJob) {
        // Unbounded channel: send only fails if the worker is gone, in
        // which case the sample is dropped like any other degraded path.
        let _ = self.jobs.send(job);
    }
}

/// Format a captured stack as pipe-delimited `module:address` pairs,
/// skipping the capture machinery's own frames.
fn format_stack(table: &ModuleTable, frames: &[usize]) -> String {
    let mut stack = String::new();
    for &ip in frames.iter().skip(CAPTURE_MACHINERY_FRAMES) {
        stack.push_str(table.resolve(ip as u64));
        stack.push_str(&format!(":0x{ip:x}|"));
    }
    stack
}

/// The host binary's load address, formatted `0x…`. Computed on first use
/// and cached for the process lifetime.
fn host_slide() -> &'static str {
    static SLIDE: OnceLock<String> = OnceLock::new();
    SLIDE.get_or_init(|| format!("0x{:x}", host_image_base().unwrap_or(0)))
}

/// Base address of the image containing this crate's code, via `dladdr` on
/// one of our own functions.
#[allow(unsafe_code)]
fn host_image_base() -> Option<u64> {
    let probe = host_image_base as *const libc::c_void;
    let mut info = std::mem::MaybeUninit::<libc::Dl_info>::zeroed();

    // SAFETY: dladdr fills `info` when it returns non-zero.
    let ok = unsafe { libc::dladdr(probe, info.as_mut_ptr()) };
    if ok == 0 {
        return None;
    }
    let info = unsafe { info.assume_init() };

    if info.dli_fbase.is_null() {
        None
    } else {
        Some(info.dli_fbase as usize as u64)
    }
}

// src/metrics.rs

//! Peak memory sampling for supervised children.
//!
//! Memory is polled with `sysinfo` on a background thread, so very short
//! spikes can be missed. If the process cannot be inspected the sampler
//! simply reports `None`.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

use sysinfo::{Pid, System};

/// Default polling interval.
pub const SAMPLE_EVERY: Duration = Duration::from_millis(20);

/// Tracks the peak resident set size of one process while it runs.
pub struct PeakRssSampler {
    stop: Arc<AtomicBool>,
    peak_bytes: Arc<AtomicU64>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PeakRssSampler {
    pub fn start(pid: u32, every: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let peak_bytes = Arc::new(AtomicU64::new(0));

        let handle = {
            let stop = Arc::clone(&stop);
            let peak_bytes = Arc::clone(&peak_bytes);

            thread::spawn(move || {
                let pid = Pid::from_u32(pid);
                let mut system = System::new();

                while !stop.load(Ordering::Relaxed) {
                    if !system.refresh_process(pid) {
                        break;
                    }
                    match system.process(pid) {
                        Some(process) => {
                            peak_bytes.fetch_max(process.memory(), Ordering::Relaxed);
                        }
                        None => break,
                    }
                    thread::sleep(every);
                }
            })
        };

        Self {
            stop,
            peak_bytes,
            handle: Some(handle),
        }
    }

    /// Stop sampling and return the peak RSS in KB.
    pub fn finish(mut self) -> Option<u64> {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        match self.peak_bytes.load(Ordering::Relaxed) {
            0 => None,
            bytes => Some(bytes / 1024),
        }
    }
}

impl Drop for PeakRssSampler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

//! Background thread that runs a task on a fixed interval until stopped.
//!
//! The thread sleeps on a `parking_lot::Condvar` with a deadline, so
//! [`AutoEvictor::stop`] wakes it immediately instead of waiting out the
//! interval. The task runs with the stop lock released.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Handle to a running interval thread.
#[derive(Debug)]
pub struct AutoEvictor {
    signal: Arc<StopSignal>,
    thread: Option<JoinHandle<()>>,
    interval: Duration,
}

impl AutoEvictor {
    /// Spawns the thread. `task` first runs one `interval` after start.
    pub fn start<F>(interval: Duration, mut task: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);

        let thread = thread::Builder::new()
            .name("bicache-evictor".into())
            .spawn(move || {
                let mut next_run = Instant::now() + interval;
                let mut stopped = thread_signal.stopped.lock();
                while !*stopped {
                    if thread_signal
                        .wake
                        .wait_until(&mut stopped, next_run)
                        .timed_out()
                    {
                        MutexGuard::unlocked(&mut stopped, &mut task);
                        next_run = Instant::now() + interval;
                    }
                }
            })?;

        info!(interval_ms = interval.as_millis() as u64, "auto-evictor started");
        Ok(Self {
            signal,
            thread: Some(thread),
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Signals the thread and joins it. Safe to call more than once.
    pub fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        *self.signal.stopped.lock() = true;
        self.signal.wake.notify_all();
        if thread.join().is_err() {
            warn!("auto-evictor task panicked");
        }
        debug!("auto-evictor stopped");
    }
}

impl Drop for AutoEvictor {
    fn drop(&mut self) {
        self.stop();
    }
}

//! Background page preallocation and flushing.
//!
//! A writable handle runs one thread that, every period, maps the pages
//! just ahead of the write frontier and schedules an asynchronous flush.
//! Writers therefore rarely pay for file growth or page faults on the
//! critical path. Failures are logged and retried on the next tick.

use crate::error::{YamalError, YamalResult};
use crate::yamal::Shared;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

struct Signal {
    stop: Mutex<bool>,
    wake: Condvar,
}

/// Handle on a running maintenance thread.
pub(crate) struct Maintenance {
    signal: Arc<Signal>,
    thread: Option<JoinHandle<()>>,
}

impl Maintenance {
    /// Starts the thread for `shared`.
    pub(crate) fn spawn(shared: Arc<Shared>) -> YamalResult<Self> {
        let signal = Arc::new(Signal {
            stop: Mutex::new(false),
            wake: Condvar::new(),
        });
        let period = shared.config().maintenance_period;

        let thread_signal = Arc::clone(&signal);
        let thread = thread::Builder::new()
            .name("yamal-maintenance".into())
            .spawn(move || run(&shared, &thread_signal, period))?;

        Ok(Self {
            signal,
            thread: Some(thread),
        })
    }

    /// Signals the thread to stop and waits for it.
    pub(crate) fn stop(&mut self) -> YamalResult<()> {
        {
            let mut stop = self.signal.stop.lock();
            *stop = true;
            self.signal.wake.notify_all();
        }
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| YamalError::MaintenancePanicked),
            None => Ok(()),
        }
    }
}

impl Drop for Maintenance {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(error = %e, "maintenance thread did not stop cleanly");
        }
    }
}

fn run(shared: &Shared, signal: &Signal, period: Duration) {
    tracing::debug!(?period, "maintenance thread started");
    let mut stop = signal.stop.lock();
    while !*stop {
        if let Err(e) = shared.preallocate_ahead() {
            tracing::warn!(error = %e, "page preallocation failed");
        }
        if let Err(e) = shared.flush_async() {
            tracing::warn!(error = %e, "asynchronous flush failed");
        }
        signal.wake.wait_for(&mut stop, period);
    }
    tracing::debug!("maintenance thread stopped");
}

#[cfg(test)]
mod tests {
    use crate::{Config, Yamal};
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    const PAGE: u64 = 64 * 1024;

    fn config() -> Config {
        Config::new()
            .page_size(PAGE)
            .prealloc_size(2 * PAGE)
            .max_pages(32)
            .maintenance_period(Duration::from_millis(1))
    }

    #[test]
    fn preallocates_ahead_of_frontier() {
        let dir = tempdir().unwrap();
        let log = Yamal::open(dir.path().join("m.ytp"), config()).unwrap();
        // Opening maps pages through the preallocation margin.
        assert!(log.mapped_pages() >= 3);

        // Move the frontier into page 3.
        for _ in 0..4 {
            log.reserve(60 * 1024).unwrap();
        }
        let deadline = Instant::now() + Duration::from_secs(5);
        while log.mapped_pages() < 6 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(log.mapped_pages() >= 6, "mapped {}", log.mapped_pages());
    }

    #[test]
    fn close_stops_thread_promptly() {
        let dir = tempdir().unwrap();
        let log = Yamal::open(
            dir.path().join("m.ytp"),
            config().maintenance_period(Duration::from_secs(3600)),
        )
        .unwrap();

        let started = Instant::now();
        log.close().unwrap();
        assert!(started.elapsed() < Duration::from_secs(60));
    }
}

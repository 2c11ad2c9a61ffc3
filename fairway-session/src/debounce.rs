use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

struct Pending {
    handle: JoinHandle<()>,
    fired: Arc<AtomicBool>,
}

/// Delays a side effect until a burst of triggers has paused for a quiet
/// interval.
///
/// Each `schedule` restarts the quiet window: a task still waiting out the
/// window is aborted and replaced. A task that has already started its run
/// is never aborted by a reschedule; it is left to finish while the new
/// window counts down (any required serialization against it is the
/// caller's concern). `cancel` drops the pending window without running
/// it, and dropping the debouncer aborts everything outstanding.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<Pending>>,
    draining: Mutex<Vec<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
            draining: Mutex::new(Vec::new()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)start the quiet window; `run` executes when it elapses.
    pub fn schedule<F>(&self, run: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_flag = fired.clone();
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fired_flag.store(true, Ordering::SeqCst);
            run.await;
        });

        let previous = self
            .pending
            .lock()
            .expect("debounce lock poisoned")
            .replace(Pending { handle, fired });

        if let Some(previous) = previous {
            if previous.fired.load(Ordering::SeqCst) {
                // Already running; keep the handle so settle() can await it.
                self.draining
                    .lock()
                    .expect("debounce lock poisoned")
                    .push(previous.handle);
            } else {
                previous.handle.abort();
            }
        }

        self.draining
            .lock()
            .expect("debounce lock poisoned")
            .retain(|handle| !handle.is_finished());
    }

    /// Abort a pending quiet window without running it. A run already in
    /// progress is left to finish.
    pub fn cancel(&self) {
        if let Some(pending) = self.pending.lock().expect("debounce lock poisoned").take() {
            if pending.fired.load(Ordering::SeqCst) {
                self.draining
                    .lock()
                    .expect("debounce lock poisoned")
                    .push(pending.handle);
            } else {
                pending.handle.abort();
            }
        }
    }

    /// Wait until nothing is pending or running. Lets the pending window
    /// elapse naturally; intended for tests and orderly shutdown.
    pub async fn settle(&self) {
        loop {
            let mut handles = Vec::new();
            if let Some(pending) = self.pending.lock().expect("debounce lock poisoned").take() {
                handles.push(pending.handle);
            }
            handles.append(&mut self.draining.lock().expect("debounce lock poisoned"));

            if handles.is_empty() {
                return;
            }
            for handle in handles {
                // Aborted tasks report a cancellation error; irrelevant here.
                let _ = handle.await;
            }
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.get_mut().expect("debounce lock poisoned").take() {
            pending.handle.abort();
        }
        for handle in self
            .draining
            .get_mut()
            .expect("debounce lock poisoned")
            .drain(..)
        {
            handle.abort();
        }
    }
}

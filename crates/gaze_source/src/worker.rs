//! Producer thread bookkeeping shared by all sources.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{GazeCallback, GazeSample};
use tracing::{debug, error, warn};

type FaultSlot = Arc<Mutex<Option<String>>>;

/// Streaming flag, fault slot and join handle of one producer
#[derive(Debug, Default)]
pub(crate) struct Producer {
    streaming: Arc<AtomicBool>,
    fault: FaultSlot,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Producer {
    /// Spawn `body` unless already streaming; returns false when it was
    pub(crate) fn start<F>(&self, name: &str, body: F) -> bool
    where
        F: FnOnce(ProducerContext) + Send + 'static,
    {
        if self.streaming.swap(true, Ordering::SeqCst) {
            return false;
        }
        *self.fault.lock().unwrap_or_else(PoisonError::into_inner) = None;

        let ctx = ProducerContext {
            source: name.to_string(),
            streaming: Arc::clone(&self.streaming),
            fault: Arc::clone(&self.fault),
        };
        let spawned = thread::Builder::new()
            .name(format!("gaze-{name}"))
            .spawn(move || body(ctx));

        match spawned {
            Ok(handle) => {
                *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                true
            }
            Err(e) => {
                error!(source = name, error = %e, "Failed to spawn producer thread");
                *self.fault.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(format!("failed to spawn producer thread: {e}"));
                self.streaming.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Signal the thread to stop and wait up to `timeout` for it to exit
    pub(crate) fn stop(&self, name: &str, timeout: Duration) -> bool {
        self.streaming.store(false, Ordering::SeqCst);
        let Some(handle) = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return true;
        };

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    source = name,
                    timeout_ms = timeout.as_millis() as u64,
                    "Producer did not stop in time; continuing without it"
                );
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        if handle.join().is_err() {
            self.set_fault("producer thread panicked");
        }
        debug!(source = name, "Producer joined");
        true
    }

    pub(crate) fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    pub(crate) fn fault(&self) -> Option<String> {
        self.fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_fault(&self, message: &str) {
        *self.fault.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
    }
}

/// Handed to the producer thread body
pub(crate) struct ProducerContext {
    source: String,
    streaming: Arc<AtomicBool>,
    fault: FaultSlot,
}

impl ProducerContext {
    #[inline]
    pub(crate) fn running(&self) -> bool {
        self.streaming.load(Ordering::Relaxed)
    }

    /// Record `message` as the fault and stop streaming
    pub(crate) fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        error!(source = %self.source, error = %message, "Producer failed; stopping");
        *self.fault.lock().unwrap_or_else(PoisonError::into_inner) = Some(message);
        self.streaming.store(false, Ordering::SeqCst);
    }

    /// Invoke the callback; a panic inside it stops the producer
    pub(crate) fn deliver(&self, callback: &GazeCallback, sample: GazeSample) -> bool {
        match panic::catch_unwind(AssertUnwindSafe(|| callback(sample))) {
            Ok(()) => true,
            Err(_) => {
                self.fail("gaze callback panicked");
                false
            }
        }
    }

    /// Mark the producer as no longer streaming
    pub(crate) fn finish(&self) {
        self.streaming.store(false, Ordering::SeqCst);
        debug!(source = %self.source, "Producer stopped");
    }
}

/// Sleep until `deadline`, returning immediately if it already passed
pub(crate) fn sleep_until(deadline: Instant) {
    let now = Instant::now();
    if deadline > now {
        thread::sleep(deadline - now);
    }
}

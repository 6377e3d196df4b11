//! Shared producer/consumer buffer.

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use contracts::{ContractError, Event, GazePair, GazeSample};
use observability::{metrics, warnings};
use tracing::{debug, trace};

use crate::RollingBuffer;

#[derive(Debug, Default)]
struct BufferState {
    samples: Vec<GazeSample>,
    events: Vec<Event>,
    rolling: Option<RollingBuffer>,
}

/// Contents handed to the consumer by [`SampleBuffer::drain`]
#[derive(Debug, Default)]
pub struct Drained {
    pub samples: Vec<GazeSample>,
    pub events: Vec<Event>,
}

impl Drained {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() && self.events.is_empty()
    }
}

/// Outcome of [`SampleBuffer::wait_for_catch_up`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchUp {
    /// Last event is at or before the last sample (or there are no events)
    Ready,
    /// Gave up waiting; the last event has no sample after it yet
    TimedOut,
}

/// Live gaze samples, events and rolling window behind one lock
///
/// Samples are accepted only while the buffer is active; the owning session
/// flips the flag when recording starts and stops.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    state: Mutex<BufferState>,
    active: AtomicBool,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    // The producer must never panic on a poisoned lock
    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn activate(&self) {
        self.active.store(true, Ordering::Release);
    }

    /// Stop accepting samples and events
    ///
    /// Taken under the buffer lock: once this returns, no append that saw
    /// the buffer active is still in flight, so a following drain holds
    /// everything that was accepted.
    pub fn deactivate(&self) {
        let _state = self.lock();
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Producer side: append one sample
    ///
    /// Returns false when the sample was discarded because the buffer is not
    /// active.
    #[inline]
    pub fn append_sample(&self, sample: GazeSample) -> bool {
        let pair = sample.gaze_pair();
        let mut state = self.lock();
        if !self.is_active() {
            return false;
        }
        if let Some(rolling) = state.rolling.as_mut() {
            rolling.push(pair);
        }
        state.samples.push(sample);
        true
    }

    /// Foreground side: append an event stamped in the sample clock domain
    pub fn append_event(
        &self,
        label: impl Into<String>,
        system_time_stamp: i64,
    ) -> Result<(), ContractError> {
        let event = Event::new(system_time_stamp, label);
        let mut state = self.lock();
        if !self.is_active() {
            return Err(ContractError::not_recording("record_event"));
        }
        trace!(label = %event.label, ts = system_time_stamp, "Event buffered");
        state.events.push(event);
        Ok(())
    }

    /// Swap out the live sequences and return them
    pub fn drain(&self) -> Drained {
        let drained = {
            let mut state = self.lock();
            Drained {
                samples: mem::take(&mut state.samples),
                events: mem::take(&mut state.events),
            }
        };
        metrics::record_drain(drained.samples.len(), drained.events.len());
        metrics::record_buffer_depth(0);
        debug!(
            samples = drained.samples.len(),
            events = drained.events.len(),
            "Buffer drained"
        );
        drained
    }

    /// Put a drained batch back in front of anything buffered since
    ///
    /// Used when a batch could not be persisted; accepted even while the
    /// buffer is inactive so a failed final flush keeps its data.
    pub fn restore(&self, batch: Drained) {
        if batch.is_empty() {
            return;
        }
        let (samples, events) = (batch.samples.len(), batch.events.len());
        let depth = {
            let mut state = self.lock();
            let newer = mem::replace(&mut state.samples, batch.samples);
            state.samples.extend(newer);
            let newer = mem::replace(&mut state.events, batch.events);
            state.events.extend(newer);
            state.samples.len()
        };
        metrics::record_buffer_depth(depth);
        debug!(samples, events, depth, "Unsaved batch returned to buffer");
    }

    /// Consistent oldest-first copy of the rolling window
    pub fn read_rolling_snapshot(&self) -> Result<Vec<GazePair>, ContractError> {
        match self.lock().rolling.as_ref() {
            Some(rolling) => Ok(rolling.snapshot()),
            None => Err(ContractError::NotConfigured {
                what: "rolling gaze buffer".to_string(),
                remedy: "configure a rolling window before querying gaze position".to_string(),
            }),
        }
    }

    /// Install a rolling window of `capacity` samples
    ///
    /// Returns false, with a usage warning, when one is already configured.
    pub fn configure_rolling(&self, capacity: usize) -> Result<bool, ContractError> {
        let rolling = RollingBuffer::new(capacity)?;
        let mut state = self.lock();
        if let Some(existing) = state.rolling.as_ref() {
            let current = existing.capacity();
            drop(state);
            warnings::usage(
                "configure_rolling",
                format!("rolling buffer already configured with {current} samples; keeping it"),
            );
            return Ok(false);
        }
        state.rolling = Some(rolling);
        debug!(capacity, "Rolling buffer configured");
        Ok(true)
    }

    pub fn rolling_capacity(&self) -> Option<usize> {
        self.lock().rolling.as_ref().map(RollingBuffer::capacity)
    }

    /// Drop all buffered data; a configured rolling window stays configured
    pub fn reset(&self) {
        let mut state = self.lock();
        state.samples.clear();
        state.events.clear();
        if let Some(rolling) = state.rolling.as_mut() {
            rolling.clear();
        }
    }

    /// Buffered (samples, events)
    pub fn len(&self) -> (usize, usize) {
        let state = self.lock();
        (state.samples.len(), state.events.len())
    }

    pub fn is_empty(&self) -> bool {
        let state = self.lock();
        state.samples.is_empty() && state.events.is_empty()
    }

    /// Timestamps of the last buffered sample and event
    pub fn tail_timestamps(&self) -> (Option<i64>, Option<i64>) {
        let state = self.lock();
        (
            state.samples.last().map(|s| s.system_time_stamp),
            state.events.last().map(|e| e.system_time_stamp),
        )
    }

    /// Wait until the last buffered event has a sample at or after it
    ///
    /// Polls every `interval` and sleeps in between so the producer keeps
    /// running; gives up after `timeout`.
    pub fn wait_for_catch_up(&self, interval: Duration, timeout: Duration) -> CatchUp {
        let started = Instant::now();
        loop {
            match self.tail_timestamps() {
                (_, None) => return CatchUp::Ready,
                (Some(sample), Some(event)) if event <= sample => return CatchUp::Ready,
                _ => {}
            }
            if started.elapsed() >= timeout {
                return CatchUp::TimedOut;
            }
            thread::sleep(interval);
        }
    }
}

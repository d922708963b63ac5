// src/sampling.rs
//! Sampling stream with fixed-window averaging
//!
//! The device reports PD/switch readings in bursts on a native-owned thread.
//! A consumer thread owned by the [`SamplingHandle`] drains the bridge
//! channel, feeds a fixed-capacity averaging window, and emits one mean per
//! full window. This keeps all mutable accumulator state on a single thread
//! instead of behind a shared global.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver};
use tracing::{debug, info};

use crate::bridge::{self, RawSamplingEvent};
use crate::error::AecgResult;
use crate::ffi::library::NativeApi;

/// Default number of readings averaged into one emitted value.
pub const DEFAULT_SAMPLING_WINDOW: usize = 1000;

/// Caller-visible sampling notifications.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingEvent {
    /// Mean of one full averaging window.
    Average(f64),
    /// Error code reported asynchronously by the device.
    Error(i32),
}

/// Fixed-capacity streaming average: accumulates readings, emits one mean
/// per full window, then clears. The remainder of a burst stays buffered.
#[derive(Debug)]
pub struct AveragingWindow {
    capacity: usize,
    sum: f64,
    len: usize,
}

impl AveragingWindow {
    /// Create a window that averages `capacity` readings at a time.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            capacity,
            sum: 0.0,
            len: 0,
        }
    }

    /// Feed `count` repeats of `value`; returns the averages completed by
    /// this burst, in order.
    pub fn push(&mut self, value: f64, mut count: usize) -> Vec<f64> {
        let mut emitted = Vec::new();
        while count > 0 {
            let take = count.min(self.capacity - self.len);
            self.sum += value * take as f64;
            self.len += take;
            count -= take;

            if self.len == self.capacity {
                emitted.push(self.sum / self.capacity as f64);
                self.sum = 0.0;
                self.len = 0;
            }
        }
        emitted
    }

    /// Readings currently buffered, waiting for the window to fill.
    pub fn buffered(&self) -> usize {
        self.len
    }
}

impl Default for AveragingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLING_WINDOW)
    }
}

/// Handle to an active sampling stream.
///
/// Dropping the handle stops sampling on the device and joins the consumer
/// thread. Events are read from [`SamplingHandle::events`].
pub struct SamplingHandle {
    api: Arc<dyn NativeApi>,
    events: Receiver<SamplingEvent>,
    worker: Option<JoinHandle<()>>,
    stopped: bool,
}

impl SamplingHandle {
    /// Spawn the consumer thread over an armed bridge receiver.
    pub(crate) fn spawn(
        api: Arc<dyn NativeApi>,
        raw: Receiver<RawSamplingEvent>,
        window_capacity: usize,
    ) -> AecgResult<Self> {
        let (tx, events) = bounded(64);
        let worker = thread::Builder::new()
            .name("aecg100-sampling".into())
            .spawn(move || {
                let mut window = AveragingWindow::new(window_capacity);
                // Exits when the bridge slot is cleared or the caller drops
                // the event receiver.
                for event in raw.iter() {
                    let forwarded = match event {
                        RawSamplingEvent::Data { value, count } => {
                            let count = usize::try_from(count).unwrap_or(0);
                            window
                                .push(f64::from(value), count)
                                .into_iter()
                                .map(SamplingEvent::Average)
                                .try_for_each(|avg| tx.send(avg))
                        }
                        RawSamplingEvent::Error(code) => {
                            debug!(code, "device reported sampling error");
                            tx.send(SamplingEvent::Error(code))
                        }
                    };
                    if forwarded.is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            api,
            events,
            worker: Some(worker),
            stopped: false,
        })
    }

    /// Receiver of averaged readings and asynchronous device errors.
    pub fn events(&self) -> &Receiver<SamplingEvent> {
        &self.events
    }

    /// Stop sampling on the device and shut down the consumer thread.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.api.disable_sampling();
        bridge::clear_sampling();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        info!("sampling stopped");
    }
}

impl Drop for SamplingHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for SamplingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplingHandle")
            .field("stopped", &self.stopped)
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_full_window_emits_single_average() {
        let mut window = AveragingWindow::new(1000);
        let mut emitted = Vec::new();
        for _ in 0..1000 {
            emitted.extend(window.push(5.0, 1));
        }
        assert_eq!(emitted, vec![5.0]);
        assert_eq!(window.buffered(), 0);
    }

    #[test]
    fn test_overfull_stream_emits_per_window_and_keeps_remainder() {
        let mut window = AveragingWindow::new(1000);
        let emitted = window.push(3.0, 2500);
        assert_eq!(emitted, vec![3.0, 3.0]);
        assert_eq!(window.buffered(), 500);
    }

    #[test]
    fn test_partial_window_emits_nothing() {
        let mut window = AveragingWindow::new(1000);
        assert!(window.push(1.0, 999).is_empty());
        assert_eq!(window.buffered(), 999);
    }

    #[test]
    fn test_mixed_values_average() {
        let mut window = AveragingWindow::new(4);
        assert!(window.push(1.0, 2).is_empty());
        let emitted = window.push(3.0, 2);
        assert_eq!(emitted, vec![2.0]);
    }

    proptest! {
        // A constant stream must average to the constant no matter how the
        // bursts are chunked.
        #[test]
        fn prop_constant_stream_averages_to_constant(
            value in -1000i32..1000,
            chunks in proptest::collection::vec(1usize..400, 1..64),
        ) {
            let mut window = AveragingWindow::new(100);
            for chunk in chunks {
                for avg in window.push(f64::from(value), chunk) {
                    prop_assert!((avg - f64::from(value)).abs() < 1e-9);
                }
            }
        }
    }
}

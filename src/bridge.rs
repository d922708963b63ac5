// src/bridge.rs
//! Native-to-managed callback handoff
//!
//! The vendor ABI takes bare function pointers with no user-data argument, so
//! the trampolines here are process-global, matching the one-session-per-
//! device design. Each trampoline only performs a non-blocking send into a
//! bounded channel; the native thread is never parked and never touches
//! client state directly. Consumers register a sender before the native call
//! that arms the callback and clear it when done.

use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::debug;

/// Raw sampling notifications as delivered by the native thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum RawSamplingEvent {
    /// `value` repeated `count` times.
    Data {
        /// Sampled reading.
        value: i32,
        /// Repeat count reported by the device.
        count: i32,
    },
    /// Asynchronous device error code.
    Error(i32),
}

static CONNECTION_SLOT: Mutex<Option<Sender<bool>>> = Mutex::new(None);
static SAMPLING_SLOT: Mutex<Option<Sender<RawSamplingEvent>>> = Mutex::new(None);

/// Arm the connection slot for one connect attempt and hand back the
/// receiving side. Replaces any stale registration.
pub(crate) fn register_connection() -> Receiver<bool> {
    // Capacity 2: one connect result plus a possible trailing disconnect
    // notification; anything further is dropped by try_send.
    let (tx, rx) = bounded(2);
    *CONNECTION_SLOT.lock() = Some(tx);
    rx
}

/// Disarm the connection slot.
pub(crate) fn clear_connection() {
    CONNECTION_SLOT.lock().take();
}

/// Connection trampoline handed to the native init entry point.
pub(crate) extern "C" fn connection_trampoline(connected: bool) {
    match CONNECTION_SLOT.lock().as_ref() {
        Some(tx) => {
            if tx.try_send(connected).is_err() {
                debug!(connected, "connection event dropped, slot full or closed");
            }
        }
        None => debug!(connected, "connection event with no registered session"),
    }
}

/// Arm the sampling slot. Returns `None` when sampling is already active.
pub(crate) fn register_sampling() -> Option<Receiver<RawSamplingEvent>> {
    let mut slot = SAMPLING_SLOT.lock();
    if slot.is_some() {
        return None;
    }
    // Enough headroom for a bursty native cadence; the consumer thread
    // drains continuously.
    let (tx, rx) = bounded(1024);
    *slot = Some(tx);
    Some(rx)
}

/// Disarm the sampling slot, disconnecting the consumer thread.
pub(crate) fn clear_sampling() {
    SAMPLING_SLOT.lock().take();
}

/// Sampling-data trampoline handed to the native enable-sampling entry point.
pub(crate) extern "C" fn sampling_trampoline(data: i32, number: i32) {
    if let Some(tx) = SAMPLING_SLOT.lock().as_ref() {
        if tx
            .try_send(RawSamplingEvent::Data {
                value: data,
                count: number,
            })
            .is_err()
        {
            debug!(data, number, "sampling event dropped, consumer lagging");
        }
    }
}

/// Sampling-error trampoline handed to the native start-sampling entry point.
pub(crate) extern "C" fn sampling_error_trampoline(error: i32) {
    if let Some(tx) = SAMPLING_SLOT.lock().as_ref() {
        if tx.try_send(RawSamplingEvent::Error(error)).is_err() {
            debug!(error, "sampling error dropped, consumer lagging");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_connection_trampoline_delivers_once_armed() {
        let rx = register_connection();
        connection_trampoline(true);
        assert_eq!(rx.recv().unwrap(), true);
        clear_connection();
    }

    #[test]
    #[serial]
    fn test_connection_trampoline_without_registration_is_harmless() {
        clear_connection();
        connection_trampoline(false);
    }

    #[test]
    #[serial]
    fn test_sampling_slot_is_exclusive() {
        let rx = register_sampling().expect("slot should be free");
        assert!(register_sampling().is_none());

        sampling_trampoline(7, 3);
        sampling_error_trampoline(-2);
        assert_eq!(
            rx.recv().unwrap(),
            RawSamplingEvent::Data { value: 7, count: 3 }
        );
        assert_eq!(rx.recv().unwrap(), RawSamplingEvent::Error(-2));

        clear_sampling();
        assert!(register_sampling().is_some());
        clear_sampling();
    }
}

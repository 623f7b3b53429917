//! State shared between the USB request handler and the poll loop.
//!
//! The USB task answers control requests (GET_REPORT, SET_REPORT) from the
//! host while the poll task owns the translator. Everything the two sides
//! exchange lives here: the LED mailbox, the last keyboard report that went
//! out, a flag recording that the host asked for it, and whether the host
//! has suspended the bus.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::hid::keyboard::KeyboardReport;
use crate::led::LedBridge;

pub struct HostLink {
    /// LED updates from the host.
    pub leds: LedBridge,
    snapshot: Mutex<CriticalSectionRawMutex, Cell<KeyboardReport>>,
    report_queried: AtomicBool,
    suspended: AtomicBool,
}

impl HostLink {
    pub const fn new() -> Self {
        Self {
            leds: LedBridge::new(),
            snapshot: Mutex::new(Cell::new(KeyboardReport::empty())),
            report_queried: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
        }
    }

    /// Record the keyboard report that was just sent.
    pub fn publish(&self, report: &KeyboardReport) {
        self.snapshot.lock(|cell| cell.set(*report));
    }

    /// Last published keyboard report.
    pub fn snapshot(&self) -> KeyboardReport {
        self.snapshot.lock(Cell::get)
    }

    /// Answer a host GET_REPORT for the keyboard. Returns bytes written.
    pub fn answer_get_report(&self, buf: &mut [u8]) -> usize {
        let written = self.snapshot().serialize(buf);
        if written > 0 {
            self.report_queried.store(true, Ordering::Release);
        }
        written
    }

    /// Record a USB suspend (`true`) or resume (`false`).
    pub fn set_host_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::Release);
    }

    /// While suspended the IN endpoint is never drained, so reports are
    /// not sent at all.
    pub fn host_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    /// Has the host read the keyboard report since the last call?
    pub fn take_report_query(&self) -> bool {
        self.report_queried.swap(false, Ordering::Acquire)
    }
}

impl Default for HostLink {
    fn default() -> Self {
        Self::new()
    }
}

//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and behaviour
//! switches live here so they can be tuned in one place.

use crate::keymap::KeyLayout;

// ADB

/// Core clock of the nRF52840 (MHz). Used to turn bus delays into
/// busy-wait cycle counts.
pub const CPU_CYCLES_PER_US: u32 = 64;

/// Cycles spent per polling iteration outside the delay itself
/// (GPIO read, compare, countdown). Subtracted from each tick so one
/// tick stays close to 1 µs.
pub const TICK_OVERHEAD_CYCLES: u32 = 14;

/// Quiet time after the bus reset pulse before the first command.
pub const ADB_RESET_RECOVERY_MS: u64 = 50;

/// Key layout selected at build time.
///
/// With `swap-capslock-rctrl` the capslock latch has been moved to the
/// right-control position, so the two table entries trade places and
/// capslock is reported like any other key.
pub const KEY_LAYOUT: KeyLayout = if cfg!(feature = "swap-capslock-rctrl") {
    KeyLayout::CapsOnRightControl
} else {
    KeyLayout::Stock
};

/// Clear the modifier mask and first key slot after the host reads the
/// keyboard report over the control pipe. Only needed for hosts that rely
/// on that behaviour; off unless `get-report-clears-keys` is enabled.
pub const GET_REPORT_CLEARS_KEYS: bool = cfg!(feature = "get-report-clears-keys");

// USB

/// USB VID/PID - use the "pid.codes" open-source test VID.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0002;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "adb2usb";
pub const USB_PRODUCT: &str = "ADB-to-USB HID Bridge";
pub const USB_SERIAL_NUMBER: &str = "000001";

/// USB HID polling interval (ms).
pub const USB_HID_POLL_MS: u8 = 10;

/// Longest a report may wait for the IN endpoint before it is dropped.
/// Covers an unenumerated device and a suspend that lands mid-write; must
/// stay well under the watchdog timeout.
pub const USB_WRITE_TIMEOUT_MS: u64 = 100;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   ADB data       → P0.29 (open-drain, external 1 kΩ pull-up to 5 V
//                           through a level shifter)

// Watchdog

/// Watchdog timeout in 32.768 kHz ticks. 2 s is far longer than any bus
/// transaction, so only a wedged main loop trips it.
pub const WATCHDOG_TIMEOUT_TICKS: u32 = 32_768 * 2;

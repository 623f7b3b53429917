//! adb2usb - Apple Desktop Bus keyboard/mouse to USB HID bridge.
//!
//! Everything except the hardware glue lives in this library so it can be
//! tested on the host:
//!
//! - **adb**: bus commands, the bit-level transceiver and a scripted line
//! - **keymap**: ADB scan code → USB usage tables
//! - **hid**: USB report types and the composite report descriptor
//! - **translator**: keyboard state and mouse decode
//! - **led** / **host**: state shared with the USB control pipe
//! - **emitter** / **scheduler**: the poll cycle and its report sink
//!
//! Usage: `cargo test --lib` (host), `cargo run --release --features embedded`
//! (target).
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main].

#![cfg_attr(not(test), no_std)]

pub mod adb;
pub mod config;
pub mod emitter;
pub mod error;
pub mod hid;
pub mod host;
pub mod keymap;
pub mod led;
pub mod scheduler;
pub mod translator;

pub use error::{BusError, Error};

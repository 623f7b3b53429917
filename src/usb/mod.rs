//! USB Device subsystem - presents the bridge to the host.
//!
//! The nRF52840's built-in USB 2.0 Full-Speed controller is driven by
//! `embassy-usb`. A single HID interface carries both devices, told apart
//! by report ID:
//!
//! - Report 1: Keyboard (input) and its LEDs (output)
//! - Report 2: Mouse (input)
//!
//! The poll loop writes reports through [`hid_device::UsbReportEmitter`];
//! control requests and LED output reports land in the shared
//! [`HostLink`](adb2usb::host::HostLink).

pub mod hid_device;

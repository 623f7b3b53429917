//! Report emitter - the seam between the poll loop and the USB transport.
//!
//! The embedded binary implements [`ReportSink`] on top of an `embassy-usb`
//! HID writer; tests implement it with a recording vector. Reports are
//! passed by value, so the poll loop is free to mutate its own keyboard
//! state as soon as `send` returns.

use crate::error::Error;
use crate::hid::HidReport;

/// Destination for outgoing HID reports.
#[allow(async_fn_in_trait)]
pub trait ReportSink {
    /// Wait until the transport can take a report, hand `report` over, and
    /// return once the transport is done with it.
    async fn send(&mut self, report: &HidReport) -> Result<(), Error>;
}

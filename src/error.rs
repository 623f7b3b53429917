//! Unified error type for adb2usb.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // ADB
    /// A bus transaction produced no data.
    Bus(BusError),
    /// The keyboard kept a handler other than the extended one.
    Handler(u8),

    // USB
    /// USB stack refused or dropped a report.
    Usb,
}

/// Where a bus transaction gave up waiting on the line.
///
/// None of these are faults: an absent or idle peripheral simply does not
/// answer, and the next poll cycle tries again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// No start sequence within the initial wait.
    StartTimeout,
    /// A bit cell (0..16) did not complete within its window.
    BitTimeout(u8),
}

// Convenience conversions

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Error::Bus(e)
    }
}

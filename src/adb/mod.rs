//! Apple Desktop Bus host.
//!
//! ADB is a single-wire, open-drain, host-polled bus. Every transaction
//! starts with the host pulling the line low for an attention period,
//! followed by a one-byte command:
//!
//! ```text
//! bit 7..4  device address (keyboard = 2, mouse = 3)
//! bit 3..2  command (00 reset/flush family, 10 Listen, 11 Talk)
//! bit 1..0  register
//! ```
//!
//! A Talk is answered by the addressed device with a start bit, a 16-bit
//! register value and a stop bit. A Listen carries the same framing from
//! the host side. Any device with pending data may extend the end of a
//! transaction to raise a Service Request (SRQ).
//!
//! ## Modules
//!
//! - **line**: the signaling primitive (one GPIO, microsecond delays)
//! - **transceiver**: command framing and word decode
//! - **sim**: a scripted line for host-side testing (feature `sim`)

pub mod line;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod transceiver;

pub use line::BusLine;
pub use transceiver::{Response, Transceiver};

/// Register 0 holds pending key transitions (keyboard) or motion (mouse).
pub const DATA_REGISTER: u8 = 0;

/// Register 2 on the keyboard holds the LED state in its low 3 bits.
pub const LED_REGISTER: u8 = 2;

/// Register 3 holds the device address and handler ID.
pub const CONFIG_REGISTER: u8 = 3;

/// Register 3 value selecting the extended keyboard handler (ID 3), which
/// reports left and right modifiers with distinct scan codes.
pub const EXTENDED_KEYBOARD_HANDLER: [u8; 2] = [0x02, EXTENDED_HANDLER_ID];

/// Handler ID of the extended keyboard protocol.
pub const EXTENDED_HANDLER_ID: u8 = 0x03;

/// Handler ID field (low byte) of a register 3 value.
pub const fn handler_id(reg3: u16) -> u8 {
    reg3 as u8
}

/// The two logical device addresses this bridge polls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Address {
    Keyboard = 2,
    Mouse = 3,
}

impl Address {
    /// The other polled address.
    pub const fn other(self) -> Self {
        match self {
            Address::Keyboard => Address::Mouse,
            Address::Mouse => Address::Keyboard,
        }
    }
}

/// One ADB command byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Clear the device's pending data.
    Flush(Address),
    /// Write a register.
    Listen(Address, u8),
    /// Read a register.
    Talk(Address, u8),
}

impl Command {
    /// Encode into the wire byte.
    pub const fn to_byte(self) -> u8 {
        match self {
            Command::Flush(addr) => ((addr as u8) << 4) | 0b0001,
            Command::Listen(addr, reg) => ((addr as u8) << 4) | 0b1000 | (reg & 0x03),
            Command::Talk(addr, reg) => ((addr as u8) << 4) | 0b1100 | (reg & 0x03),
        }
    }
}

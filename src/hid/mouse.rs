//! USB HID mouse report.
//!
//! Layout (4 bytes, report ID 2):
//! ```text
//! Byte 0: Report ID (0x02)
//! Byte 1: Button bitfield (bit 0 = button 1)
//! Byte 2: X displacement (signed)
//! Byte 3: Y displacement (signed)
//! ```
//!
//! ADB mouse register 0:
//! ```text
//! bit 15     button, 0 = pressed
//! bit 14..8  Y delta, 7-bit two's complement
//! bit 7      second button (unused)
//! bit 6..0   X delta, 7-bit two's complement
//! ```

/// Report ID of the mouse input report.
pub const MOUSE_REPORT_ID: u8 = 2;

/// Mouse report size in bytes, including the report ID.
pub const MOUSE_REPORT_SIZE: usize = 4;

/// Button 1 in the button bitfield.
pub const BUTTON_1: u8 = 0x01;

/// USB HID relative mouse report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    /// Button bitfield (bit 0 = button 1).
    pub buttons: u8,
    /// Relative X movement (signed).
    pub x: i8,
    /// Relative Y movement (signed).
    pub y: i8,
}

impl MouseReport {
    /// Decode an ADB mouse register 0 word. Each word fully determines the
    /// report; nothing carries over between polls.
    pub const fn from_adb_word(word: u16) -> Self {
        Self {
            buttons: if word & 0x8000 == 0 { BUTTON_1 } else { 0 },
            x: sign_extend_7(word as u8),
            y: sign_extend_7((word >> 8) as u8),
        }
    }

    /// Serialise into a byte slice for USB HID transmission, report ID
    /// first. Returns the number of bytes written (always 4), or 0 if the
    /// buffer is too small.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < MOUSE_REPORT_SIZE {
            return 0;
        }
        buf[0] = MOUSE_REPORT_ID;
        buf[1] = self.buttons;
        buf[2] = self.x as u8;
        buf[3] = self.y as u8;
        MOUSE_REPORT_SIZE
    }
}

/// Bit 6 is the sign of a 7-bit field; copy it into bit 7.
const fn sign_extend_7(raw: u8) -> i8 {
    ((raw << 1) as i8) >> 1
}

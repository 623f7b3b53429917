//! USB HID keyboard report.
//!
//! Layout (8 bytes, report ID 1):
//! ```text
//! Byte 0: Report ID (0x01)
//! Byte 1: Modifier keys (bitfield)
//!         Bit 0 = Left Ctrl,  Bit 1 = Left Shift,
//!         Bit 2 = Left Alt,   Bit 3 = Left GUI,
//!         Bit 4 = Right Ctrl, Bit 5 = Right Shift,
//!         Bit 6 = Right Alt,  Bit 7 = Right GUI
//! Byte 2: Reserved (0x00)
//! Byte 3-7: Up to 5 simultaneous key codes (USB HID usage codes)
//! ```
//!
//! The key buffer is kept front-packed: occupied slots are contiguous from
//! index 0, every slot after the first 0 is 0, and no usage appears twice.

/// Report ID of the keyboard input report (and its LED output report).
pub const KEYBOARD_REPORT_ID: u8 = 1;

/// Number of simultaneously reported non-modifier keys.
pub const KEY_SLOTS: usize = 5;

/// Keyboard report size in bytes, including the report ID.
pub const KEYBOARD_REPORT_SIZE: usize = 3 + KEY_SLOTS;

/// USB HID keyboard usages referenced by name.
pub mod usage {
    pub const NONE: u8 = 0x00;
    pub const A: u8 = 0x04;
    pub const CAPS_LOCK: u8 = 0x39;
    pub const LEFT_CONTROL: u8 = 0xE0;
    pub const LEFT_SHIFT: u8 = 0xE1;
    pub const LEFT_ALT: u8 = 0xE2;
    pub const LEFT_GUI: u8 = 0xE3;
    pub const RIGHT_CONTROL: u8 = 0xE4;
    pub const RIGHT_SHIFT: u8 = 0xE5;
    pub const RIGHT_ALT: u8 = 0xE6;
    pub const RIGHT_GUI: u8 = 0xE7;
}

/// Modifier bit for a usage in the 0xE0..=0xE7 range.
pub const fn modifier_bit(code: u8) -> Option<u8> {
    if code >= usage::LEFT_CONTROL && code <= usage::RIGHT_GUI {
        Some(1 << (code - usage::LEFT_CONTROL))
    } else {
        None
    }
}

/// Keyboard state as reported to the host.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    /// Modifier key bitfield.
    pub modifier: u8,
    /// Reserved byte (always 0x00).
    pub reserved: u8,
    /// Currently held keys, front-packed, 0 = empty.
    pub keycodes: [u8; KEY_SLOTS],
}

impl KeyboardReport {
    /// Create an empty (all-keys-released) report.
    pub const fn empty() -> Self {
        Self {
            modifier: 0,
            reserved: 0,
            keycodes: [0; KEY_SLOTS],
        }
    }

    /// Register a key going down.
    ///
    /// Returns `false` only when the key had to be dropped because every
    /// slot is taken; existing keys are never displaced.
    pub fn press(&mut self, code: u8) -> bool {
        if let Some(bit) = modifier_bit(code) {
            self.modifier |= bit;
            return true;
        }
        if self.contains(code) {
            return true;
        }
        let slot = self.held_keys();
        if slot == KEY_SLOTS {
            return false;
        }
        self.keycodes[slot] = code;
        true
    }

    /// Register a key going up. Unknown keys are ignored.
    pub fn release(&mut self, code: u8) {
        if let Some(bit) = modifier_bit(code) {
            self.modifier &= !bit;
            return;
        }
        if code == usage::NONE {
            return;
        }
        if let Some(slot) = self.keycodes.iter().position(|&k| k == code) {
            self.keycodes.copy_within(slot + 1.., slot);
            self.keycodes[KEY_SLOTS - 1] = usage::NONE;
        }
    }

    /// Is a non-modifier usage currently held?
    pub fn contains(&self, code: u8) -> bool {
        code != usage::NONE && self.keycodes.contains(&code)
    }

    /// Number of occupied key slots.
    pub fn held_keys(&self) -> usize {
        self.keycodes.iter().take_while(|&&k| k != usage::NONE).count()
    }

    /// Returns `true` if no keys are pressed (release event).
    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|&k| k == 0)
    }

    /// Serialise into a byte slice for USB HID transmission, report ID
    /// first. Returns the number of bytes written (always 8), or 0 if the
    /// buffer is too small.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < KEYBOARD_REPORT_SIZE {
            return 0;
        }
        buf[0] = KEYBOARD_REPORT_ID;
        buf[1] = self.modifier;
        buf[2] = self.reserved;
        buf[3..KEYBOARD_REPORT_SIZE].copy_from_slice(&self.keycodes);
        KEYBOARD_REPORT_SIZE
    }
}

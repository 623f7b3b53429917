//! ADB scan code → USB HID usage translation.
//!
//! Covers the Apple Extended Keyboard (handler 3) code space 0x00..=0x7D.
//! Entries with no USB equivalent (Fn, power, unused codes) are 0 in the
//! table and come out of [`KeyLayout::translate`] as `None`.

use crate::hid::keyboard::usage;

/// Number of scan codes covered by the table.
pub const KEYMAP_LEN: usize = 0x7E;

/// ADB scan code of the capslock key.
pub const ADB_CAPS_LOCK: u8 = 0x39;
/// ADB scan code of the right control key (extended handler only).
pub const ADB_RIGHT_CONTROL: u8 = 0x7D;

const __: u8 = 0x00;

#[rustfmt::skip]
const STOCK: [u8; KEYMAP_LEN] = [
    // 0x00: A     S     D     F     H     G     Z     X
    0x04, 0x16, 0x07, 0x09, 0x0B, 0x0A, 0x1D, 0x1B,
    // 0x08: C     V     ISO§  B     Q     W     E     R
    0x06, 0x19, 0x64, 0x05, 0x14, 0x1A, 0x08, 0x15,
    // 0x10: Y     T     1     2     3     4     6     5
    0x1C, 0x17, 0x1E, 0x1F, 0x20, 0x21, 0x23, 0x22,
    // 0x18: =     9     7     -     8     0     ]     O
    0x2E, 0x26, 0x24, 0x2D, 0x25, 0x27, 0x30, 0x12,
    // 0x20: U     [     I     P     Ret   L     J     '
    0x18, 0x2F, 0x0C, 0x13, 0x28, 0x0F, 0x0D, 0x34,
    // 0x28: K     ;     \     ,     /     N     M     .
    0x0E, 0x33, 0x31, 0x36, 0x38, 0x11, 0x10, 0x37,
    // 0x30: Tab   Space `     BkSp  -     Esc   LCtl  Cmd
    0x2B, 0x2C, 0x35, 0x2A, __,   0x29, 0xE0, 0xE3,
    // 0x38: LSft  Caps  LOpt  Left  Right Down  Up    Fn
    0xE1, 0x39, 0xE2, 0x50, 0x4F, 0x51, 0x52, __,
    // 0x40: -     KP.   -     KP*   -     KP+   -     Clear
    __,   0x63, __,   0x55, __,   0x57, __,   0x53,
    // 0x48: -     -     -     KP/   KPEnt -     KP-   -
    __,   __,   __,   0x54, 0x58, __,   0x56, __,
    // 0x50: -     KP=   KP0   KP1   KP2   KP3   KP4   KP5
    __,   0x67, 0x62, 0x59, 0x5A, 0x5B, 0x5C, 0x5D,
    // 0x58: KP6   KP7   -     KP8   KP9   JIS¥  JIS_  KP,
    0x5E, 0x5F, __,   0x60, 0x61, 0x89, 0x87, 0x85,
    // 0x60: F5    F6    F7    F3    F8    F9    Eisu  F11
    0x3E, 0x3F, 0x40, 0x3C, 0x41, 0x42, 0x91, 0x44,
    // 0x68: Kana  F13   -     F14   -     F10   -     F12
    0x90, 0x46, __,   0x47, __,   0x43, __,   0x45,
    // 0x70: -     F15   Help  Home  PgUp  Del   F4    End
    __,   0x48, 0x49, 0x4A, 0x4B, 0x4C, 0x3D, 0x4D,
    // 0x78: F2    PgDn  F1    RSft  ROpt  RCtl
    0x3B, 0x4E, 0x3A, 0xE5, 0xE6, 0xE4,
];

const SWAPPED: [u8; KEYMAP_LEN] = swap_entries(STOCK, ADB_CAPS_LOCK, ADB_RIGHT_CONTROL);

const fn swap_entries(mut table: [u8; KEYMAP_LEN], a: u8, b: u8) -> [u8; KEYMAP_LEN] {
    let tmp = table[a as usize];
    table[a as usize] = table[b as usize];
    table[b as usize] = tmp;
    table
}

/// How capslock transitions are turned into USB events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CapsLockPolicy {
    /// The physical key latches: every ADB transition is one USB tap
    /// (press now, release right after the report is sent).
    Latching,
    /// Capslock behaves like any other key.
    Momentary,
}

/// Physical keyboard layout, fixed at build time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyLayout {
    /// Factory layout, latching capslock at its usual position.
    Stock,
    /// The capslock latch was moved to the right-control position; the
    /// old capslock position now acts as right control.
    CapsOnRightControl,
}

impl KeyLayout {
    pub const fn table(self) -> &'static [u8; KEYMAP_LEN] {
        match self {
            KeyLayout::Stock => &STOCK,
            KeyLayout::CapsOnRightControl => &SWAPPED,
        }
    }

    pub const fn caps_policy(self) -> CapsLockPolicy {
        match self {
            KeyLayout::Stock => CapsLockPolicy::Latching,
            KeyLayout::CapsOnRightControl => CapsLockPolicy::Momentary,
        }
    }

    /// USB usage for an ADB scan code, if it has one.
    pub fn translate(self, scan_code: u8) -> Option<u8> {
        self.table()
            .get(usize::from(scan_code))
            .copied()
            .filter(|&code| code != usage::NONE)
    }
}

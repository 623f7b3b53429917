//! ADB → USB device translation.
//!
//! Owns the live keyboard state and turns ADB register 0 words into
//! changes to it. An ADB keyboard reports up to two transitions per poll:
//!
//! ```text
//! bit 15     first key released (1) / pressed (0)
//! bit 14..8  first scan code
//! bit 7      second key released (1) / pressed (0)
//! bit 6..0   second scan code
//! ```
//!
//! An idle half reads 0xFF (scan code 0x7F, released), which falls outside
//! the keymap and is skipped.

use crate::hid::keyboard::{usage, KeyboardReport};
use crate::hid::mouse::MouseReport;
use crate::keymap::{CapsLockPolicy, KeyLayout};

/// One half of a keyboard register 0 word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyTransition {
    pub scan_code: u8,
    pub released: bool,
}

impl KeyTransition {
    const fn from_byte(byte: u8) -> Self {
        Self {
            scan_code: byte & 0x7F,
            released: byte & 0x80 != 0,
        }
    }

    /// Both transitions of a register 0 word, high byte first.
    pub const fn split(word: u16) -> [Self; 2] {
        [
            Self::from_byte((word >> 8) as u8),
            Self::from_byte(word as u8),
        ]
    }
}

/// Stateful ADB → USB translator.
pub struct Translator {
    layout: KeyLayout,
    keyboard: KeyboardReport,
}

impl Translator {
    pub const fn new(layout: KeyLayout) -> Self {
        Self {
            layout,
            keyboard: KeyboardReport::empty(),
        }
    }

    /// Current keyboard state.
    pub fn keyboard(&self) -> &KeyboardReport {
        &self.keyboard
    }

    /// Apply one transition. Unmapped scan codes are ignored.
    pub fn apply_transition(&mut self, transition: KeyTransition) {
        let Some(code) = self.layout.translate(transition.scan_code) else {
            return;
        };

        // A latching capslock reports its physical position; every change
        // of it is one tap on the USB side.
        let latched_caps = code == usage::CAPS_LOCK
            && self.layout.caps_policy() == CapsLockPolicy::Latching;

        if transition.released && !latched_caps {
            self.keyboard.release(code);
        } else if !self.keyboard.press(code) {
            #[cfg(feature = "defmt")]
            defmt::debug!("Key buffer full, dropping usage {=u8:#x}", code);
        }
    }

    /// Is a latching capslock tap waiting for its release?
    ///
    /// Checked after every transition, so two capslock changes in one word
    /// become two taps.
    pub fn caps_tap_pending(&self) -> bool {
        self.layout.caps_policy() == CapsLockPolicy::Latching
            && self.keyboard.contains(usage::CAPS_LOCK)
    }

    /// Finish a latching capslock tap.
    ///
    /// Call once the report carrying the capslock press has gone out (or
    /// failed to). Returns `true` if capslock was released and the keyboard
    /// report has to be sent again.
    pub fn release_latched_caps(&mut self) -> bool {
        if self.caps_tap_pending() {
            self.keyboard.release(usage::CAPS_LOCK);
            true
        } else {
            false
        }
    }

    /// Decode a mouse register 0 word.
    pub fn apply_mouse_word(&mut self, word: u16) -> MouseReport {
        MouseReport::from_adb_word(word)
    }

    /// Forget the modifier mask and the first held key.
    ///
    /// Some hosts read the keyboard report over the control pipe and expect
    /// this; see `config::GET_REPORT_CLEARS_KEYS`.
    ///
    /// Returns `false` if there was nothing to clear.
    pub fn clear_after_host_query(&mut self) -> bool {
        if self.keyboard.is_empty() {
            return false;
        }
        self.keyboard.modifier = 0;
        let first = self.keyboard.keycodes[0];
        self.keyboard.release(first);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::keyboard::KEY_SLOTS;

    const LSHIFT: u8 = 0x38;
    const A: u8 = 0x00;
    const S: u8 = 0x01;
    const CAPS: u8 = 0x39;

    fn down(code: u8) -> u8 {
        code
    }

    fn up(code: u8) -> u8 {
        code | 0x80
    }

    fn word(first: u8, second: u8) -> u16 {
        u16::from_be_bytes([first, second])
    }

    const IDLE: u8 = 0xFF;

    fn feed(t: &mut Translator, word: u16) {
        for transition in KeyTransition::split(word) {
            t.apply_transition(transition);
        }
    }

    #[test]
    fn split_reads_high_half_first() {
        let [first, second] = KeyTransition::split(0b1_0111000_0_0111000);
        assert_eq!(first, KeyTransition { scan_code: 0x38, released: true });
        assert_eq!(second, KeyTransition { scan_code: 0x38, released: false });
    }

    #[test]
    fn shift_word_sets_modifier_only() {
        let mut t = Translator::new(KeyLayout::Stock);
        feed(&mut t, 0b1_0111000_0_0111000);
        assert_eq!(t.keyboard().modifier, 0x02);
        assert_eq!(t.keyboard().keycodes, [0; KEY_SLOTS]);
    }

    #[test]
    fn two_keys_in_one_word() {
        let mut t = Translator::new(KeyLayout::Stock);
        feed(&mut t, word(down(A), down(S)));
        assert_eq!(t.keyboard().keycodes, [0x04, 0x16, 0, 0, 0]);

        feed(&mut t, word(up(A), IDLE));
        assert_eq!(t.keyboard().keycodes, [0x16, 0, 0, 0, 0]);
    }

    #[test]
    fn idle_word_changes_nothing() {
        let mut t = Translator::new(KeyLayout::Stock);
        feed(&mut t, word(down(A), IDLE));
        let before = *t.keyboard();
        feed(&mut t, 0xFFFF);
        feed(&mut t, 0x7F7F);
        assert_eq!(*t.keyboard(), before);
    }

    #[test]
    fn modifier_release_clears_bit() {
        let mut t = Translator::new(KeyLayout::Stock);
        feed(&mut t, word(down(LSHIFT), IDLE));
        feed(&mut t, word(up(LSHIFT), IDLE));
        assert!(t.keyboard().is_empty());
    }

    #[test]
    fn latching_caps_press_and_release_both_tap() {
        let mut t = Translator::new(KeyLayout::Stock);

        // Key latched down.
        feed(&mut t, word(down(CAPS), IDLE));
        assert!(t.keyboard().contains(usage::CAPS_LOCK));
        assert!(t.release_latched_caps());
        assert!(!t.keyboard().contains(usage::CAPS_LOCK));
        assert!(!t.release_latched_caps());

        // Key unlatched: still a press on the USB side.
        feed(&mut t, word(up(CAPS), IDLE));
        assert!(t.keyboard().contains(usage::CAPS_LOCK));
        assert!(t.release_latched_caps());
        assert!(t.keyboard().is_empty());
    }

    #[test]
    fn caps_tap_pending_only_for_latching_policy() {
        let mut latching = Translator::new(KeyLayout::Stock);
        latching.apply_transition(KeyTransition { scan_code: CAPS, released: true });
        assert!(latching.caps_tap_pending());

        let mut momentary = Translator::new(KeyLayout::CapsOnRightControl);
        momentary.apply_transition(KeyTransition { scan_code: 0x7D, released: false });
        assert!(!momentary.caps_tap_pending());
    }

    #[test]
    fn momentary_caps_follows_key() {
        let mut t = Translator::new(KeyLayout::CapsOnRightControl);
        // Right control position now carries capslock.
        feed(&mut t, word(down(0x7D), IDLE));
        assert!(t.keyboard().contains(usage::CAPS_LOCK));
        assert!(!t.release_latched_caps());
        assert!(t.keyboard().contains(usage::CAPS_LOCK));

        feed(&mut t, word(up(0x7D), IDLE));
        assert!(!t.keyboard().contains(usage::CAPS_LOCK));

        // Old capslock position is right control.
        feed(&mut t, word(down(CAPS), IDLE));
        assert_eq!(t.keyboard().modifier, 0x10);
    }

    #[test]
    fn overflow_keeps_first_five() {
        let mut t = Translator::new(KeyLayout::Stock);
        for scan in [0x00, 0x01, 0x02, 0x03, 0x04, 0x05] {
            feed(&mut t, word(down(scan), IDLE));
        }
        assert_eq!(t.keyboard().keycodes, [0x04, 0x16, 0x07, 0x09, 0x0B]);
    }

    #[test]
    fn mouse_word_is_stateless() {
        let mut t = Translator::new(KeyLayout::Stock);
        let pressed = t.apply_mouse_word(0x0000);
        assert_eq!(pressed.buttons, 1);
        let released = t.apply_mouse_word(0x8080);
        assert_eq!(released, MouseReport::default());
        assert!(t.keyboard().is_empty());
    }

    #[test]
    fn host_query_clear_drops_modifiers_and_first_key() {
        let mut t = Translator::new(KeyLayout::Stock);
        feed(&mut t, word(down(LSHIFT), down(A)));
        feed(&mut t, word(down(S), IDLE));
        assert!(t.clear_after_host_query());
        assert_eq!(t.keyboard().modifier, 0);
        assert_eq!(t.keyboard().keycodes, [0x16, 0, 0, 0, 0]);
    }

    #[test]
    fn host_query_clear_on_empty_state_is_a_no_op() {
        let mut t = Translator::new(KeyLayout::Stock);
        assert!(!t.clear_after_host_query());
        assert!(t.keyboard().is_empty());
    }
}

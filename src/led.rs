//! USB LED output report → ADB keyboard register 2.
//!
//! The host's LED bits (0 = Num Lock, 1 = Caps Lock, 2 = Scroll Lock) sit
//! in the same positions as the ADB keyboard's LED bits, but ADB lights an
//! LED when its bit is 0. The update is parked in a single atomic byte with
//! bit 7 as the "pending" flag, so the poll loop always sees either the
//! old or the complete new value.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::hid::keyboard::KEYBOARD_REPORT_ID;

const PENDING: u8 = 0x80;
const LED_MASK: u8 = 0x07;

/// ADB register 2 value for a USB LED byte.
pub const fn adb_led_bits(usb_leds: u8) -> u8 {
    !usb_leds & LED_MASK
}

/// Mailbox between the USB output-report handler and the poll loop.
pub struct LedBridge {
    pending: AtomicU8,
}

impl LedBridge {
    pub const fn new() -> Self {
        Self {
            pending: AtomicU8::new(0),
        }
    }

    /// Accept a raw output report, with or without its report ID prefix.
    pub fn on_output_report(&self, data: &[u8]) {
        let leds = match data {
            [KEYBOARD_REPORT_ID, leds, ..] => *leds,
            [leds] => *leds,
            _ => return,
        };
        self.set_host_leds(leds);
    }

    /// Queue the host's LED state for the next poll cycle.
    pub fn set_host_leds(&self, usb_leds: u8) {
        self.pending
            .store(PENDING | adb_led_bits(usb_leds), Ordering::Release);
    }

    /// Take the queued ADB LED bits, if any.
    pub fn take_pending(&self) -> Option<u8> {
        let value = self.pending.swap(0, Ordering::Acquire);
        (value & PENDING != 0).then_some(value & LED_MASK)
    }
}

impl Default for LedBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn led_bits_are_inverted_and_masked() {
        assert_eq!(adb_led_bits(0b000), 0b111);
        assert_eq!(adb_led_bits(0b010), 0b101); // caps lit
        assert_eq!(adb_led_bits(0b111), 0b000);
        assert_eq!(adb_led_bits(0b1111_1000), 0b111); // compose/kana ignored
    }

    #[test]
    fn nothing_pending_initially() {
        let bridge = LedBridge::new();
        assert_eq!(bridge.take_pending(), None);
    }

    #[test]
    fn pending_value_is_taken_once() {
        let bridge = LedBridge::new();
        bridge.set_host_leds(0b010);
        assert_eq!(bridge.take_pending(), Some(0b101));
        assert_eq!(bridge.take_pending(), None);
    }

    #[test]
    fn all_leds_lit_is_still_pending() {
        let bridge = LedBridge::new();
        bridge.set_host_leds(0b111);
        assert_eq!(bridge.take_pending(), Some(0));
    }

    #[test]
    fn latest_update_wins() {
        let bridge = LedBridge::new();
        bridge.set_host_leds(0b001);
        bridge.set_host_leds(0b100);
        assert_eq!(bridge.take_pending(), Some(0b011));
    }

    #[test]
    fn output_report_with_and_without_id() {
        let bridge = LedBridge::new();
        bridge.on_output_report(&[0x02]);
        assert_eq!(bridge.take_pending(), Some(0b101));

        bridge.on_output_report(&[KEYBOARD_REPORT_ID, 0x04]);
        assert_eq!(bridge.take_pending(), Some(0b011));

        bridge.on_output_report(&[]);
        assert_eq!(bridge.take_pending(), None);
    }
}

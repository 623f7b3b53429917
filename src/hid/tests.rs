//! Unit tests for HID report state and serialization.
//!
//! These tests run on the host (not embedded) and verify the key buffer
//! invariants, the ADB mouse decode and the wire layout of both reports.

use super::keyboard::{usage, KeyboardReport, KEY_SLOTS};
use super::mouse::MouseReport;
use super::{HidReport, REPORT_DESCRIPTOR};

/// Front-packed, no duplicates, at most KEY_SLOTS entries.
fn assert_buffer_invariant(report: &KeyboardReport) {
    let held = report.held_keys();
    assert!(held <= KEY_SLOTS);
    assert!(report.keycodes[held..].iter().all(|&k| k == 0));
    for i in 0..held {
        assert!(!report.keycodes[i + 1..held].contains(&report.keycodes[i]));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Keyboard Report Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn keyboard_report_empty() {
    let report = KeyboardReport::empty();
    assert!(report.is_empty());
    assert_eq!(report.modifier, 0);
    assert_eq!(report.keycodes, [0; KEY_SLOTS]);
}

#[test]
fn press_fills_first_free_slot() {
    let mut report = KeyboardReport::empty();
    assert!(report.press(0x04));
    assert!(report.press(0x05));
    assert_eq!(report.keycodes, [0x04, 0x05, 0, 0, 0]);
    assert_eq!(report.modifier, 0);
}

#[test]
fn repeated_press_is_idempotent() {
    let mut report = KeyboardReport::empty();
    report.press(0x04);
    let once = report;
    report.press(0x04);
    assert_eq!(report, once);
}

#[test]
fn release_shifts_remaining_keys_left() {
    let mut report = KeyboardReport::empty();
    for code in [0x04, 0x05, 0x06, 0x07] {
        report.press(code);
    }
    report.release(0x05);
    assert_eq!(report.keycodes, [0x04, 0x06, 0x07, 0, 0]);
    assert_buffer_invariant(&report);
}

#[test]
fn release_of_last_slot_clears_it() {
    let mut report = KeyboardReport::empty();
    for code in [0x04, 0x05, 0x06, 0x07, 0x08] {
        report.press(code);
    }
    report.release(0x08);
    assert_eq!(report.keycodes, [0x04, 0x05, 0x06, 0x07, 0]);
}

#[test]
fn release_without_press_changes_nothing() {
    let mut report = KeyboardReport::empty();
    report.press(0x04);
    report.press(usage::LEFT_SHIFT);
    let before = report;
    report.release(0x09);
    assert_eq!(report, before);

    let mut empty = KeyboardReport::empty();
    empty.release(0x09);
    assert!(empty.is_empty());
}

#[test]
fn overflow_drops_newest_key() {
    let mut report = KeyboardReport::empty();
    for code in [0x04, 0x05, 0x06, 0x07, 0x08] {
        assert!(report.press(code));
    }
    assert!(!report.press(0x09));
    assert_eq!(report.keycodes, [0x04, 0x05, 0x06, 0x07, 0x08]);
    assert!(!report.contains(0x09));
}

#[test]
fn modifiers_stay_out_of_key_buffer() {
    let mut report = KeyboardReport::empty();
    report.press(usage::LEFT_SHIFT);
    report.press(usage::RIGHT_GUI);
    assert_eq!(report.modifier, 0b1000_0010);
    assert_eq!(report.held_keys(), 0);

    report.press(0x04);
    report.release(0x04);
    assert_eq!(report.modifier, 0b1000_0010);

    report.release(usage::LEFT_SHIFT);
    assert_eq!(report.modifier, 0b1000_0000);
}

#[test]
fn buffer_invariant_holds_over_mixed_sequence() {
    let mut report = KeyboardReport::empty();
    // Deterministic pseudo-random walk over a small code space so that
    // repeats, overflows and stray releases all occur.
    let mut seed: u32 = 0x1234_5678;
    for _ in 0..2000 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let code = 0x04 + ((seed >> 16) % 9) as u8;
        if (seed >> 8) & 1 == 0 {
            report.press(code);
        } else {
            report.release(code);
        }
        assert_buffer_invariant(&report);
        assert_eq!(report.modifier, 0);
    }
}

#[test]
fn keyboard_report_serializes_with_report_id() {
    let report = KeyboardReport {
        modifier: 0x05,
        reserved: 0x00,
        keycodes: [0x04, 0x05, 0x06, 0x00, 0x00],
    };

    let mut buf = [0u8; 8];
    let written = report.serialize(&mut buf);

    assert_eq!(written, 8);
    assert_eq!(buf, [0x01, 0x05, 0x00, 0x04, 0x05, 0x06, 0x00, 0x00]);
}

#[test]
fn keyboard_report_serialize_buffer_too_small() {
    let report = KeyboardReport::empty();
    let mut small_buf = [0u8; 4];
    let written = report.serialize(&mut small_buf);
    assert_eq!(written, 0); // Should fail gracefully
}

// ═══════════════════════════════════════════════════════════════════════════
// Mouse Report Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn mouse_word_with_button_up_and_no_motion_is_idle() {
    let report = MouseReport::from_adb_word(0x8080);
    assert_eq!(report.buttons, 0);
    assert_eq!(report.x, 0);
    assert_eq!(report.y, 0);
    assert_eq!(report, MouseReport::default());
}

#[test]
fn mouse_button_sense_is_inverted() {
    assert_eq!(MouseReport::from_adb_word(0x0000).buttons, 0x01);
    assert_eq!(MouseReport::from_adb_word(0x8000).buttons, 0x00);
}

#[test]
fn mouse_deltas_are_sign_extended() {
    // Y = +3, X = -2 (0x7E in 7 bits)
    let report = MouseReport::from_adb_word(0x8000 | (0x03 << 8) | 0x7E);
    assert_eq!(report.y, 3);
    assert_eq!(report.x, -2);

    // Extremes of the 7-bit range.
    let report = MouseReport::from_adb_word(0x8000 | (0x40 << 8) | 0x3F);
    assert_eq!(report.y, -64);
    assert_eq!(report.x, 63);
}

#[test]
fn mouse_second_button_bit_does_not_leak_into_x() {
    let report = MouseReport::from_adb_word(0x8080 | 0x01);
    assert_eq!(report.x, 1);
    assert_eq!(report.buttons, 0);
}

#[test]
fn mouse_report_serializes_with_report_id() {
    let report = MouseReport {
        buttons: 0x01,
        x: -10,
        y: 20,
    };
    let mut buf = [0u8; 4];
    assert_eq!(report.serialize(&mut buf), 4);
    assert_eq!(buf, [0x02, 0x01, 0xF6, 0x14]);
}

#[test]
fn mouse_report_serialize_buffer_too_small() {
    let report = MouseReport::default();
    let mut buf = [0u8; 2];
    assert_eq!(report.serialize(&mut buf), 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// HidReport Enum Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn hid_report_dispatches_serialization() {
    let mut buf = [0u8; 8];
    let kb = HidReport::Keyboard(KeyboardReport::empty());
    assert_eq!(kb.serialize(&mut buf), 8);
    assert_eq!(buf[0], 0x01);

    let mouse = HidReport::Mouse(MouseReport::default());
    assert_eq!(mouse.serialize(&mut buf), 4);
    assert_eq!(buf[0], 0x02);
}

#[test]
fn descriptor_declares_both_report_ids() {
    let ids: std::vec::Vec<u8> = REPORT_DESCRIPTOR
        .windows(2)
        .filter(|w| w[0] == 0x85)
        .map(|w| w[1])
        .collect();
    assert_eq!(ids, [1, 2]);
}

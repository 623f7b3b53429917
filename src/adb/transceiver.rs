//! ADB command framing and word decode.
//!
//! Wire format of one bit cell (host or device):
//! ```text
//!   0:  ‾‾\_______________/‾‾‾‾‾‾‾‾\__   65 µs low, 35 µs high
//!   1:  ‾‾\________/‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾\__   35 µs low, 65 µs high
//! ```
//! The receiver does not rely on absolute widths: it measures both phases
//! of each cell and calls the bit a 1 when the high phase is the longer.
//!
//! Timing-critical spans run inside `critical_section::with`, so interrupts
//! are masked for at most one command byte or one 16-bit word and are
//! restored on every exit path, including timeouts.

use super::{BusLine, Command};
use crate::error::BusError;

/// Attention pulse that opens every transaction.
pub const ATTENTION_US: u32 = 800;
/// High gap between attention and the first command bit.
pub const SYNC_US: u32 = 65;
/// Short phase of a bit cell.
pub const BIT_SHORT_US: u32 = 35;
/// Long phase of a bit cell.
pub const BIT_LONG_US: u32 = 65;
/// Stop-to-start time before a Listen payload.
pub const LISTEN_SETTLE_US: u32 = 200;
/// Global reset pulse.
pub const RESET_US: u32 = 3000;

/// Upper bound for one received bit cell, shared between its two phases.
pub const BIT_CELL_TICKS: u16 = 130;
/// Upper bound for the low phase of the device's stop bit.
pub const STOP_BIT_TICKS: u16 = 130;
/// A line that drops again within this many ticks of the stop bit rising
/// carries a Service Request.
pub const SRQ_THRESHOLD_TICKS: u16 = 300;
/// Default wait for each edge of a Talk response's start sequence.
pub const TALK_START_TICKS: u16 = 500;

/// Low and high phase durations (µs) for one encoded bit.
pub const fn bit_cell(bit: bool) -> (u32, u32) {
    if bit {
        (BIT_SHORT_US, BIT_LONG_US)
    } else {
        (BIT_LONG_US, BIT_SHORT_US)
    }
}

/// Decide a received bit from its measured phase lengths.
pub const fn decode_cell(low: u16, high: u16) -> bool {
    high > low
}

/// A successfully received register value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response {
    /// The 16-bit register contents, MSB first on the wire.
    pub word: u16,
    /// Some device asked to be polled.
    pub srq: bool,
}

/// ADB host transceiver over any [`BusLine`].
pub struct Transceiver<L> {
    line: L,
}

impl<L: BusLine> Transceiver<L> {
    /// Take ownership of the line and leave it released.
    pub fn new(mut line: L) -> Self {
        line.release();
        Self { line }
    }

    pub fn line(&self) -> &L {
        &self.line
    }

    /// Hold the line low long enough to reset every device.
    pub fn reset(&mut self) {
        self.line.drive_low();
        self.line.delay_us(RESET_US);
        self.line.release();
    }

    /// Attention, sync, command byte and stop bit. Leaves the line released.
    pub fn send_command(&mut self, cmd: Command) {
        self.attention();
        let line = &mut self.line;
        critical_section::with(|_| {
            send_byte(line, cmd.to_byte());
            place_bit(line, false);
        });
    }

    /// Send a Talk command and read the device's answer.
    pub fn talk(&mut self, cmd: Command) -> Result<Response, BusError> {
        self.send_command(cmd);
        self.receive_word(TALK_START_TICKS)
    }

    /// Read one 16-bit response frame.
    ///
    /// Waits for the start sequence (low, high, low), each edge bounded by
    /// `initial_wait` ticks, then samples 16 cells. A timeout anywhere
    /// discards the whole word.
    pub fn receive_word(&mut self, initial_wait: u16) -> Result<Response, BusError> {
        let line = &mut self.line;

        if line.wait_for_low(initial_wait) == 0
            || line.wait_for_high(initial_wait) == 0
            || line.wait_for_low(initial_wait) == 0
        {
            return Err(BusError::StartTimeout);
        }

        let word = critical_section::with(|_| sample_word(line))?;

        // Stop bit, then see whether anyone pulls the line back down.
        let srq = line.wait_for_high(STOP_BIT_TICKS) != 0
            && line.wait_for_low(SRQ_THRESHOLD_TICKS) != 0;

        Ok(Response { word, srq })
    }

    /// Write `payload` into the register addressed by a Listen command.
    pub fn write_register(&mut self, cmd: Command, payload: &[u8]) {
        self.send_command(cmd);
        self.line.delay_us(LISTEN_SETTLE_US);
        let line = &mut self.line;
        critical_section::with(|_| {
            place_bit(line, true);
            for &byte in payload {
                send_byte(line, byte);
            }
            place_bit(line, false);
        });
    }

    fn attention(&mut self) {
        self.line.drive_low();
        self.line.delay_us(ATTENTION_US);
        self.line.release();
        self.line.delay_us(SYNC_US);
    }
}

fn place_bit<L: BusLine>(line: &mut L, bit: bool) {
    let (low, high) = bit_cell(bit);
    line.drive_low();
    line.delay_us(low);
    line.release();
    line.delay_us(high);
}

fn send_byte<L: BusLine>(line: &mut L, byte: u8) {
    for i in (0..8).rev() {
        place_bit(line, byte & (1 << i) != 0);
    }
}

/// Sample 16 bit cells. The caller has already seen the falling edge that
/// opens the first cell.
fn sample_word<L: BusLine>(line: &mut L) -> Result<u16, BusError> {
    let mut word = 0u16;
    for index in 0..16u8 {
        let after_low = line.wait_for_high(BIT_CELL_TICKS);
        if after_low == 0 {
            return Err(BusError::BitTimeout(index));
        }
        let after_high = line.wait_for_low(after_low);
        if after_high == 0 {
            return Err(BusError::BitTimeout(index));
        }

        let low = BIT_CELL_TICKS - after_low;
        let high = after_low - after_high;
        word = (word << 1) | decode_cell(low, high) as u16;
    }
    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adb::sim::{DeviceScript, ScriptedLine};
    use crate::adb::{Address, DATA_REGISTER, LED_REGISTER};

    #[test]
    fn bit_cells_are_complementary() {
        assert_eq!(bit_cell(true), (35, 65));
        assert_eq!(bit_cell(false), (65, 35));
        assert!(decode_cell(35, 65));
        assert!(!decode_cell(65, 35));
    }

    #[test]
    fn receives_word_from_device() {
        let mut line = ScriptedLine::new();
        line.queue(DeviceScript::word(0xA55A, false));
        let mut bus = Transceiver::new(line);

        let response = bus.talk(Command::Talk(Address::Keyboard, DATA_REGISTER));
        assert_eq!(
            response,
            Ok(Response {
                word: 0xA55A,
                srq: false
            })
        );
    }

    #[test]
    fn receives_edge_words() {
        for word in [0x0000, 0xFFFF, 0x8001, 0x7FFE] {
            let mut line = ScriptedLine::new();
            line.queue(DeviceScript::word(word, false));
            let mut bus = Transceiver::new(line);
            assert_eq!(bus.receive_word(TALK_START_TICKS).map(|r| r.word), Ok(word));
        }
    }

    #[test]
    fn detects_service_request_after_stop_bit() {
        let mut line = ScriptedLine::new();
        line.queue(DeviceScript::word(0x1234, true));
        let mut bus = Transceiver::new(line);

        let response = bus.talk(Command::Talk(Address::Mouse, DATA_REGISTER)).unwrap();
        assert_eq!(response.word, 0x1234);
        assert!(response.srq);
    }

    #[test]
    fn silent_bus_times_out_on_start() {
        let mut bus = Transceiver::new(ScriptedLine::new());
        assert_eq!(
            bus.talk(Command::Talk(Address::Keyboard, DATA_REGISTER)),
            Err(BusError::StartTimeout)
        );
    }

    #[test]
    fn truncated_word_times_out_mid_frame() {
        let mut line = ScriptedLine::new();
        line.queue(DeviceScript::truncated_word(0xFFFF, 5));
        let mut bus = Transceiver::new(line);
        assert_eq!(
            bus.receive_word(TALK_START_TICKS),
            Err(BusError::BitTimeout(5))
        );
    }

    #[test]
    fn command_frame_decodes_back_to_command_byte() {
        let mut bus = Transceiver::new(ScriptedLine::new());
        bus.send_command(Command::Talk(Address::Mouse, DATA_REGISTER));

        let frame = bus.line().host_frame();
        assert_eq!(frame.bits.len(), 9);
        assert_eq!(frame.byte(0), Some(0x3C));
        assert!(!frame.bits[8]);
    }

    #[test]
    fn listen_payload_round_trips_through_framing() {
        let mut bus = Transceiver::new(ScriptedLine::new());
        bus.write_register(Command::Listen(Address::Keyboard, LED_REGISTER), &[0x5A, 0xC3]);

        let frame = bus.line().host_frame();
        // Command byte, stop bit, start bit, 16 payload bits, stop bit.
        assert_eq!(frame.bits.len(), 27);
        assert_eq!(frame.byte(0), Some(0x2A));
        assert!(!frame.bits[8]);
        assert!(frame.bits[9]);
        assert_eq!(frame.byte(10), Some(0x5A));
        assert_eq!(frame.byte(18), Some(0xC3));
        assert!(!frame.bits[26]);
    }

    #[test]
    fn reset_holds_line_for_reset_period() {
        let mut bus = Transceiver::new(ScriptedLine::new());
        bus.reset();
        let pulses = bus.line().host_pulses();
        assert_eq!(pulses.len(), 1);
        assert_eq!(pulses[0].1 - pulses[0].0, RESET_US);
    }
}

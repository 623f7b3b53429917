//! Scripted ADB line for host-side testing.
//!
//! Time only moves when the transceiver delays or ticks, so a test run is
//! fully deterministic: one tick is exactly one simulated microsecond.
//! Each queued [`DeviceScript`] plays back as the answer to the next
//! transaction that samples the line; host pulses are recorded so a test
//! can decode what the transceiver put on the wire.

use heapless::{Deque, HistoryBuffer, Vec};

use super::transceiver::{bit_cell, decode_cell, ATTENTION_US, BIT_CELL_TICKS};
use super::BusLine;

/// Device stop-to-start time used by scripted responses.
pub const SCRIPT_TLT_US: u32 = 200;

const MAX_SEGMENTS: usize = 48;
const MAX_SCRIPTS: usize = 16;
const PULSE_HISTORY: usize = 128;
const MAX_FRAMES: usize = 8;
const MAX_FRAME_BITS: usize = 32;

/// A device waveform, as `(level, duration_us)` segments starting from the
/// moment the host first samples the line after its last pulse. The line
/// is high once the script runs out.
#[derive(Clone, Debug, Default)]
pub struct DeviceScript {
    segments: Vec<(bool, u32), MAX_SEGMENTS>,
}

impl DeviceScript {
    /// No answer at all.
    pub fn silent() -> Self {
        Self::default()
    }

    /// A complete Talk response carrying `word`, optionally followed by an
    /// SRQ pulse.
    pub fn word(word: u16, srq: bool) -> Self {
        let mut script = Self::preamble();
        for i in (0..16).rev() {
            script.cell(word & (1 << i) != 0);
        }
        script.push(false, bit_cell(false).0);
        if srq {
            script.push(true, 100);
            script.push(false, 300);
        }
        script
    }

    /// A response that dies after `complete` cells: the next cell's low
    /// phase is sent, then the device lets go.
    pub fn truncated_word(word: u16, complete: usize) -> Self {
        let mut script = Self::preamble();
        for i in (16 - complete.min(16)..16).rev() {
            script.cell(word & (1 << i) != 0);
        }
        script.push(false, bit_cell(true).0);
        script
    }

    /// Append a raw segment.
    pub fn push(&mut self, level: bool, duration_us: u32) {
        let _ = self.segments.push((level, duration_us));
    }

    fn preamble() -> Self {
        let mut script = Self::default();
        script.push(true, SCRIPT_TLT_US);
        script.cell(true);
        script
    }

    fn cell(&mut self, bit: bool) {
        let (low, high) = bit_cell(bit);
        self.push(false, low);
        self.push(true, high);
    }

    fn level_at(&self, t: u32) -> bool {
        let mut start = 0;
        for &(level, duration) in &self.segments {
            if t < start + duration {
                return level;
            }
            start += duration;
        }
        true
    }
}

/// Bits decoded from one host transaction (everything after an attention
/// pulse).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostFrame {
    pub bits: Vec<bool, MAX_FRAME_BITS>,
}

impl HostFrame {
    /// Eight bits starting at `offset`, MSB first.
    pub fn byte(&self, offset: usize) -> Option<u8> {
        let bits = self.bits.get(offset..offset + 8)?;
        Some(bits.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8))
    }
}

/// Simulated open-drain line with a scripted device on the other end.
pub struct ScriptedLine {
    now: u32,
    host_low_since: Option<u32>,
    pulses: HistoryBuffer<(u32, u32), PULSE_HISTORY>,
    scripts: Deque<DeviceScript, MAX_SCRIPTS>,
    active: Option<(u32, DeviceScript)>,
    armed: bool,
}

impl ScriptedLine {
    pub fn new() -> Self {
        Self {
            now: 0,
            host_low_since: None,
            pulses: HistoryBuffer::new(),
            scripts: Deque::new(),
            active: None,
            armed: true,
        }
    }

    /// Queue the answer for the next sampling transaction.
    pub fn queue(&mut self, script: DeviceScript) {
        let _ = self.scripts.push_back(script);
    }

    /// Scripts not yet consumed.
    pub fn pending_scripts(&self) -> usize {
        self.scripts.len()
    }

    /// Recorded host pulses as `(fell_at, rose_at)`, oldest first.
    pub fn host_pulses(&self) -> Vec<(u32, u32), PULSE_HISTORY> {
        self.pulses.oldest_ordered().copied().collect()
    }

    /// Decode recorded host pulses into frames, split on attention pulses.
    ///
    /// The high phase of each cell is capped at what a receiver's cell
    /// window would allow, so a trailing stop bit still reads as a 0.
    pub fn host_frames(&self) -> Vec<HostFrame, MAX_FRAMES> {
        let pulses = self.host_pulses();
        let mut frames: Vec<HostFrame, MAX_FRAMES> = Vec::new();
        let mut current: Option<HostFrame> = None;

        for (i, &(fell, rose)) in pulses.iter().enumerate() {
            let low = rose - fell;
            if low >= ATTENTION_US / 2 {
                if let Some(frame) = current.replace(HostFrame::default()) {
                    push_recent(&mut frames, frame);
                }
                continue;
            }
            let gap = pulses.get(i + 1).map_or(u32::MAX, |next| next.0 - rose);
            let high = gap.min(u32::from(BIT_CELL_TICKS).saturating_sub(low));
            if let Some(frame) = current.as_mut() {
                let _ = frame.bits.push(decode_cell(low as u16, high as u16));
            }
        }
        if let Some(frame) = current {
            push_recent(&mut frames, frame);
        }
        frames
    }

    /// The most recent host frame.
    pub fn host_frame(&self) -> HostFrame {
        self.host_frames().last().cloned().unwrap_or_default()
    }

    fn device_level(&self) -> bool {
        match &self.active {
            Some((base, script)) => script.level_at(self.now - base),
            None => true,
        }
    }
}

impl Default for ScriptedLine {
    fn default() -> Self {
        Self::new()
    }
}

fn push_recent(frames: &mut Vec<HostFrame, MAX_FRAMES>, frame: HostFrame) {
    if frames.is_full() {
        frames.remove(0);
    }
    let _ = frames.push(frame);
}

impl BusLine for ScriptedLine {
    fn drive_low(&mut self) {
        if self.host_low_since.is_none() {
            self.host_low_since = Some(self.now);
        }
        self.active = None;
    }

    fn release(&mut self) {
        if let Some(fell) = self.host_low_since.take() {
            self.pulses.write((fell, self.now));
            self.armed = true;
        }
    }

    fn is_high(&mut self) -> bool {
        if self.host_low_since.is_some() {
            return false;
        }
        if self.armed {
            self.armed = false;
            self.active = self.scripts.pop_front().map(|script| (self.now, script));
        }
        self.device_level()
    }

    fn delay_us(&mut self, us: u32) {
        self.now += us;
    }

    fn tick(&mut self) {
        self.now += 1;
    }
}

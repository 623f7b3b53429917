//! Bus signaling primitive.
//!
//! Everything above this trait speaks in microseconds and polling ticks;
//! everything below it is one open-drain GPIO. The embedded binary backs it
//! with an nRF `Flex` pin and cycle-counted delays, the tests with
//! [`ScriptedLine`](super::sim::ScriptedLine).

/// One open-drain ADB data line.
pub trait BusLine {
    /// Actively pull the line low.
    fn drive_low(&mut self);

    /// Stop driving; the pull-up brings the line high unless a device holds it.
    fn release(&mut self);

    /// Sample the line.
    fn is_high(&mut self) -> bool;

    /// Busy-wait for `us` microseconds.
    fn delay_us(&mut self, us: u32);

    /// Busy-wait one polling tick. Together with one `is_high` call this
    /// should take 1 µs.
    fn tick(&mut self);

    /// Poll until the line reads low.
    ///
    /// Returns the countdown remaining when the line went low, or 0 if
    /// `timeout` ticks elapsed first.
    fn wait_for_low(&mut self, timeout: u16) -> u16 {
        let mut remaining = timeout;
        while remaining > 0 {
            if !self.is_high() {
                return remaining;
            }
            self.tick();
            remaining -= 1;
        }
        0
    }

    /// Poll until the line reads high. Same return convention as
    /// [`wait_for_low`](Self::wait_for_low).
    fn wait_for_high(&mut self, timeout: u16) -> u16 {
        let mut remaining = timeout;
        while remaining > 0 {
            if self.is_high() {
                return remaining;
            }
            self.tick();
            remaining -= 1;
        }
        0
    }
}

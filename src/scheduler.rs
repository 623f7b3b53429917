//! Poll scheduler - the bridge's main cycle.
//!
//! Each cycle talks to one ADB address. The address only changes when the
//! previous transaction ended with a Service Request, so with a single
//! device attached the other address is never polled.
//!
//! ```text
//!   yield ─▶ pending LEDs? ─▶ SRQ? flip address ─▶ Talk R0 ─┬─▶ keyboard report(s)
//!                                                           ├─▶ mouse report
//!                                                           └─▶ (no data) nothing
//! ```
//!
//! While the host has the bus suspended nothing is sent, but key state
//! keeps tracking the keyboard so the first report after resume is right.

use embassy_futures::yield_now;

use crate::adb::{
    handler_id, Address, BusLine, Command, Transceiver, CONFIG_REGISTER, DATA_REGISTER,
    EXTENDED_HANDLER_ID, EXTENDED_KEYBOARD_HANDLER, LED_REGISTER,
};
use crate::config;
use crate::emitter::ReportSink;
use crate::error::Error;
use crate::hid::HidReport;
use crate::host::HostLink;
use crate::keymap::KeyLayout;
use crate::led::adb_led_bits;
use crate::translator::{KeyTransition, Translator};

/// What one cycle did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cycle {
    /// Nobody answered at the polled address.
    NoData(Address),
    /// Keyboard data arrived; `reports` keyboard reports were sent.
    Keyboard { reports: u8 },
    /// Mouse data arrived; `reports` is 0 while the host is suspended.
    Mouse { reports: u8 },
}

/// Owns the bus and all translation state.
pub struct PollScheduler<L> {
    bus: Transceiver<L>,
    translator: Translator,
    current: Address,
    srq_pending: bool,
    clear_on_host_query: bool,
}

impl<L: BusLine> PollScheduler<L> {
    pub fn new(line: L, layout: KeyLayout, clear_on_host_query: bool) -> Self {
        Self {
            bus: Transceiver::new(line),
            translator: Translator::new(layout),
            current: Address::Keyboard,
            srq_pending: false,
            clear_on_host_query,
        }
    }

    /// Scheduler configured from the build-time switches in [`config`].
    pub fn from_config(line: L) -> Self {
        Self::new(line, config::KEY_LAYOUT, config::GET_REPORT_CLEARS_KEYS)
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn bus(&self) -> &Transceiver<L> {
        &self.bus
    }

    /// Reset every device on the bus. Devices need a few milliseconds
    /// afterwards before they answer.
    pub fn reset_bus(&mut self) {
        self.bus.reset();
    }

    /// Switch the keyboard to the extended handler (distinct left/right
    /// modifiers), drop whatever it queued before that, and turn its LEDs
    /// off.
    ///
    /// Reads register 3 back to confirm the switch. A keyboard that does
    /// not answer gives [`Error::Bus`]; one that refused the handler gives
    /// [`Error::Handler`]. Polling works either way.
    pub fn configure_devices(&mut self) -> Result<(), Error> {
        self.bus.write_register(
            Command::Listen(Address::Keyboard, CONFIG_REGISTER),
            &EXTENDED_KEYBOARD_HANDLER,
        );
        self.bus.send_command(Command::Flush(Address::Keyboard));
        self.write_leds(adb_led_bits(0));

        let reg3 = self
            .bus
            .talk(Command::Talk(Address::Keyboard, CONFIG_REGISTER))?;
        match handler_id(reg3.word) {
            EXTENDED_HANDLER_ID => {
                #[cfg(feature = "defmt")]
                defmt::info!("ADB keyboard switched to extended handler");
                Ok(())
            }
            other => Err(Error::Handler(other)),
        }
    }

    /// Run one poll cycle.
    ///
    /// A silent bus is not an error: the cycle reports [`Cycle::NoData`]
    /// and leaves every report untouched. Only transport failures are
    /// returned as errors, and the translator state has already advanced
    /// when they are.
    pub async fn cycle<S: ReportSink>(
        &mut self,
        link: &HostLink,
        sink: &mut S,
    ) -> Result<Cycle, Error> {
        // Let the USB stack run before the bus blocks the executor again.
        yield_now().await;

        if let Some(bits) = link.leds.take_pending() {
            self.write_leds(bits);
        }

        if link.take_report_query()
            && self.clear_on_host_query
            && self.translator.clear_after_host_query()
        {
            link.publish(self.translator.keyboard());
        }

        if core::mem::take(&mut self.srq_pending) {
            self.current = self.current.other();
        }

        let response = match self.bus.talk(Command::Talk(self.current, DATA_REGISTER)) {
            Ok(response) => response,
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::trace!("ADB {}: no data ({})", self.current, _e);
                return Ok(Cycle::NoData(self.current));
            }
        };
        self.srq_pending = response.srq;

        match self.current {
            Address::Keyboard => {
                let reports = self.route_key_word(response.word, link, sink).await?;
                Ok(Cycle::Keyboard { reports })
            }
            Address::Mouse => {
                let report = self.translator.apply_mouse_word(response.word);
                let reports = if link.host_suspended() {
                    0
                } else {
                    sink.send(&HidReport::Mouse(report)).await?;
                    1
                };
                Ok(Cycle::Mouse { reports })
            }
        }
    }

    /// Apply both halves of a keyboard word and send the resulting
    /// report(s). A latching capslock change is sent as press + release
    /// right where it happened; the release is applied even when the press
    /// could not be sent.
    async fn route_key_word<S: ReportSink>(
        &mut self,
        word: u16,
        link: &HostLink,
        sink: &mut S,
    ) -> Result<u8, Error> {
        let mut reports = 0;
        let mut last_sent = None;

        for transition in KeyTransition::split(word) {
            self.translator.apply_transition(transition);
            if self.translator.caps_tap_pending() {
                let pressed = self.send_keyboard(link, sink).await;
                self.translator.release_latched_caps();
                reports += pressed?;
                reports += self.send_keyboard(link, sink).await?;
                last_sent = Some(*self.translator.keyboard());
            }
        }

        if last_sent.as_ref() != Some(self.translator.keyboard()) {
            reports += self.send_keyboard(link, sink).await?;
        }
        Ok(reports)
    }

    /// Send the current keyboard state. Returns the number of reports that
    /// went out (0 while the host is suspended).
    async fn send_keyboard<S: ReportSink>(
        &mut self,
        link: &HostLink,
        sink: &mut S,
    ) -> Result<u8, Error> {
        let report = *self.translator.keyboard();
        let sent = if link.host_suspended() {
            0
        } else {
            sink.send(&HidReport::Keyboard(report)).await?;
            1
        };
        link.publish(&report);
        Ok(sent)
    }

    fn write_leds(&mut self, adb_bits: u8) {
        #[cfg(feature = "defmt")]
        defmt::debug!("ADB LEDs <- {=u8:#b}", adb_bits);

        self.bus.write_register(
            Command::Listen(Address::Keyboard, LED_REGISTER),
            &[0x00, adb_bits],
        );
    }
}

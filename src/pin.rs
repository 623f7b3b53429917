//! ADB data line on an nRF GPIO.
//!
//! The pin runs open-drain (`Standard0Disconnect1`): writing high releases
//! it to the external pull-up, writing low drives it. The input buffer
//! stays connected, so the host can read back what a device is doing.

use adb2usb::adb::BusLine;
use adb2usb::config::{CPU_CYCLES_PER_US, TICK_OVERHEAD_CYCLES};
use embassy_nrf::gpio::{Flex, OutputDrive, Pull};

pub struct FlexLine {
    pin: Flex<'static>,
}

impl FlexLine {
    pub fn new(mut pin: Flex<'static>) -> Self {
        pin.set_high();
        pin.set_as_input_output(Pull::None, OutputDrive::Standard0Disconnect1);
        Self { pin }
    }
}

impl BusLine for FlexLine {
    #[inline(always)]
    fn drive_low(&mut self) {
        self.pin.set_low();
    }

    #[inline(always)]
    fn release(&mut self) {
        self.pin.set_high();
    }

    #[inline(always)]
    fn is_high(&mut self) -> bool {
        self.pin.is_high()
    }

    fn delay_us(&mut self, us: u32) {
        cortex_m::asm::delay(us * CPU_CYCLES_PER_US);
    }

    #[inline(always)]
    fn tick(&mut self) {
        cortex_m::asm::delay(CPU_CYCLES_PER_US - TICK_OVERHEAD_CYCLES);
    }
}

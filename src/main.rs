//! adb2usb firmware entry point.
//!
//! ```text
//!   ADB keyboard/mouse ──▶ P0.29 ──▶ PollScheduler ──▶ HID IN endpoint ──▶ host
//!                                        ▲
//!   host ──▶ LED output report / GET_REPORT ──▶ HostLink
//! ```
//!
//! Three tasks share the executor: the USB device runner, the LED output
//! reader, and the poll loop in `main` which owns the bus. The poll loop
//! masks interrupts only while a bit cell is on the wire and yields once
//! per cycle.

#![no_std]
#![no_main]

mod pin;
mod usb;

use adb2usb::config;
use adb2usb::host::HostLink;
use adb2usb::scheduler::PollScheduler;
use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_nrf::config::HfclkSource;
use embassy_nrf::gpio::Flex;
use embassy_nrf::wdt::{self, Watchdog};
use embassy_time::Timer;
use embassy_usb::class::hid::HidReader;
use embassy_usb::UsbDevice;
use {defmt_rtt as _, panic_probe as _};

use crate::pin::FlexLine;
use crate::usb::hid_device::{self, UsbDriver, OUT_REPORT_SIZE};

/// Shared between the USB request handlers and the poll loop.
static HOST_LINK: HostLink = HostLink::new();

#[embassy_executor::task]
async fn usb_task(device: UsbDevice<'static, UsbDriver>) -> ! {
    hid_device::run_usb_device(device).await
}

#[embassy_executor::task]
async fn led_task(reader: HidReader<'static, UsbDriver, OUT_REPORT_SIZE>) -> ! {
    hid_device::run_output_reports(reader, &HOST_LINK).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // USB needs the crystal; the bus timing relies on the 64 MHz core clock.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.hfclk_source = HfclkSource::ExternalXtal;
    let p = embassy_nrf::init(nrf_config);

    info!("adb2usb v{} starting", env!("CARGO_PKG_VERSION"));

    let mut wdt_config = wdt::Config::default();
    wdt_config.timeout_ticks = config::WATCHDOG_TIMEOUT_TICKS;
    wdt_config.run_during_debug_halt = false;
    let (_wdt, [mut watchdog]) = match Watchdog::try_new(p.WDT, wdt_config) {
        Ok(wdt) => wdt,
        Err(_) => {
            // Left running by a previous image with another config.
            warn!("Watchdog already active, resetting");
            cortex_m::peripheral::SCB::sys_reset();
        }
    };

    let usb = hid_device::init(p.USBD, &HOST_LINK);
    unwrap!(spawner.spawn(usb_task(usb.device)));
    unwrap!(spawner.spawn(led_task(usb.reader)));
    let mut emitter = usb.emitter;

    let mut scheduler = PollScheduler::from_config(FlexLine::new(Flex::new(p.P0_29)));
    scheduler.reset_bus();
    Timer::after_millis(config::ADB_RESET_RECOVERY_MS).await;
    if let Err(e) = scheduler.configure_devices() {
        warn!("ADB keyboard setup incomplete: {}", e);
    }

    info!(
        "ADB bus up ({}, host-query clear: {})",
        config::KEY_LAYOUT,
        config::GET_REPORT_CLEARS_KEYS
    );

    loop {
        if let Err(e) = scheduler.cycle(&HOST_LINK, &mut emitter).await {
            warn!("Report dropped: {}", e);
        }
        watchdog.pet();
    }
}

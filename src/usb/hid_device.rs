//! USB HID composite device - keyboard + mouse on one interface.
//!
//! Initialises the Embassy USB stack on the nRF52840 hardware USB
//! peripheral and exposes one HID endpoint pair.

use adb2usb::config;
use adb2usb::emitter::ReportSink;
use adb2usb::error::Error;
use adb2usb::hid::keyboard::KEYBOARD_REPORT_ID;
use adb2usb::hid::{HidReport, MAX_REPORT_SIZE, REPORT_DESCRIPTOR};
use adb2usb::host::HostLink;
use defmt::{debug, info};
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::{self, bind_interrupts, peripherals};
use embassy_time::{with_timeout, Duration};
use embassy_usb::class::hid::{
    Config as HidConfig, HidReader, HidReaderWriter, HidWriter, ReportId, RequestHandler, State,
};
use embassy_usb::control::OutResponse;
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    USBD => embassy_nrf::usb::InterruptHandler<peripherals::USBD>;
    CLOCK_POWER => embassy_nrf::usb::vbus_detect::InterruptHandler;
});

pub type UsbDriver = Driver<'static, peripherals::USBD, HardwareVbusDetect>;

/// Output endpoint size: report ID + LED byte.
pub const OUT_REPORT_SIZE: usize = 2;

static HID_STATE: StaticCell<State> = StaticCell::new();
static USB_CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_MSOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_CTRL_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static CONTROL_HANDLER: StaticCell<HostRequests> = StaticCell::new();
static USB_POWER_HANDLER: StaticCell<UsbPowerHandler> = StaticCell::new();

/// Forwards bus suspend/resume to the poll loop.
struct UsbPowerHandler {
    link: &'static HostLink,
}

impl embassy_usb::Handler for UsbPowerHandler {
    fn suspended(&mut self, suspended: bool) {
        info!("USB suspended={}", suspended);
        self.link.set_host_suspended(suspended);
    }

    fn configured(&mut self, configured: bool) {
        info!("USB configured={}", configured);
    }
}

/// Answers HID class requests from the shared host link.
///
/// One instance serves the control pipe, a second the interrupt OUT
/// endpoint; both only touch `HostLink`'s atomics.
#[derive(Clone, Copy)]
pub struct HostRequests {
    link: &'static HostLink,
}

impl RequestHandler for HostRequests {
    fn get_report(&mut self, id: ReportId, buf: &mut [u8]) -> Option<usize> {
        match id {
            ReportId::In(KEYBOARD_REPORT_ID) => {
                let n = self.link.answer_get_report(buf);
                (n > 0).then_some(n)
            }
            _ => None,
        }
    }

    fn set_report(&mut self, id: ReportId, data: &[u8]) -> OutResponse {
        match id {
            ReportId::Out(KEYBOARD_REPORT_ID) | ReportId::Out(0) => {
                debug!("USB LED report: {=[u8]:#x}", data);
                self.link.leds.on_output_report(data);
                OutResponse::Accepted
            }
            _ => OutResponse::Rejected,
        }
    }
}

/// Build result: device runner, LED reader and the report emitter.
pub struct UsbHidDevice {
    pub device: UsbDevice<'static, UsbDriver>,
    pub reader: HidReader<'static, UsbDriver, OUT_REPORT_SIZE>,
    pub emitter: UsbReportEmitter,
}

/// Initialise the USB stack and create the composite HID device.
///
/// Must be called exactly once.  All static buffers are consumed here.
pub fn init(usbd: peripherals::USBD, link: &'static HostLink) -> UsbHidDevice {
    // Create the low-level USB driver with hardware VBUS detection.
    let driver = Driver::new(usbd, Irqs, HardwareVbusDetect::new(Irqs));

    // USB device-level configuration.
    let mut usb_config = Config::new(config::USB_VID, config::USB_PID);
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(config::USB_SERIAL_NUMBER);
    usb_config.max_power = 100; // mA
    usb_config.max_packet_size_0 = 64;

    // Allocate static descriptor buffers.
    let config_desc = USB_CONFIG_DESC.init([0u8; 256]);
    let bos_desc = USB_BOS_DESC.init([0u8; 256]);
    let msos_desc = USB_MSOS_DESC.init([0u8; 256]);
    let ctrl_buf = USB_CTRL_BUF.init([0u8; 128]);

    let mut builder = Builder::new(
        driver,
        usb_config,
        config_desc,
        bos_desc,
        msos_desc,
        ctrl_buf,
    );

    let usb_handler = USB_POWER_HANDLER.init(UsbPowerHandler { link });
    builder.handler(usb_handler);

    let control_handler = CONTROL_HANDLER.init(HostRequests { link });
    let hid_config = HidConfig {
        report_descriptor: REPORT_DESCRIPTOR,
        request_handler: Some(control_handler),
        poll_ms: config::USB_HID_POLL_MS,
        max_packet_size: 8,
    };
    let state = HID_STATE.init(State::new());
    let hid = HidReaderWriter::<_, OUT_REPORT_SIZE, MAX_REPORT_SIZE>::new(
        &mut builder,
        state,
        hid_config,
    );
    let (reader, writer) = hid.split();

    let device = builder.build();

    info!("USB HID composite device initialised (keyboard + mouse)");

    UsbHidDevice {
        device,
        reader,
        emitter: UsbReportEmitter { writer },
    }
}

/// Run the USB device stack - must be spawned as a dedicated Embassy task.
///
/// This handles USB enumeration, suspend/resume, and endpoint servicing.
pub async fn run_usb_device(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    info!("USB device task started");
    device.run().await
}

/// LED output report task - hands every output report to the host link.
pub async fn run_output_reports(
    reader: HidReader<'static, UsbDriver, OUT_REPORT_SIZE>,
    link: &'static HostLink,
) -> ! {
    info!("USB output report task started");
    let mut handler = HostRequests { link };
    reader.run(true, &mut handler).await
}

/// Writes reports to the HID IN endpoint.
///
/// Every write is bounded by `USB_WRITE_TIMEOUT_MS`, so a host that stops
/// polling never stalls the poll loop (and with it the watchdog).
pub struct UsbReportEmitter {
    writer: HidWriter<'static, UsbDriver, MAX_REPORT_SIZE>,
}

impl ReportSink for UsbReportEmitter {
    async fn send(&mut self, report: &HidReport) -> Result<(), Error> {
        let mut buf = [0u8; MAX_REPORT_SIZE];
        let n = report.serialize(&mut buf);

        // The endpoint is only ready once the host has enumerated us.
        let write = async {
            self.writer.ready().await;
            self.writer.write(&buf[..n]).await
        };
        match with_timeout(Duration::from_millis(config::USB_WRITE_TIMEOUT_MS), write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) | Err(_) => Err(Error::Usb),
        }
    }
}

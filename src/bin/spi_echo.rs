#![no_std]
#![no_main]

//! SPI slave echo.
//!
//! Arms a fixed-length full-duplex DMA transaction, signals readiness
//! to the master over a dedicated handshake line, blocks until the
//! master has clocked the transaction through and prints what arrived.
//! The master drives everything; without one attached the loop simply
//! parks in the wait.

use esp32_examples::errors::SpiTransferSnafu;
use esp32_examples::espressif::handshake::Handshake;
use esp_backtrace as _;
use esp_hal::dma_buffers;
use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::spi::{Mode, slave::Spi};
use esp_println::println;
use log::{debug, warn};
use pretty_hex::PrettyHex;
use protocol::echo::{self, Frame, TRANSFER_LEN};
use snafu::ResultExt;

#[esp_hal::main]
fn main() -> ! {
    esp_bootloader_esp_idf::esp_app_desc!();
    esp_println::logger::init_logger_from_env();

    let peripherals = esp_hal::init(esp_hal::Config::default());

    // The master can route its side through the GPIO mux, these are
    // free to move.
    cfg_if::cfg_if!(
        if #[cfg(feature = "esp32")] {
            let sclk = peripherals.GPIO18;
            let miso = peripherals.GPIO19;
            let mosi = peripherals.GPIO23;
            let cs = peripherals.GPIO5;
            let mut handshake = Handshake::new(peripherals.GPIO2);
        } else if #[cfg(any(feature = "esp32s2", feature = "esp32s3"))] {
            let sclk = peripherals.GPIO12;
            let miso = peripherals.GPIO13;
            let mosi = peripherals.GPIO11;
            let cs = peripherals.GPIO10;
            let mut handshake = Handshake::new(peripherals.GPIO2);
        } else {
            let sclk = peripherals.GPIO6;
            let miso = peripherals.GPIO2;
            let mosi = peripherals.GPIO7;
            let cs = peripherals.GPIO10;
            let mut handshake = Handshake::new(peripherals.GPIO3);
        }
    );

    cfg_if::cfg_if!(
        if #[cfg(any(feature = "esp32", feature = "esp32s2"))] {
            let dma_channel = peripherals.DMA_SPI2;
        } else {
            let dma_channel = peripherals.DMA_CH0;
        }
    );

    // Pull-ups on the SPI lines, a floating bus must not clock in
    // rogue pulses while no master is attached.
    let input_pullup = InputConfig::default().with_pull(Pull::Up);
    let sclk = Input::new(sclk, input_pullup);
    let mosi = Input::new(mosi, input_pullup);
    let cs = Input::new(cs, input_pullup);

    let (rx_buffer, rx_descriptors, tx_buffer, tx_descriptors) = dma_buffers!(TRANSFER_LEN);
    let mut spi = Spi::new(peripherals.SPI2, Mode::_0)
        .with_sck(sclk)
        .with_mosi(mosi)
        .with_miso(miso)
        .with_cs(cs)
        .with_dma(dma_channel, rx_descriptors, tx_descriptors);

    // tx_buffer stays zeroed, the master only cares about the handshake.
    loop {
        echo::arm(rx_buffer);

        // Arming only queues the transaction; the master starts it by
        // pulling CS low and clocking, which the raised handshake line
        // invites it to do.
        let transfer = match spi.transfer(&mut *rx_buffer, &*tx_buffer).context(SpiTransferSnafu) {
            Ok(transfer) => transfer,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };

        {
            let _ready = handshake.ready();
            if let Err(e) = transfer.wait() {
                warn!("transaction aborted: {e:?}");
                continue;
            }
        }

        println!("\r\nReceived:{}", Frame(&rx_buffer[..TRANSFER_LEN]));
        debug!("{:?}", rx_buffer[..TRANSFER_LEN].hex_dump());
    }
}

#![no_std]
#![no_main]

//! Serial time-sync client.
//!
//! Asks the host for the time by writing a single bell byte on UART1,
//! then scans the reply stream for a `T<seconds>` message. The clock is
//! displayed once per interval and a LED shows whether it is in sync.

use embassy_executor::Spawner;
use embassy_time::{Duration, Instant, Ticker};
use esp32_examples::errors::UartConfigSnafu;
use esp32_examples::espressif::{buffered_uart::BufferedUart, status_led::StatusLed};
use esp32_examples::settings::{BAUD_RATE, DISPLAY_INTERVAL_SECS};
use esp_backtrace as _;
use esp_hal::{
    Async,
    gpio::Pin,
    interrupt::{Priority, software::SoftwareInterruptControl},
    timer::timg::TimerGroup,
    uart::{Config, RxConfig, Uart},
};
use esp_hal_embassy::InterruptExecutor;
use esp_println::println;
use log::{info, warn};
use protocol::civil::Walltime;
use protocol::clock::Clock;
use protocol::sync::{REQUEST, SyncParser};
use snafu::ResultExt;
use static_cell::StaticCell;

static UART_BUF: StaticCell<BufferedUart> = StaticCell::new();
static INT_EXECUTOR: StaticCell<InterruptExecutor<0>> = StaticCell::new();

#[esp_hal_embassy::main]
async fn main(_spawner: Spawner) -> ! {
    esp_bootloader_esp_idf::esp_app_desc!();
    esp_println::logger::init_logger_from_env();

    // System init
    let peripherals = esp_hal::init(esp_hal::Config::default());
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_hal_embassy::init(timg0.timer0);

    // Grab UART1, typically not connected to dev board's TTL2USB IC nor
    // builtin JTAG functionality
    cfg_if::cfg_if!(
        if #[cfg(feature = "esp32")] {
            let (rx_pin, tx_pin) = (peripherals.GPIO13.degrade(), peripherals.GPIO14.degrade());
        } else if #[cfg(feature = "esp32c2")] {
            let (rx_pin, tx_pin) = (peripherals.GPIO9.degrade(), peripherals.GPIO10.degrade());
        } else if #[cfg(feature = "esp32c3")] {
            let (rx_pin, tx_pin) = (peripherals.GPIO20.degrade(), peripherals.GPIO21.degrade());
        } else {
            let (rx_pin, tx_pin) = (peripherals.GPIO10.degrade(), peripherals.GPIO11.degrade());
        }
    );

    cfg_if::cfg_if!(
        if #[cfg(any(feature = "esp32c2", feature = "esp32c3", feature = "esp32c6"))] {
            let mut led = StatusLed::new(peripherals.GPIO8);
        } else {
            let mut led = StatusLed::new(peripherals.GPIO2);
        }
    );

    let uart_config = Config::default().with_baudrate(BAUD_RATE).with_rx(
        RxConfig::default()
            .with_fifo_full_threshold(16)
            .with_timeout(1),
    );
    let uart = Uart::new(peripherals.UART1, uart_config)
        .context(UartConfigSnafu)
        .unwrap()
        .with_rx(rx_pin)
        .with_tx(tx_pin)
        .into_async();

    // Run the UART pump in a higher priority InterruptExecutor so bytes
    // keep flowing while the main loop sleeps between ticks.
    let uart_buf = UART_BUF.init_with(BufferedUart::new);
    let software_interrupts = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    let interrupt_executor =
        INT_EXECUTOR.init_with(|| InterruptExecutor::new(software_interrupts.software_interrupt0));
    cfg_if::cfg_if! {
        if #[cfg(any(feature = "esp32", feature = "esp32s2", feature = "esp32s3"))] {
            let interrupt_spawner = interrupt_executor.start(Priority::Priority1);
        } else {
            let interrupt_spawner = interrupt_executor.start(Priority::Priority10);
        }
    }
    interrupt_spawner.spawn(uart_task(uart_buf, uart)).unwrap();

    info!("Waiting for sync message");

    let mut parser = SyncParser::new();
    let mut clock = Clock::new();
    let mut rx_chunk = [0u8; 64];
    let mut ticker = Ticker::every(Duration::from_secs(DISPLAY_INTERVAL_SECS));

    loop {
        let mono_now = Instant::now().as_secs();

        // Drain whatever the pump buffered since the last tick. A
        // message may stop mid-number, the flush below settles it.
        loop {
            let n = uart_buf.try_read(&mut rx_chunk);
            if n == 0 {
                break;
            }
            if let Some(epoch) = parser.feed(&rx_chunk[..n]) {
                clock.set(epoch, mono_now);
                info!("clock synced to {epoch}");
            }
        }
        if let Some(epoch) = parser.flush() {
            clock.set(epoch, mono_now);
            info!("clock synced to {epoch}");
        }

        let dropped = uart_buf.check_dropped_bytes();
        if dropped > 0 {
            warn!("UART overrun, dropped {dropped} bytes");
        }

        if let Some(now) = clock.now(mono_now) {
            println!("{}", Walltime::from_epoch(now));
        }
        led.show(clock.status(mono_now));

        if clock.wants_sync(mono_now) {
            uart_buf.write(&[REQUEST]).await;
        }

        ticker.next().await;
    }
}

#[embassy_executor::task]
async fn uart_task(buffer: &'static BufferedUart, uart: Uart<'static, Async>) {
    buffer.run(uart).await;
}

#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use esp_csi::station::Station;
use esp_csi::{console, csi};
use esp_hal::clock::CpuClock;
use esp_hal::main;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use log::{LevelFilter, error, info, warn};
use smoltcp::iface::SocketStorage;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    error!("{info}");
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

#[main]
fn main() -> ! {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 66320);
    // WiFi driver buffers
    esp_alloc::heap_allocator!(size: 64 * 1024);

    console::init(LevelFilter::Info);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    let radio_init = match esp_radio::init() {
        Ok(radio_init) => radio_init,
        Err(err) => {
            error!("Radio init failed: {err:?}");
            halt();
        }
    };
    let (wifi_controller, interfaces) =
        match esp_radio::wifi::new(&radio_init, peripherals.WIFI, Default::default()) {
            Ok(parts) => parts,
            Err(err) => {
                error!("WiFi controller init failed: {err:?}");
                halt();
            }
        };

    let rng = Rng::new();
    let seed = (u64::from(rng.random()) << 32) | u64::from(rng.random());

    let mut socket_storage = [SocketStorage::EMPTY; 2];
    let mut station = match Station::start(wifi_controller, interfaces.sta, &mut socket_storage, seed)
    {
        Ok(station) => station,
        Err(err) => {
            error!("Station start failed: {err:?}");
            halt();
        }
    };

    if let Err(err) = csi::enable(station.controller_mut()) {
        error!("CSI setup failed: {err:?}");
        halt();
    }
    info!("CSI initialized");

    loop {
        station.poll();

        while let Some(frame) = csi::next_frame() {
            if frame.is_empty() {
                continue;
            }
            if frame.is_truncated() {
                warn!("CSI buffer clamped to {} samples", frame.len());
            }
            console::write_frame(&frame);
        }

        let dropped = csi::take_dropped();
        if dropped > 0 {
            warn!("{dropped} CSI frames dropped, console too slow");
        }
    }
}

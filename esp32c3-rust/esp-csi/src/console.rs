//! UART0 console shared by the status logger and the CSI line writer.
//!
//! Both go through `esp-println`, which only holds its lock for one write
//! call. A CSI line is emitted one sample at a time so interrupts stay
//! enabled between samples.

use csi_line::CsiFrame;
use esp_println::Printer;
use log::LevelFilter;

/// Installs the status logger.
pub fn init(level: LevelFilter) {
    esp_println::logger::init_logger(level);
}

/// Prints one `CSI_DATA:` line.
pub fn write_frame(frame: &CsiFrame) {
    let _ = frame.write_line(&mut Printer);
}

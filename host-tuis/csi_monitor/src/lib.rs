//! Host side of the ESP32 CSI receiver.
//!
//! The firmware prints one `CSI_DATA:` line per received CSI buffer. This
//! crate records those lines, loads recorded captures, and estimates room
//! occupancy from them:
//!
//! 1. [`capture`] turns console logs into a `frames x subcarriers` matrix.
//! 2. [`dsp`] removes the static channel, smooths over time and tracks the
//!    motion centroid across subcarriers.
//! 3. [`presence`] compares the resulting features against an empty-room
//!    baseline.
//!
//! ```bash
//! csi-monitor record /dev/ttyUSB0 empty.txt --seconds 60
//! csi-monitor analyze empty.txt occupied.txt walking.txt --trim
//! csi-monitor monitor /dev/ttyUSB0 --baseline empty.txt
//! ```

pub mod capture;
pub mod cli;
pub mod dsp;
pub mod monitor;
pub mod presence;
pub mod record;
pub mod report;
pub mod serial;
mod ui;

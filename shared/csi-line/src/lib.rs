//! Wire format shared between the ESP32 CSI receiver and the host tools.
//!
//! The firmware prints one line per CSI callback:
//!
//! ```text
//! CSI_DATA: 12 -3 0 7 ...
//! ```
//!
//! Every integer is one signed byte of the driver's CSI buffer, in buffer
//! order. Status lines share the same console and never carry the marker.
//!
//! The station reconnect logic lives in [`link`] so it runs on the host too.

#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod frame;
mod line;
pub mod link;

pub use frame::{CsiFrame, FrameQueue, MAX_CSI_LEN};
pub use line::{LineError, MARKER, write_line};
pub use link::{Action, CONNECT_ATTEMPT_TIMEOUT, Link};

#[cfg(feature = "alloc")]
pub use line::parse_line;

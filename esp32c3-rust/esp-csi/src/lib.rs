//! ESP32-C3 WiFi station that streams raw CSI samples to the UART console.

#![no_std]

extern crate alloc;

pub mod console;
pub mod csi;
pub mod station;

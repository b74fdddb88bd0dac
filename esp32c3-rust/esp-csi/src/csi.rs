//! CSI capture: driver configuration and the receive callback.

use core::cell::RefCell;

use critical_section::Mutex;
use csi_line::{CsiFrame, FrameQueue};
use esp_radio::wifi::{CsiConfig, WifiController, WifiError};

/// Frames buffered between the driver callback and the console loop.
pub const QUEUE_DEPTH: usize = 8;

static FRAMES: Mutex<RefCell<FrameQueue<QUEUE_DEPTH>>> =
    Mutex::new(RefCell::new(FrameQueue::new()));

/// Legacy, HT and STBC long training fields, merged; raw unscaled values.
pub const CSI_CONFIG: CsiConfig = CsiConfig {
    lltf_en: true,
    htltf_en: true,
    stbc_htltf2_en: true,
    ltf_merge_en: true,
    channel_filter_en: false,
    manu_scale: false,
    shift: 0,
    dump_ack_en: false,
};

/// Applies [`CSI_CONFIG`], registers the receive callback and turns capture on.
pub fn enable(controller: &mut WifiController<'_>) -> Result<(), WifiError> {
    controller.set_csi(CSI_CONFIG, |info| {
        if info.buf.is_null() {
            return;
        }
        // SAFETY: the driver keeps `len` bytes at `buf` alive for the
        // duration of the callback.
        let samples = unsafe {
            core::slice::from_raw_parts(info.buf.cast_const(), usize::from(info.len))
        };
        let frame = CsiFrame::from_samples(samples);
        critical_section::with(|cs| {
            FRAMES.borrow_ref_mut(cs).push(frame);
        });
    })
}

/// Pops the oldest captured frame.
pub fn next_frame() -> Option<CsiFrame> {
    critical_section::with(|cs| FRAMES.borrow_ref_mut(cs).pop())
}

/// Frames the callback had to discard since the previous call.
pub fn take_dropped() -> u32 {
    critical_section::with(|cs| FRAMES.borrow_ref_mut(cs).take_dropped())
}

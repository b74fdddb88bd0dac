use core::fmt::{self, Write};

use heapless::{Deque, Vec};

use crate::line::write_line;

/// Largest CSI buffer the ESP32-C3 driver hands out (L-LTF + HT-LTF +
/// STBC HT-LTF2, 128 bytes each).
pub const MAX_CSI_LEN: usize = 384;

/// Owned copy of one CSI driver buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsiFrame {
    samples: Vec<i8, MAX_CSI_LEN>,
    truncated: bool,
}

impl CsiFrame {
    /// Copies `samples`, keeping at most [`MAX_CSI_LEN`] of them.
    pub fn from_samples(samples: &[i8]) -> Self {
        let kept = samples.len().min(MAX_CSI_LEN);
        let mut buf = Vec::new();
        // kept <= capacity
        let _ = buf.extend_from_slice(&samples[..kept]);
        Self {
            samples: buf,
            truncated: kept < samples.len(),
        }
    }

    pub fn samples(&self) -> &[i8] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether the driver buffer was longer than [`MAX_CSI_LEN`].
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn write_line<W: Write>(&self, out: &mut W) -> fmt::Result {
        write_line(out, &self.samples)
    }
}

/// Bounded hand-off between the CSI callback and the console loop.
///
/// A full queue rejects the newest frame and counts it, so the callback never
/// blocks inside the driver task.
#[derive(Debug)]
pub struct FrameQueue<const N: usize> {
    frames: Deque<CsiFrame, N>,
    dropped: u32,
}

impl<const N: usize> FrameQueue<N> {
    pub const fn new() -> Self {
        Self {
            frames: Deque::new(),
            dropped: 0,
        }
    }

    /// Returns `false` when the frame was dropped.
    pub fn push(&mut self, frame: CsiFrame) -> bool {
        match self.frames.push_back(frame) {
            Ok(()) => true,
            Err(_) => {
                self.dropped = self.dropped.saturating_add(1);
                false
            }
        }
    }

    pub fn pop(&mut self) -> Option<CsiFrame> {
        self.frames.pop_front()
    }

    /// Number of frames dropped since the last call.
    pub fn take_dropped(&mut self) -> u32 {
        core::mem::take(&mut self.dropped)
    }
}

impl<const N: usize> Default for FrameQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String;
    use std::vec;

    #[test]
    fn frame_keeps_short_buffers_intact() {
        let frame = CsiFrame::from_samples(&[1, -2, 3]);
        assert_eq!(frame.samples(), &[1, -2, 3]);
        assert!(!frame.is_truncated());
        assert!(CsiFrame::from_samples(&[]).is_empty());
    }

    #[test]
    fn frame_clamps_oversized_buffers() {
        let raw = vec![7i8; MAX_CSI_LEN + 16];
        let frame = CsiFrame::from_samples(&raw);
        assert_eq!(frame.len(), MAX_CSI_LEN);
        assert!(frame.is_truncated());
    }

    #[test]
    fn frame_renders_console_line() {
        let mut out = String::new();
        CsiFrame::from_samples(&[-1, 0, 1]).write_line(&mut out).unwrap();
        assert_eq!(out, "CSI_DATA: -1 0 1\n");
    }

    #[test]
    fn queue_is_fifo() {
        let mut queue: FrameQueue<3> = FrameQueue::new();
        assert!(queue.push(CsiFrame::from_samples(&[1])));
        assert!(queue.push(CsiFrame::from_samples(&[2])));
        assert_eq!(queue.pop().unwrap().samples(), &[1]);
        assert_eq!(queue.pop().unwrap().samples(), &[2]);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn full_queue_drops_newest_and_counts() {
        let mut queue: FrameQueue<2> = FrameQueue::new();
        assert!(queue.push(CsiFrame::from_samples(&[1])));
        assert!(queue.push(CsiFrame::from_samples(&[2])));
        assert!(!queue.push(CsiFrame::from_samples(&[3])));
        assert!(!queue.push(CsiFrame::from_samples(&[4])));

        assert_eq!(queue.take_dropped(), 2);
        assert_eq!(queue.take_dropped(), 0);
        assert_eq!(queue.pop().unwrap().samples(), &[1]);
        assert_eq!(queue.pop().unwrap().samples(), &[2]);
    }
}

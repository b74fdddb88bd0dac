//! Capturing device output into a CSI log file.

use std::io::{self, Read, Write};
use std::ops::ControlFlow;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::serial::{self, LineEvent};

const PROGRESS_EVERY: usize = 500;

#[derive(Debug, Clone, Copy, Default)]
pub struct RecordLimits {
    pub frames: Option<usize>,
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSummary {
    pub frames: usize,
    pub malformed: usize,
    pub other_lines: usize,
    pub elapsed: Duration,
}

/// Copies every well-formed `CSI_DATA:` line from `source` to `sink`.
///
/// Stops when either limit is reached or the source ends.
pub fn record<R, W>(source: &mut R, sink: &mut W, limits: RecordLimits) -> io::Result<RecordSummary>
where
    R: Read + ?Sized,
    W: Write,
{
    let started = Instant::now();
    let mut summary = RecordSummary {
        frames: 0,
        malformed: 0,
        other_lines: 0,
        elapsed: Duration::ZERO,
    };
    let mut write_result = Ok(());

    let expired = |started: Instant| limits.duration.is_some_and(|limit| started.elapsed() >= limit);

    serial::read_lines(source, |event| {
        let line = match event {
            LineEvent::Idle if expired(started) => return ControlFlow::Break(()),
            LineEvent::Idle => return ControlFlow::Continue(()),
            LineEvent::Line(line) => line,
        };

        match csi_line::parse_line(line) {
            Some(Ok(_)) => {
                if let Err(err) = writeln!(sink, "{line}") {
                    write_result = Err(err);
                    return ControlFlow::Break(());
                }
                summary.frames += 1;
                if summary.frames % PROGRESS_EVERY == 0 {
                    info!(frames = summary.frames, "recording");
                }
            }
            Some(Err(err)) => {
                debug!(%err, "dropping malformed CSI line");
                summary.malformed += 1;
            }
            None => {
                info!(target: "device", "{line}");
                summary.other_lines += 1;
            }
        }

        let enough = limits.frames.is_some_and(|limit| summary.frames >= limit);
        if enough || expired(started) {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })?;

    write_result?;
    sink.flush()?;
    summary.elapsed = started.elapsed();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const CONSOLE: &[u8] = b"I (10) CSI: CSI initialized\n\
        CSI_DATA: 1 2 3\n\
        CSI_DATA: 4 x 6\n\
        CSI_DATA: 7 8 9\n\
        I (20) CSI: Retrying WiFi connection...\n\
        CSI_DATA: 10 11 12\n";

    #[test]
    fn keeps_only_valid_frames() {
        let mut sink = Vec::new();
        let summary = record(&mut Cursor::new(CONSOLE), &mut sink, RecordLimits::default()).unwrap();

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.malformed, 1);
        assert_eq!(summary.other_lines, 2);
        assert_eq!(
            String::from_utf8(sink).unwrap(),
            "CSI_DATA: 1 2 3\nCSI_DATA: 7 8 9\nCSI_DATA: 10 11 12\n"
        );
    }

    #[test]
    fn stops_at_frame_limit() {
        let mut sink = Vec::new();
        let limits = RecordLimits {
            frames: Some(2),
            duration: None,
        };
        let summary = record(&mut Cursor::new(CONSOLE), &mut sink, limits).unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(String::from_utf8(sink).unwrap().lines().count(), 2);
    }

    #[test]
    fn recorded_file_loads_as_capture() {
        let mut sink = Vec::new();
        record(&mut Cursor::new(CONSOLE), &mut sink, RecordLimits::default()).unwrap();
        let capture = crate::capture::parse_capture(sink.as_slice(), "recorded").unwrap();
        assert_eq!(capture.frames(), 3);
        assert_eq!(capture.width(), 3);
    }
}

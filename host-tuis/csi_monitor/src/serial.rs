//! Device console access: port discovery and line assembly.

use std::io::{self, Read};
use std::ops::ControlFlow;
use std::thread;
use std::time::Duration;

use serialport::{SerialPort, SerialPortInfo};

pub const DEFAULT_BAUD: u32 = 115_200;

/// Lines longer than this without a newline are considered noise.
const MAX_LINE_BYTES: usize = 64 * 1024;

const READ_TIMEOUT: Duration = Duration::from_millis(100);

pub fn available_ports() -> serialport::Result<Vec<SerialPortInfo>> {
    serialport::available_ports()
}

pub fn open(port_name: &str, baud: u32) -> serialport::Result<Box<dyn SerialPort>> {
    serialport::new(port_name, baud).timeout(READ_TIMEOUT).open()
}

/// Splits a byte stream into trimmed, non-empty text lines.
#[derive(Debug, Default)]
pub struct LineAssembler {
    pending: Vec<u8>,
    overflowed: usize,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }

        if self.pending.len() > MAX_LINE_BYTES {
            self.pending.clear();
            self.overflowed += 1;
        }
        lines
    }

    /// Partial lines discarded for exceeding the length limit.
    pub fn overflowed(&self) -> usize {
        self.overflowed
    }
}

pub enum LineEvent<'a> {
    Line(&'a str),
    /// The read timed out without new data.
    Idle,
}

/// Reads lines from `source` until `handler` breaks or the stream ends.
///
/// Timeouts surface as [`LineEvent::Idle`] so that handlers can enforce their
/// own deadlines while the device is silent.
pub fn read_lines<R, F>(source: &mut R, mut handler: F) -> io::Result<()>
where
    R: Read + ?Sized,
    F: FnMut(LineEvent<'_>) -> ControlFlow<()>,
{
    let mut assembler = LineAssembler::new();
    let mut read_buf = [0u8; 256];

    loop {
        match source.read(&mut read_buf) {
            Ok(0) => return Ok(()),
            Ok(n) => {
                for line in assembler.push(&read_buf[..n]) {
                    if handler(LineEvent::Line(&line)).is_break() {
                        return Ok(());
                    }
                }
            }
            Err(err) if err.kind() == io::ErrorKind::TimedOut => {
                if handler(LineEvent::Idle).is_break() {
                    return Ok(());
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(10));
            }
            Err(err) => return Err(err),
        }
    }
}

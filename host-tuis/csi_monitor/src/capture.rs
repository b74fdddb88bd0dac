//! Loading CSI captures recorded from the device console.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no CSI data found in {0}")]
    NoCsiData(String),
}

/// A `frames x subcarriers` matrix of CSI samples, stored row-major.
///
/// Every row has the same width: rows are cut down to the shortest frame seen
/// so that column `i` always refers to the same subcarrier slot.
#[derive(Debug, Clone, PartialEq)]
pub struct CsiCapture {
    width: usize,
    data: Vec<f64>,
    skipped: usize,
}

impl CsiCapture {
    /// Builds a capture from parsed frames, truncating each to the shortest.
    ///
    /// Returns `None` when there are no frames or the shortest frame is empty.
    pub fn from_rows<R: AsRef<[i32]>>(rows: &[R]) -> Option<Self> {
        let width = rows.iter().map(|row| row.as_ref().len()).min()?;
        if width == 0 {
            return None;
        }

        let mut data = Vec::with_capacity(width * rows.len());
        for row in rows {
            data.extend(row.as_ref()[..width].iter().map(|&v| f64::from(v)));
        }

        Some(Self {
            width,
            data,
            skipped: 0,
        })
    }

    pub(crate) fn from_matrix(width: usize, data: Vec<f64>) -> Self {
        debug_assert!(width > 0 && data.len() % width == 0);
        Self {
            width,
            data,
            skipped: 0,
        }
    }

    /// Number of time frames.
    pub fn frames(&self) -> usize {
        self.data.len() / self.width
    }

    /// Number of subcarrier columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Marker lines that were dropped because a sample failed to parse.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn row(&self, frame: usize) -> &[f64] {
        &self.data[frame * self.width..(frame + 1) * self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.width)
    }

    /// Every sample, frame after frame.
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows().map(|row| row[index]).collect()
    }

    /// Keeps only the first `frames` frames.
    pub fn truncate_frames(&mut self, frames: usize) {
        self.data.truncate(frames.min(self.frames()) * self.width);
    }
}

/// Reads every `CSI_DATA:` line of a console log.
///
/// Lines without the marker are ignored, and marker lines carrying a
/// non-integer token are skipped and counted.
pub fn parse_capture<R: BufRead>(mut reader: R, origin: &str) -> Result<CsiCapture, CaptureError> {
    let mut rows = Vec::new();
    let mut skipped = 0;
    let mut raw = Vec::new();
    let mut line_no = 0usize;

    loop {
        raw.clear();
        let read = reader
            .read_until(b'\n', &mut raw)
            .map_err(|source| CaptureError::Io {
                path: PathBuf::from(origin),
                source,
            })?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let line = String::from_utf8_lossy(&raw);
        match csi_line::parse_line(&line) {
            None => {}
            Some(Ok(samples)) => rows.push(samples),
            Some(Err(err)) => {
                debug!(origin, line = line_no, %err, "skipping CSI line");
                skipped += 1;
            }
        }
    }

    let mut capture =
        CsiCapture::from_rows(&rows).ok_or_else(|| CaptureError::NoCsiData(origin.to_owned()))?;
    capture.skipped = skipped;
    Ok(capture)
}

pub fn load_capture(path: &Path) -> Result<CsiCapture, CaptureError> {
    let file = File::open(path).map_err(|source| CaptureError::Io {
        path: path.to_owned(),
        source,
    })?;
    parse_capture(BufReader::new(file), &path.display().to_string())
}

/// Cuts every capture down to the frame count of the shortest one and
/// returns that count.
pub fn trim_to_common_length(captures: &mut [CsiCapture]) -> usize {
    let common = captures.iter().map(CsiCapture::frames).min().unwrap_or(0);
    for capture in captures.iter_mut() {
        capture.truncate_frames(common);
    }
    common
}

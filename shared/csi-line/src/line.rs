use core::fmt::{self, Write};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// Prefix of every CSI sample line on the device console.
pub const MARKER: &str = "CSI_DATA:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("CSI line carries no samples")]
    Empty,

    #[error("sample {position} is not an integer")]
    InvalidSample { position: usize },
}

/// Writes `samples` as a single `CSI_DATA:` line terminated by `\n`.
pub fn write_line<W: Write>(out: &mut W, samples: &[i8]) -> fmt::Result {
    out.write_str(MARKER)?;
    for sample in samples {
        write!(out, " {sample}")?;
    }
    out.write_char('\n')
}

/// Extracts the samples of a console line.
///
/// Returns `None` when the line does not carry the marker at all, so callers
/// can skip boot chatter and log lines without treating them as errors. Every
/// occurrence of the marker is removed before the remainder is split on
/// whitespace; a single token that is not an integer rejects the whole line.
#[cfg(feature = "alloc")]
pub fn parse_line(line: &str) -> Option<Result<Vec<i32>, LineError>> {
    if !line.contains(MARKER) {
        return None;
    }
    Some(parse_samples(&line.replace(MARKER, "")))
}

#[cfg(feature = "alloc")]
fn parse_samples(body: &str) -> Result<Vec<i32>, LineError> {
    let samples = body
        .split_whitespace()
        .enumerate()
        .map(|(position, token)| {
            token
                .parse::<i32>()
                .map_err(|_| LineError::InvalidSample { position })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if samples.is_empty() {
        return Err(LineError::Empty);
    }
    Ok(samples)
}

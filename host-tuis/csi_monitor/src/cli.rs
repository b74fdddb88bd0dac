use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::dsp::{DEFAULT_SIGMA, MAX_SIGMA};
use crate::presence::{AnalysisError, Thresholds};
use crate::serial::DEFAULT_BAUD;

/// Record, analyze and live-monitor CSI from an ESP32 running esp-csi
#[derive(Parser, Debug)]
#[command(name = "csi-monitor")]
#[command(author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List serial ports
    Ports,

    /// Save the device's CSI_DATA lines to a file
    Record(RecordArgs),

    /// Classify recorded captures against an empty-room baseline
    Analyze(AnalyzeArgs),

    /// Live terminal view of a device's CSI stream
    Monitor(MonitorArgs),
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Serial port of the device
    pub port: String,

    /// Output capture file
    pub output: PathBuf,

    #[arg(short, long, default_value_t = DEFAULT_BAUD)]
    pub baud: u32,

    /// Stop after this many frames
    #[arg(long)]
    pub frames: Option<usize>,

    /// Stop after this many seconds
    #[arg(long)]
    pub seconds: Option<u64>,

    /// Append to the output file instead of truncating it
    #[arg(long)]
    pub append: bool,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Capture of the empty room
    pub baseline: PathBuf,

    /// Captures to classify
    pub captures: Vec<PathBuf>,

    /// Trim every capture to the frame count of the shortest one
    #[arg(long)]
    pub trim: bool,

    /// Print JSON (energy, motion and normalized heatmap series) instead of cards
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial port of the device (defaults to the first one found)
    pub port: Option<String>,

    #[arg(short, long, default_value_t = DEFAULT_BAUD)]
    pub baud: u32,

    /// Frames kept in the rolling analysis window
    #[arg(short, long, default_value_t = 200, value_parser = clap::value_parser!(u64).range(2..))]
    pub window: u64,

    /// Capture of the empty room to classify against from the start
    #[arg(long)]
    pub baseline: Option<PathBuf>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct AnalysisArgs {
    /// Gaussian smoothing width in frames
    #[arg(long, default_value_t = DEFAULT_SIGMA)]
    pub sigma: f64,

    /// Motion deviation above which a still person is reported
    #[arg(long, default_value_t = Thresholds::default().still)]
    pub still: f64,

    /// Motion deviation above which walking is reported
    #[arg(long, default_value_t = Thresholds::default().walking)]
    pub walking: f64,

    /// Motion deviation above which multiple people are reported
    #[arg(long, default_value_t = Thresholds::default().crowd)]
    pub crowd: f64,
}

impl AnalysisArgs {
    pub fn thresholds(&self) -> Result<Thresholds, AnalysisError> {
        Thresholds::new(self.still, self.walking, self.crowd)
    }

    pub fn sigma(&self) -> Result<f64, AnalysisError> {
        if (0.0..=MAX_SIGMA).contains(&self.sigma) {
            Ok(self.sigma)
        } else {
            Err(AnalysisError::InvalidSigma(self.sigma))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_defaults() {
        let cli = Cli::parse_from(["csi-monitor", "analyze", "empty.txt", "walking.txt"]);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.baseline, PathBuf::from("empty.txt"));
        assert_eq!(args.captures, vec![PathBuf::from("walking.txt")]);
        assert_eq!(args.analysis.sigma(), Ok(2.0));
        assert_eq!(args.analysis.thresholds().unwrap(), Thresholds::default());
    }

    #[test]
    fn negative_sigma_is_rejected() {
        let cli = Cli::parse_from(["csi-monitor", "monitor", "--sigma=-1"]);
        let Commands::Monitor(args) = cli.command else {
            panic!("expected monitor");
        };
        assert_eq!(args.analysis.sigma(), Err(AnalysisError::InvalidSigma(-1.0)));
    }

    #[test]
    fn oversized_sigma_is_rejected() {
        let cli = Cli::parse_from(["csi-monitor", "analyze", "empty.txt", "--sigma", "1e18"]);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.analysis.sigma(), Err(AnalysisError::InvalidSigma(1e18)));
    }

    #[test]
    fn monitor_window_must_hold_two_frames() {
        assert!(Cli::try_parse_from(["csi-monitor", "monitor", "--window", "1"]).is_err());
    }
}

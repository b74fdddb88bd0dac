//! Offline scenario analysis and its text/JSON renderings.

use std::io::{self, Write};

use serde::Serialize;

use crate::capture::CsiCapture;
use crate::dsp;
use crate::presence::{self, Assessment, Features, Thresholds};

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub frames: usize,
    pub subcarriers: usize,
    pub skipped_lines: usize,
    pub features: Features,
    pub assessment: Assessment,
    /// Mean absolute sample value per frame.
    pub energy: Vec<f64>,
    /// Smoothed motion centroid per frame, in subcarrier index units.
    pub motion_path: Vec<f64>,
    /// Raw samples as global z-scores, one row per frame, for heatmaps.
    pub normalized: Vec<Vec<f64>>,
}

pub fn analyze_scenario(
    name: &str,
    capture: &CsiCapture,
    baseline: &Features,
    sigma: f64,
    thresholds: &Thresholds,
) -> ScenarioReport {
    let features = Features::extract(capture, sigma);
    ScenarioReport {
        name: name.to_owned(),
        frames: capture.frames(),
        subcarriers: capture.width(),
        skipped_lines: capture.skipped(),
        features,
        assessment: presence::classify(&features, baseline, thresholds),
        energy: dsp::energy_series(capture),
        motion_path: dsp::motion_path(capture, sigma),
        normalized: dsp::normalize_for_display(capture)
            .rows()
            .map(<[f64]>::to_vec)
            .collect(),
    }
}

pub fn write_cards<W: Write>(out: &mut W, reports: &[ScenarioReport]) -> io::Result<()> {
    let banner = "=".repeat(60);
    let rule = "-".repeat(50);

    writeln!(out, "\n{banner}")?;
    writeln!(out, "        CSI PRESENCE DETECTION RESULTS")?;
    writeln!(out, "{banner}\n")?;

    for report in reports {
        let features = &report.features;
        writeln!(out, "{rule}")?;
        writeln!(out, " SCENARIO: {}", report.name)?;
        writeln!(out, "{rule}")?;
        writeln!(out, " Mean CSI Energy      : {:.2}", features.mean_energy)?;
        writeln!(out, " Temporal Variance    : {:.2}", features.temporal_variance)?;
        writeln!(out, " Motion Variance      : {:.2}", features.motion_variance)?;
        writeln!(out, " Person Detection     : {}", report.assessment.detection)?;
        writeln!(out, " Confidence Level     : {}", report.assessment.confidence)?;
        writeln!(out, "{rule}\n")?;
    }

    writeln!(out, "Detection Complete.")
}

pub fn write_json<W: Write>(out: &mut W, reports: &[ScenarioReport]) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut *out, reports)?;
    writeln!(out).map_err(serde_json::Error::io)
}

//! Presence classification against an empty-room baseline.
//!
//! Three features are extracted from a capture:
//!
//! - **mean energy**: mean absolute raw sample value,
//! - **temporal variance**: variance of the preprocessed matrix,
//! - **motion variance**: variance of the smoothed motion path.
//!
//! Classification only looks at how far the motion variance moved relative
//! to the baseline. The energy deviation is reported alongside it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::CsiCapture;
use crate::dsp;

/// Guards the relative deviations against a silent baseline.
const EPSILON: f64 = 1e-6;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("thresholds must be finite and increasing, got still={still} walking={walking} crowd={crowd}")]
    InvalidThresholds { still: f64, walking: f64, crowd: f64 },

    #[error("smoothing width must be between 0 and {max} frames, got {0}", max = crate::dsp::MAX_SIGMA)]
    InvalidSigma(f64),

    #[error("need at least {needed} frames, got {got}")]
    TooFewFrames { needed: usize, got: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Features {
    pub mean_energy: f64,
    pub temporal_variance: f64,
    pub motion_variance: f64,
}

impl Features {
    pub fn extract(capture: &CsiCapture, sigma: f64) -> Self {
        let processed = dsp::preprocess(capture, sigma);
        let path = dsp::motion_path_of(&processed, sigma);
        let mean_energy =
            capture.values().iter().map(|v| v.abs()).sum::<f64>() / capture.values().len() as f64;

        Self {
            mean_energy,
            temporal_variance: dsp::variance(processed.values()),
            motion_variance: dsp::variance(&path),
        }
    }
}

/// Relative motion deviation boundaries between the detection classes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub still: f64,
    pub walking: f64,
    pub crowd: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            still: 0.5,
            walking: 3.0,
            crowd: 8.0,
        }
    }
}

impl Thresholds {
    pub fn new(still: f64, walking: f64, crowd: f64) -> Result<Self, AnalysisError> {
        let ordered = still.is_finite()
            && walking.is_finite()
            && crowd.is_finite()
            && still <= walking
            && walking <= crowd;
        if !ordered {
            return Err(AnalysisError::InvalidThresholds {
                still,
                walking,
                crowd,
            });
        }
        Ok(Self {
            still,
            walking,
            crowd,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detection {
    NoPerson,
    PersonStill,
    PersonWalking,
    MultiplePeople,
}

impl Detection {
    pub fn label(self) -> &'static str {
        match self {
            Self::NoPerson => "NO PERSON DETECTED",
            Self::PersonStill => "PERSON PRESENT (STILL)",
            Self::PersonWalking => "PERSON WALKING",
            Self::MultiplePeople => "MULTIPLE PEOPLE / HIGH ACTIVITY",
        }
    }

    pub fn confidence(self) -> Confidence {
        match self {
            Self::NoPerson | Self::PersonWalking => Confidence::High,
            Self::PersonStill => Confidence::MediumHigh,
            Self::MultiplePeople => Confidence::VeryHigh,
        }
    }

    pub fn is_occupied(self) -> bool {
        self != Self::NoPerson
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    MediumHigh,
    High,
    VeryHigh,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MediumHigh => "Medium-High",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub detection: Detection,
    pub confidence: Confidence,
    /// Energy deviation relative to the baseline.
    pub z_energy: f64,
    /// Motion variance deviation relative to the baseline.
    pub z_motion: f64,
}

fn relative_deviation(value: f64, baseline: f64) -> f64 {
    (value - baseline) / (baseline + EPSILON)
}

pub fn classify(features: &Features, baseline: &Features, thresholds: &Thresholds) -> Assessment {
    let z_energy = relative_deviation(features.mean_energy, baseline.mean_energy);
    let z_motion = relative_deviation(features.motion_variance, baseline.motion_variance);

    let detection = if z_motion < thresholds.still {
        Detection::NoPerson
    } else if z_motion < thresholds.walking {
        Detection::PersonStill
    } else if z_motion < thresholds.crowd {
        Detection::PersonWalking
    } else {
        Detection::MultiplePeople
    };

    Assessment {
        detection,
        confidence: detection.confidence(),
        z_energy,
        z_motion,
    }
}

//! Signal conditioning for CSI matrices.

use crate::capture::CsiCapture;

/// Default Gaussian smoothing width, in frames.
pub const DEFAULT_SIGMA: f64 = 2.0;

/// Widest smoothing accepted, in frames. Wider requests are clamped to it.
pub const MAX_SIGMA: f64 = 1024.0;

/// Kernel half-width, in standard deviations.
const TRUNCATE: f64 = 4.0;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Normalised Gaussian weights covering `round(4 * sigma)` samples on each
/// side of the centre. A width too small to resolve is the identity.
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    if sigma.is_nan() || sigma <= 0.0 {
        return vec![1.0];
    }
    let sigma = sigma.min(MAX_SIGMA);
    if !(sigma * sigma).is_normal() {
        return vec![1.0];
    }
    let radius = (TRUNCATE * sigma + 0.5) as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| {
            let x = x as f64;
            (-0.5 * x * x / (sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Half-sample symmetric reflection: `d c b a | a b c d | d c b a`.
fn reflect(index: isize, len: usize) -> usize {
    let period = 2 * len as isize;
    let folded = index.rem_euclid(period) as usize;
    if folded < len { folded } else { 2 * len - 1 - folded }
}

/// One-dimensional Gaussian smoothing with reflected edges.
pub fn gaussian_filter1d(signal: &[f64], sigma: f64) -> Vec<f64> {
    if signal.is_empty() {
        return Vec::new();
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    let len = signal.len();
    let period = 2 * len;

    // (offset, weight) taps. Reflection repeats every `period` samples, so a
    // kernel wider than that is folded onto one period first.
    let taps: Vec<(isize, f64)> = if kernel.len() <= period {
        kernel
            .iter()
            .enumerate()
            .map(|(k, &w)| (k as isize - radius, w))
            .collect()
    } else {
        let mut folded = vec![0.0; period];
        for (k, w) in kernel.iter().enumerate() {
            folded[(k as isize - radius).rem_euclid(period as isize) as usize] += w;
        }
        folded
            .into_iter()
            .enumerate()
            .map(|(phase, w)| (phase as isize, w))
            .collect()
    };

    (0..len as isize)
        .map(|centre| {
            taps.iter()
                .map(|&(offset, w)| w * signal[reflect(centre + offset, len)])
                .sum::<f64>()
        })
        .collect()
}

/// Mean absolute sample value of every frame.
pub fn energy_series(capture: &CsiCapture) -> Vec<f64> {
    capture
        .rows()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>() / row.len() as f64)
        .collect()
}

/// Removes the static component of every subcarrier, takes the magnitude of
/// what is left and smooths it over time.
pub fn preprocess(capture: &CsiCapture, sigma: f64) -> CsiCapture {
    let width = capture.width();
    let frames = capture.frames();
    let mut data = vec![0.0; width * frames];

    for column in 0..width {
        let series = capture.column(column);
        let static_level = mean(&series);
        let residual: Vec<f64> = series.iter().map(|v| (v - static_level).abs()).collect();
        for (frame, value) in gaussian_filter1d(&residual, sigma).into_iter().enumerate() {
            data[frame * width + column] = value;
        }
    }

    CsiCapture::from_matrix(width, data)
}

/// Energy-weighted centroid of the preprocessed frame: the subcarrier index
/// where motion energy concentrates. An all-zero frame maps to index 0.
pub fn centroid(frame: &[f64]) -> f64 {
    let total: f64 = frame.iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    frame
        .iter()
        .enumerate()
        .map(|(i, v)| i as f64 * v)
        .sum::<f64>()
        / total
}

/// Smoothed per-frame centroid track of a capture.
pub fn motion_path(capture: &CsiCapture, sigma: f64) -> Vec<f64> {
    motion_path_of(&preprocess(capture, sigma), sigma)
}

pub(crate) fn motion_path_of(processed: &CsiCapture, sigma: f64) -> Vec<f64> {
    let raw: Vec<f64> = processed.rows().map(centroid).collect();
    gaussian_filter1d(&raw, sigma)
}

/// Global z-score of every sample; a flat capture is divided by 1.
pub fn normalize_for_display(capture: &CsiCapture) -> CsiCapture {
    let values = capture.values();
    let m = mean(values);
    let std = variance(values).sqrt();
    let std = if std == 0.0 { 1.0 } else { std };
    CsiCapture::from_matrix(
        capture.width(),
        values.iter().map(|v| (v - m) / std).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    fn capture(rows: &[&[i32]]) -> CsiCapture {
        CsiCapture::from_rows(rows).unwrap()
    }

    #[test]
    fn kernel_is_normalised_and_symmetric() {
        let kernel = gaussian_kernel(2.0);
        assert_eq!(kernel.len(), 17);
        assert!(close(kernel.iter().sum(), 1.0));
        for i in 0..kernel.len() / 2 {
            assert!(close(kernel[i], kernel[kernel.len() - 1 - i]));
        }
        assert!(kernel[8] > kernel[7]);
    }

    #[test]
    fn zero_sigma_is_identity() {
        let signal = [3.0, -1.0, 4.0];
        assert_eq!(gaussian_filter1d(&signal, 0.0), signal.to_vec());
    }

    #[test]
    fn vanishing_sigma_is_identity() {
        let signal = [1.0, 2.0];
        assert_eq!(gaussian_filter1d(&signal, 1e-200), signal.to_vec());
        assert_eq!(gaussian_filter1d(&signal, f64::NAN), signal.to_vec());
    }

    #[test]
    fn huge_sigma_flattens_to_the_mean() {
        let smoothed = gaussian_filter1d(&[1.0, 2.0], 1e18);
        assert_eq!(smoothed.len(), 2);
        assert!(smoothed.iter().all(|&v| (v - 1.5).abs() < 1e-6));
    }

    #[test]
    fn folded_kernel_matches_the_direct_sum() {
        let signal = [3.0, -1.0, 4.0];
        let kernel = gaussian_kernel(2.0);
        let radius = (kernel.len() / 2) as isize;
        let expected: Vec<f64> = (0..3)
            .map(|centre| {
                kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * signal[reflect(centre + k as isize - radius, 3)])
                    .sum()
            })
            .collect();
        let smoothed = gaussian_filter1d(&signal, 2.0);
        for (got, want) in smoothed.iter().zip(&expected) {
            assert!(close(*got, *want));
        }
    }

    #[test]
    fn reflection_indices() {
        // d c b a | a b c d | d c b a
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-4, 4), 3);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(7, 4), 0);
        assert_eq!(reflect(8, 4), 0);
        assert_eq!(reflect(-3, 1), 0);
    }

    #[test]
    fn smoothing_preserves_constants() {
        let smoothed = gaussian_filter1d(&[5.0; 6], 2.0);
        assert!(smoothed.iter().all(|&v| close(v, 5.0)));
    }

    #[test]
    fn smoothing_spreads_an_impulse() {
        let mut signal = vec![0.0; 21];
        signal[10] = 1.0;
        let smoothed = gaussian_filter1d(&signal, 2.0);
        let kernel = gaussian_kernel(2.0);
        for (i, w) in kernel.iter().enumerate() {
            assert!(close(smoothed[2 + i], *w));
        }
        assert!(close(smoothed.iter().sum(), 1.0));
    }

    #[test]
    fn population_variance() {
        assert!(close(variance(&[1.0, 2.0, 3.0, 4.0]), 1.25));
        assert_eq!(variance(&[]), 0.0);
    }

    #[test]
    fn energy_is_mean_absolute_value() {
        let energy = energy_series(&capture(&[&[1, -3], &[0, 0], &[-2, 2]]));
        assert_eq!(energy, vec![2.0, 0.0, 2.0]);
    }

    #[test]
    fn static_channel_preprocesses_to_zero() {
        let processed = preprocess(&capture(&[&[5, -7], &[5, -7], &[5, -7]]), 2.0);
        assert!(processed.values().iter().all(|&v| close(v, 0.0)));
    }

    #[test]
    fn preprocess_removes_column_mean() {
        let processed = preprocess(&capture(&[&[1, 10], &[3, 10]]), 0.0);
        assert_eq!(processed.values(), &[1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn centroid_weights_indices() {
        assert!(close(centroid(&[0.0, 0.0, 4.0]), 2.0));
        assert!(close(centroid(&[1.0, 0.0, 1.0]), 1.0));
        assert_eq!(centroid(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn motion_follows_the_active_subcarrier() {
        // Activity only on the last of four subcarriers.
        let rows: Vec<Vec<i32>> = (0..10)
            .map(|t| vec![0, 0, 0, if t % 2 == 0 { 8 } else { -8 }])
            .collect();
        let path = motion_path(&CsiCapture::from_rows(&rows).unwrap(), 2.0);
        assert_eq!(path.len(), 10);
        assert!(path.iter().all(|&p| close(p, 3.0)));
    }

    #[test]
    fn display_normalisation() {
        let normalized = normalize_for_display(&capture(&[&[1, 3], &[1, 3]]));
        assert_eq!(normalized.values(), &[-1.0, 1.0, -1.0, 1.0]);

        let flat = normalize_for_display(&capture(&[&[4, 4]]));
        assert_eq!(flat.values(), &[0.0, 0.0]);
    }
}

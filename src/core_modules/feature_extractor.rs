// THEORY:
// The `feature_extractor` module turns a validated `Raster` into the engine's
// fixed vocabulary of scalar signals. It is a stateless utility: every value in
// the `FeatureVector` is recomputed from the pixels on each call, so two calls
// on the same buffer are bit-identical.
//
// The signals come in two flavors:
// 1.  **Scaled severity signals** (`dark_area_ratio`, `contrast_level`,
//     `edge_intensity`, `hist_variance`), each recentered into [0, 1] with a
//     fixed calibration gain. The raw quantities are naturally tiny (an edge
//     ratio of 0.05 is a *lot* of edges), so the gains give the downstream
//     fusion a usable dynamic range. The gains are load-bearing: the fusion
//     weights and tier thresholds were tuned against exactly these scales.
// 2.  **Raw validity signals** (`color_divergence`, `peak_count`,
//     `dark_ratio_raw`, `bright_ratio_raw`), consumed only by the plausibility
//     gate, which applies its own banded scoring to them.
//
// The granular functions are public so the validity gate can compute just the
// subset it needs without paying for a full extraction.

use crate::core_modules::histogram::Histogram;
use crate::core_modules::raster::Raster;
use crate::core_modules::edge_detector;
use serde::Serialize;

/// Intensities strictly below this count as "dark".
pub const DARK_INTENSITY_THRESHOLD: u8 = 80;
/// Intensities strictly above this count as "bright".
pub const BRIGHT_INTENSITY_THRESHOLD: u8 = 150;

/// Gain recentering the raw dark fraction into [0, 1].
const DARK_RATIO_GAIN: f64 = 2.0;
/// Typical std-dev ceiling for 8-bit medical grayscale images.
const CONTRAST_NORMALIZATION: f64 = 70.0;
/// Gain recentering the naturally tiny edge-pixel ratio.
const EDGE_RATIO_GAIN: f64 = 10.0;
/// Gain recentering the variance of the normalized histogram.
const HIST_VARIANCE_GAIN: f64 = 10_000.0;

/// The fixed-shape record of scalar signals derived from one raster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    /// Scaled fraction of dark pixels, in [0, 1].
    pub dark_area_ratio: f64,
    /// Intensity std-dev normalized by the calibration ceiling, in [0, 1].
    pub contrast_level: f64,
    /// Scaled edge-pixel ratio, in [0, 1].
    pub edge_intensity: f64,
    /// Scaled variance of the normalized intensity histogram, in [0, 1].
    pub hist_variance: f64,
    /// Mean std-dev of the pairwise channel-difference planes (unbounded).
    pub color_divergence: f64,
    /// Dominant modes of the smoothed histogram.
    pub peak_count: usize,
    /// Unscaled fraction of dark pixels.
    pub dark_ratio_raw: f64,
    /// Unscaled fraction of bright pixels.
    pub bright_ratio_raw: f64,
}

/// Computes the full feature vector for a raster.
pub fn extract(raster: &Raster) -> FeatureVector {
    let plane = raster.luminance_plane();
    let (dark_ratio_raw, bright_ratio_raw) = dark_bright_fractions(&plane);
    let std_dev = intensity_std_dev(&plane);
    let edge_ratio =
        edge_detector::edge_pixel_ratio(&plane, raster.width() as usize, raster.height() as usize);
    let histogram = Histogram::of_plane(&plane);

    FeatureVector {
        dark_area_ratio: (dark_ratio_raw * DARK_RATIO_GAIN).clamp(0.0, 1.0),
        contrast_level: (std_dev / CONTRAST_NORMALIZATION).clamp(0.0, 1.0),
        edge_intensity: (edge_ratio * EDGE_RATIO_GAIN).clamp(0.0, 1.0),
        hist_variance: (histogram.normalized_variance() * HIST_VARIANCE_GAIN).clamp(0.0, 1.0),
        color_divergence: color_divergence(raster),
        peak_count: histogram.dominant_peak_count().unwrap_or_default(),
        dark_ratio_raw,
        bright_ratio_raw,
    }
}

/// Unscaled fractions of dark (< 80) and bright (> 150) pixels.
pub fn dark_bright_fractions(plane: &[u8]) -> (f64, f64) {
    if plane.is_empty() {
        return (0.0, 0.0);
    }
    let mut dark = 0usize;
    let mut bright = 0usize;
    for &intensity in plane {
        if intensity < DARK_INTENSITY_THRESHOLD {
            dark += 1;
        } else if intensity > BRIGHT_INTENSITY_THRESHOLD {
            bright += 1;
        }
    }
    let total = plane.len() as f64;
    (dark as f64 / total, bright as f64 / total)
}

/// Population standard deviation of the intensity plane.
pub fn intensity_std_dev(plane: &[u8]) -> f64 {
    if plane.is_empty() {
        return 0.0;
    }
    let n = plane.len() as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for &intensity in plane {
        let v = intensity as f64;
        sum += v;
        sum_sq += v * v;
    }
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0).sqrt()
}

/// Mean of the std-devs of the three pairwise channel-difference planes.
/// Near zero for grayscale-like images; large for genuinely colorful ones.
/// Single-channel rasters have no spread by definition.
pub fn color_divergence(raster: &Raster) -> f64 {
    if raster.channels() == 1 {
        return 0.0;
    }

    let n = raster.pixel_count() as f64;
    if n == 0.0 {
        return 0.0;
    }

    // One pass accumulating sum and sum-of-squares per difference plane.
    let mut acc = [[0.0f64; 2]; 3];
    for pixel in raster.pixels() {
        let diffs = [
            pixel.blue as f64 - pixel.green as f64,
            pixel.blue as f64 - pixel.red as f64,
            pixel.green as f64 - pixel.red as f64,
        ];
        for (slot, diff) in acc.iter_mut().zip(diffs) {
            slot[0] += diff;
            slot[1] += diff * diff;
        }
    }

    let std_sum: f64 = acc
        .iter()
        .map(|[sum, sum_sq]| {
            let mean = sum / n;
            (sum_sq / n - mean * mean).max(0.0).sqrt()
        })
        .sum();
    std_sum / 3.0
}

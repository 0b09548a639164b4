// THEORY:
// The `validity` module is the radiograph plausibility gate: before any disease
// inference runs, it judges whether the pixels in front of it could be a dental
// X-ray at all. Nothing here is learned; four independent sub-scores, each 0-100,
// are fused with fixed weights into a confidence and a hard accept/reject.
//
// The sub-scores each capture one property a dental radiograph reliably has:
// 1.  **Color**: radiographs are grayscale (or faintly tinted), so the channel
//     divergence should be small.
// 2.  **Contrast**: bone against background gives a characteristic mid-high
//     intensity spread; both flat and extreme spreads are suspicious.
// 3.  **Histogram pattern**: dark background plus bright enamel makes the
//     intensity histogram bimodal, occasionally trimodal.
// 4.  **Brightness balance**: a real exposure carries substantial dark *and*
//     bright area at the same time.
//
// Every threshold ladder is an ordered boundary table rather than a nested
// conditional, so the behavior at the band edges is explicit and testable.
// A rejection always carries exactly one human-readable reason, chosen by
// priority: color, then contrast, then histogram, then a generic mismatch.

use crate::core_modules::feature_extractor;
use crate::core_modules::histogram::Histogram;
use crate::core_modules::raster::Raster;
use serde::Serialize;

/// Fusion weights: color, contrast, histogram pattern, brightness balance.
const COLOR_WEIGHT: f64 = 0.30;
const CONTRAST_WEIGHT: f64 = 0.25;
const HISTOGRAM_WEIGHT: f64 = 0.25;
const BRIGHTNESS_WEIGHT: f64 = 0.20;

/// Fused scores at or above this are accepted.
const ACCEPTANCE_THRESHOLD: f64 = 60.0;

/// A sub-score below this is weak enough to name in the rejection reason.
const WEAK_SUBSCORE: f64 = 50.0;

pub const REASON_TOO_COLORFUL: &str =
    "image is too colorful for an X-ray (radiographs are grayscale)";
pub const REASON_LOW_CONTRAST: &str = "low contrast, not characteristic of an X-ray";
pub const REASON_BRIGHTNESS_MISMATCH: &str =
    "brightness distribution doesn't match a dental radiograph";
pub const REASON_GENERIC: &str = "image characteristics don't match a dental radiograph";

/// The gate's immutable output: accept/reject, a 0-100 confidence, and a
/// human-readable reason (empty exactly when valid).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidityVerdict {
    pub is_valid: bool,
    pub confidence: f64,
    pub reason: String,
}

impl ValidityVerdict {
    /// A decode failure is reported directly, never routed through the fusion.
    pub fn unreadable(detail: impl std::fmt::Display) -> Self {
        Self {
            is_valid: false,
            confidence: 0.0,
            reason: format!("unreadable image: {detail}"),
        }
    }
}

/// Upper-bound boundary table: first band whose bound exceeds the value wins.
const COLOR_SCORE_BANDS: [(f64, f64); 4] = [(15.0, 100.0), (30.0, 80.0), (50.0, 60.0), (80.0, 30.0)];

/// Nested inclusive ranges, tightest first.
const CONTRAST_SCORE_BANDS: [(f64, f64, f64); 3] =
    [(40.0, 70.0, 100.0), (30.0, 80.0, 70.0), (20.0, 90.0, 40.0)];

/// Sub-score for channel divergence: the closer to grayscale, the higher.
pub fn color_score(color_divergence: f64) -> f64 {
    for (bound, score) in COLOR_SCORE_BANDS {
        if color_divergence < bound {
            return score;
        }
    }
    0.0
}

/// Sub-score for the raw grayscale std-dev (not the normalized contrast level).
pub fn contrast_score(std_dev: f64) -> f64 {
    for (lo, hi, score) in CONTRAST_SCORE_BANDS {
        if std_dev >= lo && std_dev <= hi {
            return score;
        }
    }
    20.0
}

/// Sub-score for histogram modality. `None` means peak detection was
/// unavailable and the variance fallback is used instead.
pub fn histogram_pattern_score(peak_count: Option<usize>, histogram: &Histogram) -> f64 {
    match peak_count {
        Some(2 | 3) => 100.0,
        Some(1 | 4) => 60.0,
        Some(_) => 30.0,
        None => variance_fallback_score(histogram),
    }
}

/// Best-effort stand-in for the modality signal when peak detection is
/// unavailable: raw-count variance thresholded as "likely multi-modal".
/// A coarser signal under a different threshold than the primary path;
/// a known accuracy gap, kept as calibrated.
pub fn variance_fallback_score(histogram: &Histogram) -> f64 {
    if histogram.raw_variance() > 1000.0 {
        70.0
    } else {
        40.0
    }
}

/// Additive sub-score for the dark/bright area balance (max 100).
pub fn brightness_score(dark_ratio: f64, bright_ratio: f64) -> f64 {
    let mut score = 0.0;
    if (0.2..=0.5).contains(&dark_ratio) {
        score += 50.0;
    } else if (0.1..=0.6).contains(&dark_ratio) {
        score += 30.0;
    }
    if (0.1..=0.4).contains(&bright_ratio) {
        score += 50.0;
    } else if (0.05..=0.5).contains(&bright_ratio) {
        score += 30.0;
    }
    score
}

/// Weighted fusion of the four sub-scores into a 0-100 confidence.
pub fn fuse_sub_scores(color: f64, contrast: f64, histogram: f64, brightness: f64) -> f64 {
    COLOR_WEIGHT * color
        + CONTRAST_WEIGHT * contrast
        + HISTOGRAM_WEIGHT * histogram
        + BRIGHTNESS_WEIGHT * brightness
}

/// Runs the full plausibility gate over a raster.
///
/// Only the restricted subset of signals the gate needs is computed; the full
/// severity feature vector is not required here.
pub fn check_validity(raster: &Raster) -> ValidityVerdict {
    let plane = raster.luminance_plane();
    let histogram = Histogram::of_plane(&plane);
    let (dark_ratio, bright_ratio) = feature_extractor::dark_bright_fractions(&plane);

    let color = color_score(feature_extractor::color_divergence(raster));
    let contrast = contrast_score(feature_extractor::intensity_std_dev(&plane));
    let pattern = histogram_pattern_score(histogram.dominant_peak_count(), &histogram);
    let brightness = brightness_score(dark_ratio, bright_ratio);

    let confidence = fuse_sub_scores(color, contrast, pattern, brightness);
    let is_valid = confidence >= ACCEPTANCE_THRESHOLD;

    let reason = if is_valid {
        String::new()
    } else if color < WEAK_SUBSCORE {
        REASON_TOO_COLORFUL.to_string()
    } else if contrast < WEAK_SUBSCORE {
        REASON_LOW_CONTRAST.to_string()
    } else if pattern < WEAK_SUBSCORE {
        REASON_BRIGHTNESS_MISMATCH.to_string()
    } else {
        REASON_GENERIC.to_string()
    };

    ValidityVerdict {
        is_valid,
        confidence,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::raster::Raster;

    fn gray_raster(plane: Vec<u8>, width: u32, height: u32) -> Raster {
        Raster::from_buffer(width, height, 1, plane).expect("valid raster")
    }

    /// A 100x100 grayscale plane shaped like a plausible radiograph:
    /// 35% dark background (20), 40% mid-tone tissue (120), 25% bright
    /// enamel (200). Std-dev ~69.8, three well-separated histogram modes.
    fn radiograph_like_plane() -> Vec<u8> {
        let mut plane = Vec::with_capacity(10_000);
        plane.extend(std::iter::repeat_n(20u8, 3_500));
        plane.extend(std::iter::repeat_n(120u8, 4_000));
        plane.extend(std::iter::repeat_n(200u8, 2_500));
        plane
    }

    #[test]
    fn color_bands_step_at_the_documented_bounds() {
        assert_eq!(color_score(0.0), 100.0);
        assert_eq!(color_score(14.999), 100.0);
        assert_eq!(color_score(15.0), 80.0);
        assert_eq!(color_score(29.999), 80.0);
        assert_eq!(color_score(30.0), 60.0);
        assert_eq!(color_score(50.0), 30.0);
        assert_eq!(color_score(80.0), 0.0);
        assert_eq!(color_score(200.0), 0.0);
    }

    #[test]
    fn contrast_bands_are_inclusive_and_nested() {
        assert_eq!(contrast_score(40.0), 100.0);
        assert_eq!(contrast_score(70.0), 100.0);
        assert_eq!(contrast_score(39.999), 70.0);
        assert_eq!(contrast_score(80.0), 70.0);
        assert_eq!(contrast_score(20.0), 40.0);
        assert_eq!(contrast_score(90.0), 40.0);
        assert_eq!(contrast_score(10.0), 20.0);
        assert_eq!(contrast_score(120.0), 20.0);
    }

    #[test]
    fn histogram_pattern_rewards_bimodal_shapes() {
        let hist = Histogram::of_plane(&[0; 4]);
        assert_eq!(histogram_pattern_score(Some(2), &hist), 100.0);
        assert_eq!(histogram_pattern_score(Some(3), &hist), 100.0);
        assert_eq!(histogram_pattern_score(Some(1), &hist), 60.0);
        assert_eq!(histogram_pattern_score(Some(4), &hist), 60.0);
        assert_eq!(histogram_pattern_score(Some(0), &hist), 30.0);
        assert_eq!(histogram_pattern_score(Some(7), &hist), 30.0);
    }

    #[test]
    fn variance_fallback_uses_its_own_threshold() {
        let spiky = Histogram::of_plane(&[10u8; 5_000]);
        assert_eq!(histogram_pattern_score(None, &spiky), 70.0);

        let flat_plane: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let flat = Histogram::of_plane(&flat_plane);
        assert_eq!(histogram_pattern_score(None, &flat), 40.0);
    }

    #[test]
    fn brightness_score_is_additive() {
        assert_eq!(brightness_score(0.35, 0.25), 100.0);
        assert_eq!(brightness_score(0.35, 0.0), 50.0);
        assert_eq!(brightness_score(0.08, 0.25), 80.0);
        assert_eq!(brightness_score(0.55, 0.45), 60.0);
        assert_eq!(brightness_score(0.0, 0.0), 0.0);
        assert_eq!(brightness_score(0.9, 0.9), 0.0);
    }

    #[test]
    fn documented_synthetic_case_clears_every_sub_score() {
        // Canonical plausible-radiograph signals: dark 0.35, bright 0.25,
        // std-dev 55, 2 histogram peaks.
        let color = color_score(0.0);
        let contrast = contrast_score(55.0);
        let hist = Histogram::of_plane(&[0; 4]);
        let pattern = histogram_pattern_score(Some(2), &hist);
        let brightness = brightness_score(0.35, 0.25);
        assert!(color >= 60.0 && contrast >= 60.0 && pattern >= 60.0 && brightness >= 60.0);
        assert!(fuse_sub_scores(color, contrast, pattern, brightness) >= 60.0);
    }

    #[test]
    fn radiograph_like_raster_passes_the_gate() {
        let verdict = check_validity(&gray_raster(radiograph_like_plane(), 100, 100));
        assert!(verdict.is_valid, "confidence was {}", verdict.confidence);
        assert!(verdict.reason.is_empty());
        assert!(verdict.confidence <= 100.0);
    }

    #[test]
    fn saturated_color_image_is_rejected_as_too_colorful() {
        // Half (255,0,0), half (0,0,0): channel divergence 85, color score 0.
        let mut data = Vec::with_capacity(64 * 64 * 3);
        for i in 0..64 * 64 {
            if i % 2 == 0 {
                data.extend_from_slice(&[255, 0, 0]);
            } else {
                data.extend_from_slice(&[0, 0, 0]);
            }
        }
        let raster = Raster::from_buffer(64, 64, 3, data).expect("valid raster");
        let verdict = check_validity(&raster);
        assert!(!verdict.is_valid);
        assert_eq!(verdict.reason, REASON_TOO_COLORFUL);
    }

    #[test]
    fn flat_gray_image_is_rejected_for_contrast() {
        let verdict = check_validity(&gray_raster(vec![128u8; 64 * 64], 64, 64));
        assert!(!verdict.is_valid);
        assert_eq!(verdict.reason, REASON_LOW_CONTRAST);
    }

    #[test]
    fn verdict_is_idempotent() {
        let raster = gray_raster(radiograph_like_plane(), 100, 100);
        assert_eq!(check_validity(&raster), check_validity(&raster));
    }

    #[test]
    fn decode_failures_bypass_the_fusion() {
        let verdict = ValidityVerdict::unreadable("corrupt header");
        assert!(!verdict.is_valid);
        assert_eq!(verdict.confidence, 0.0);
        assert!(verdict.reason.contains("unreadable image"));
    }
}

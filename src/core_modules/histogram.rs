// THEORY:
// The `Histogram` module summarizes an intensity plane as a 256-bin count
// vector and answers the two questions the scorers ask of it:
//
// 1.  **How spread out is the distribution?** The variance of the normalized
//     bins feeds the severity fusion; the variance of the raw counts is the
//     fallback signal for modality when peak detection is unavailable.
// 2.  **How many modes does it have?** Dental radiographs are characteristically
//     bimodal (dark background, bright enamel). The histogram is smoothed with a
//     Gaussian kernel and scanned for local maxima, which are then thinned by a
//     minimum inter-peak spacing (higher peak wins) and a minimum prominence.
//
// The smoothing and peak-selection semantics deliberately mirror the classic
// signal-processing formulation (reflect-padded Gaussian filter, distance
// selection before prominence selection) so the calibrated thresholds keep
// their meaning.

const BINS: usize = 256;

/// Gaussian smoothing width applied before peak detection.
const SMOOTHING_SIGMA: f64 = 5.0;
/// The kernel is truncated at this many standard deviations.
const SMOOTHING_TRUNCATE: f64 = 4.0;
/// Minimum spacing between surviving peaks, in bins.
const PEAK_MIN_DISTANCE: usize = 30;
/// Minimum prominence of a surviving peak, in histogram-count units.
const PEAK_MIN_PROMINENCE: f64 = 100.0;

/// A 256-bin intensity histogram over an 8-bit grayscale plane.
#[derive(Debug, Clone)]
pub struct Histogram {
    counts: [u64; BINS],
}

impl Histogram {
    pub fn of_plane(plane: &[u8]) -> Self {
        let mut counts = [0u64; BINS];
        for &intensity in plane {
            counts[intensity as usize] += 1;
        }
        Self { counts }
    }

    pub fn counts(&self) -> &[u64; BINS] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Population variance of the raw bin counts (the fallback modality signal).
    pub fn raw_variance(&self) -> f64 {
        population_variance(&self.counts.map(|c| c as f64))
    }

    /// Population variance of the bins after normalizing them to sum to 1.
    /// Zero for an empty plane.
    pub fn normalized_variance(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let normalized = self.counts.map(|c| c as f64 / total as f64);
        population_variance(&normalized)
    }

    /// The bin counts convolved with a reflect-padded Gaussian kernel.
    pub fn smoothed(&self, sigma: f64) -> Vec<f64> {
        let radius = (SMOOTHING_TRUNCATE * sigma + 0.5) as isize;
        let mut kernel = Vec::with_capacity(2 * radius as usize + 1);
        for k in -radius..=radius {
            kernel.push((-(k * k) as f64 / (2.0 * sigma * sigma)).exp());
        }
        let norm: f64 = kernel.iter().sum();

        let n = BINS as isize;
        let mut smoothed = vec![0.0; BINS];
        for (i, slot) in smoothed.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let mut idx = i as isize + k as isize - radius;
                // Reflect about the array edges: -1 -> 0, n -> n - 1.
                if idx < 0 {
                    idx = -idx - 1;
                }
                if idx >= n {
                    idx = 2 * n - idx - 1;
                }
                acc += weight * self.counts[idx as usize] as f64;
            }
            *slot = acc / norm;
        }
        smoothed
    }

    /// Counts the dominant modes of the smoothed histogram under the calibrated
    /// spacing and prominence constraints. Returns `None` when peak detection is
    /// unavailable (an empty plane yields no meaningful signal) so the caller
    /// can fall back to the raw-variance approximation.
    pub fn dominant_peak_count(&self) -> Option<usize> {
        if self.total() == 0 {
            return None;
        }
        let smoothed = self.smoothed(SMOOTHING_SIGMA);
        let maxima = local_maxima(&smoothed);
        let spaced = select_by_distance(&smoothed, maxima, PEAK_MIN_DISTANCE);
        let count = spaced
            .into_iter()
            .filter(|&peak| prominence(&smoothed, peak) >= PEAK_MIN_PROMINENCE)
            .count();
        Some(count)
    }
}

fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

/// Interior local maxima, with plateaus collapsed to their midpoint.
fn local_maxima(signal: &[f64]) -> Vec<usize> {
    let n = signal.len();
    let mut peaks = Vec::new();
    let mut i = 1;
    while i + 1 < n {
        if signal[i - 1] < signal[i] {
            // Walk across any plateau of equal values.
            let mut j = i;
            while j + 1 < n && signal[j + 1] == signal[i] {
                j += 1;
            }
            if j + 1 < n && signal[j + 1] < signal[i] {
                peaks.push((i + j) / 2);
                i = j;
            }
        }
        i += 1;
    }
    peaks
}

/// Thins peaks closer together than `distance` bins; the higher peak survives.
fn select_by_distance(signal: &[f64], peaks: Vec<usize>, distance: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| {
        signal[peaks[b]]
            .partial_cmp(&signal[peaks[a]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut removed = vec![false; peaks.len()];
    for &k in &order {
        if removed[k] {
            continue;
        }
        for (j, &pos) in peaks.iter().enumerate() {
            if j != k && pos.abs_diff(peaks[k]) < distance {
                removed[j] = true;
            }
        }
    }

    peaks
        .into_iter()
        .enumerate()
        .filter(|&(idx, _)| !removed[idx])
        .map(|(_, pos)| pos)
        .collect()
}

/// Height of a peak above the higher of its two surrounding valleys.
fn prominence(signal: &[f64], peak: usize) -> f64 {
    let height = signal[peak];

    let mut left_min = height;
    let mut i = peak;
    while i > 0 {
        i -= 1;
        if signal[i] > height {
            break;
        }
        left_min = left_min.min(signal[i]);
    }

    let mut right_min = height;
    let mut i = peak;
    while i + 1 < signal.len() {
        i += 1;
        if signal[i] > height {
            break;
        }
        right_min = right_min.min(signal[i]);
    }

    height - left_min.max(right_min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane_with_spikes(spikes: &[(u8, usize)]) -> Vec<u8> {
        let mut plane = Vec::new();
        for &(intensity, count) in spikes {
            plane.extend(std::iter::repeat_n(intensity, count));
        }
        plane
    }

    #[test]
    fn counts_every_sample_once() {
        let hist = Histogram::of_plane(&[0, 0, 255, 128]);
        assert_eq!(hist.counts()[0], 2);
        assert_eq!(hist.counts()[128], 1);
        assert_eq!(hist.counts()[255], 1);
        assert_eq!(hist.total(), 4);
    }

    #[test]
    fn smoothing_preserves_total_mass() {
        let plane = plane_with_spikes(&[(40, 3000), (200, 2000)]);
        let hist = Histogram::of_plane(&plane);
        let smoothed = hist.smoothed(5.0);
        let mass: f64 = smoothed.iter().sum();
        // Reflect padding keeps the kernel mass inside the array.
        assert!((mass - 5000.0).abs() < 1.0);
    }

    #[test]
    fn bimodal_plane_has_two_dominant_peaks() {
        let plane = plane_with_spikes(&[(40, 3500), (200, 2500), (120, 4000)]);
        let hist = Histogram::of_plane(&plane);
        assert_eq!(hist.dominant_peak_count(), Some(3));
    }

    #[test]
    fn close_modes_are_thinned_to_the_higher_one() {
        // Two distinct modes 20 bins apart: inside the 30-bin spacing, the
        // lower one must go.
        let plane = plane_with_spikes(&[(100, 4000), (120, 3000)]);
        let hist = Histogram::of_plane(&plane);
        assert_eq!(hist.dominant_peak_count(), Some(1));
    }

    #[test]
    fn faint_modes_fail_the_prominence_bar() {
        // 500 samples smear to a smoothed peak of ~40 counts, below 100.
        let plane = plane_with_spikes(&[(60, 500)]);
        let hist = Histogram::of_plane(&plane);
        assert_eq!(hist.dominant_peak_count(), Some(0));
    }

    #[test]
    fn empty_plane_reports_peaks_unavailable() {
        let hist = Histogram::of_plane(&[]);
        assert_eq!(hist.dominant_peak_count(), None);
    }

    #[test]
    fn uniform_plane_has_a_single_mode() {
        let plane = vec![128u8; 10_000];
        let hist = Histogram::of_plane(&plane);
        assert_eq!(hist.dominant_peak_count(), Some(1));
    }

    #[test]
    fn raw_variance_separates_spiky_from_flat() {
        let spiky = Histogram::of_plane(&plane_with_spikes(&[(10, 5000), (240, 5000)]));
        let flat_plane: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let flat = Histogram::of_plane(&flat_plane);
        assert!(spiky.raw_variance() > 1000.0);
        assert!(flat.raw_variance() < 1000.0);
    }

    #[test]
    fn normalized_variance_of_empty_plane_is_zero() {
        assert_eq!(Histogram::of_plane(&[]).normalized_variance(), 0.0);
    }
}

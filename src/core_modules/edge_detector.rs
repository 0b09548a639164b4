// THEORY:
// The `edge_detector` module measures how much fine structure an intensity
// plane contains. Fracture lines and lesion boundaries show up as edges, so the
// fraction of edge pixels is one of the four severity signals.
//
// The detector is the classic Canny cascade, kept deliberately small:
// 1.  **Sobel gradients** with clamped border indexing give per-pixel gx/gy.
// 2.  **L1 magnitude** (|gx| + |gy|) avoids a square root per pixel.
// 3.  **Non-maximum suppression** quantizes the gradient direction into four
//     bins and keeps a pixel only if it beats both neighbors along that
//     direction, thinning ridges to one-pixel lines. The comparison is strict
//     against the "previous" neighbor and non-strict against the "next" one so
//     a two-pixel-wide plateau keeps exactly one side.
// 4.  **Hysteresis** accepts strong responses outright and weak ones only when
//     they connect (8-neighborhood) to a strong one.
//
// The 50/150 thresholds are calibration constants; the downstream edge-ratio
// scaling depends on them.

/// Weak-edge admission threshold on the L1 gradient magnitude.
const HYSTERESIS_LOW: f64 = 50.0;
/// Strong-edge seed threshold on the L1 gradient magnitude.
const HYSTERESIS_HIGH: f64 = 150.0;

const SOBEL_KERNEL_X: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: [[f64; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

const TAN_22_5_DEG: f64 = 0.41421356237;

struct Gradients {
    gx: Vec<f64>,
    gy: Vec<f64>,
    mag: Vec<f64>,
}

fn sobel_gradients(plane: &[u8], width: usize, height: usize) -> Gradients {
    let mut gx = vec![0.0; plane.len()];
    let mut gy = vec![0.0; plane.len()];
    let mut mag = vec![0.0; plane.len()];

    for y in 0..height {
        let y_idx = [y.saturating_sub(1), y, (y + 1).min(height - 1)];
        for x in 0..width {
            let x_idx = [x.saturating_sub(1), x, (x + 1).min(width - 1)];

            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            for (ky, &yy) in y_idx.iter().enumerate() {
                for (kx, &xx) in x_idx.iter().enumerate() {
                    let sample = plane[yy * width + xx] as f64;
                    sum_x += SOBEL_KERNEL_X[ky][kx] * sample;
                    sum_y += SOBEL_KERNEL_Y[ky][kx] * sample;
                }
            }

            let idx = y * width + x;
            gx[idx] = sum_x;
            gy[idx] = sum_y;
            mag[idx] = sum_x.abs() + sum_y.abs();
        }
    }

    Gradients { gx, gy, mag }
}

/// The boolean edge mask of the plane after the full Canny cascade.
/// The outermost one-pixel frame is never marked.
pub fn edge_mask(plane: &[u8], width: usize, height: usize) -> Vec<bool> {
    let mut mask = vec![false; plane.len()];
    if width < 3 || height < 3 {
        return mask;
    }

    let grad = sobel_gradients(plane, width, height);

    // NMS: candidate pixels, split into strong seeds and weak links.
    let mut candidate = vec![false; plane.len()];
    let mut strong_seeds = Vec::new();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let idx = y * width + x;
            let mag = grad.mag[idx];
            if mag < HYSTERESIS_LOW {
                continue;
            }

            let gx = grad.gx[idx];
            let gy = grad.gy[idx];
            let abs_gx = gx.abs();
            let abs_gy = gy.abs();
            let same_sign = (gx >= 0.0 && gy >= 0.0) || (gx <= 0.0 && gy <= 0.0);

            let (prev, next) = if abs_gx >= abs_gy {
                if abs_gy <= abs_gx * TAN_22_5_DEG {
                    (grad.mag[idx - 1], grad.mag[idx + 1])
                } else if same_sign {
                    (grad.mag[idx - width + 1], grad.mag[idx + width - 1])
                } else {
                    (grad.mag[idx - width - 1], grad.mag[idx + width + 1])
                }
            } else if abs_gx <= abs_gy * TAN_22_5_DEG {
                (grad.mag[idx - width], grad.mag[idx + width])
            } else if same_sign {
                (grad.mag[idx - width + 1], grad.mag[idx + width - 1])
            } else {
                (grad.mag[idx - width - 1], grad.mag[idx + width + 1])
            };

            if mag > prev && mag >= next {
                candidate[idx] = true;
                if mag >= HYSTERESIS_HIGH {
                    strong_seeds.push(idx);
                }
            }
        }
    }

    // Hysteresis: flood outwards from strong seeds through connected weak
    // candidates (8-neighborhood BFS).
    let mut queue = strong_seeds;
    for &idx in &queue {
        mask[idx] = true;
    }
    while let Some(idx) = queue.pop() {
        let y = idx / width;
        let x = idx % width;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dy == 0 && dx == 0 {
                    continue;
                }
                let ny = y as i64 + dy;
                let nx = x as i64 + dx;
                if ny < 0 || ny >= height as i64 || nx < 0 || nx >= width as i64 {
                    continue;
                }
                let nidx = ny as usize * width + nx as usize;
                if candidate[nidx] && !mask[nidx] {
                    mask[nidx] = true;
                    queue.push(nidx);
                }
            }
        }
    }

    mask
}

/// Fraction of plane pixels marked as edges, in [0, 1].
pub fn edge_pixel_ratio(plane: &[u8], width: usize, height: usize) -> f64 {
    if plane.is_empty() {
        return 0.0;
    }
    let mask = edge_mask(plane, width, height);
    let edge_pixels = mask.iter().filter(|&&edge| edge).count();
    edge_pixels as f64 / plane.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_plane_has_no_edges() {
        let plane = vec![128u8; 64 * 64];
        assert_eq!(edge_pixel_ratio(&plane, 64, 64), 0.0);
    }

    #[test]
    fn step_edge_is_thinned_to_one_column() {
        // Left half black, right half white: NMS must keep a single column.
        let (width, height) = (8usize, 8usize);
        let mut plane = vec![0u8; width * height];
        for y in 0..height {
            for x in width / 2..width {
                plane[y * width + x] = 255;
            }
        }

        let mask = edge_mask(&plane, width, height);
        for y in 1..height - 1 {
            let marked: Vec<usize> = (0..width).filter(|&x| mask[y * width + x]).collect();
            assert_eq!(marked.len(), 1, "row {y} should hold one edge pixel");
        }
        // Frame rows stay unmarked.
        assert!((0..width).all(|x| !mask[x]));
    }

    #[test]
    fn faint_gradient_stays_below_hysteresis() {
        // A one-intensity-step ramp has |gx| = 4 everywhere, far below 50.
        let (width, height) = (32usize, 8usize);
        let mut plane = vec![0u8; width * height];
        for y in 0..height {
            for (x, slot) in plane[y * width..(y + 1) * width].iter_mut().enumerate() {
                *slot = x as u8;
            }
        }
        assert_eq!(edge_pixel_ratio(&plane, width, height), 0.0);
    }

    #[test]
    fn tiny_planes_yield_empty_masks() {
        let plane = vec![0u8, 255, 0, 255];
        assert_eq!(edge_pixel_ratio(&plane, 2, 2), 0.0);
    }
}

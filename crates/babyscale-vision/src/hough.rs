//! Gradient Hough transform for circles.
//!
//! Edge pixels vote for centers along their gradient direction, at every
//! radius in the search range. Votes are pooled over a 3x3 window, local
//! maxima above the accumulator threshold become center candidates, and each
//! candidate's radius is taken from the distribution of edge distances around
//! it.

use babyscale_models::Circle;
use image::GrayImage;

/// Parameters for [`hough_circles`].
#[derive(Debug, Clone, PartialEq)]
pub struct HoughParams {
    /// Minimum distance between accepted circle centers (pixels).
    pub min_dist: f64,
    /// Canny upper threshold.
    pub canny_high: f32,
    /// Canny lower threshold.
    pub canny_low: f32,
    /// Votes a center (and its radius) needs to be accepted.
    pub accumulator_threshold: u32,
    /// Smallest radius searched (pixels).
    pub min_radius: u32,
    /// Largest radius searched (pixels).
    pub max_radius: u32,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            min_dist: 20.0,
            canny_high: 50.0,
            canny_low: 25.0,
            accumulator_threshold: 30,
            min_radius: 5,
            max_radius: 100,
        }
    }
}

/// Detect circles in a (pre-blurred) grayscale image.
///
/// Circles are returned strongest first. Centers and radii are rounded to
/// whole pixels.
pub fn hough_circles(gray: &GrayImage, params: &HoughParams) -> Vec<Circle> {
    let (w, h) = gray.dimensions();
    if w < 3 || h < 3 || params.max_radius < params.min_radius {
        return Vec::new();
    }

    let edges = imageproc::edges::canny(gray, params.canny_low, params.canny_high);
    let gx = imageproc::gradients::horizontal_sobel(gray);
    let gy = imageproc::gradients::vertical_sobel(gray);

    let stride = w as usize;
    let mut accum = vec![0u32; stride * h as usize];
    let mut edge_points: Vec<(f64, f64)> = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if edges.get_pixel(x, y)[0] == 0 {
                continue;
            }
            edge_points.push((x as f64, y as f64));

            let dx = gx.get_pixel(x, y)[0] as f64;
            let dy = gy.get_pixel(x, y)[0] as f64;
            let mag = dx.hypot(dy);
            if mag < f64::EPSILON {
                continue;
            }
            let (ux, uy) = (dx / mag, dy / mag);

            for sign in [-1.0f64, 1.0] {
                let mut last = usize::MAX;
                for r in params.min_radius..=params.max_radius {
                    let vx = (x as f64 + sign * ux * r as f64).round();
                    let vy = (y as f64 + sign * uy * r as f64).round();
                    if vx < 0.0 || vy < 0.0 || vx >= w as f64 || vy >= h as f64 {
                        break;
                    }
                    let idx = vy as usize * stride + vx as usize;
                    if idx != last {
                        accum[idx] += 1;
                        last = idx;
                    }
                }
            }
        }
    }

    if edge_points.is_empty() {
        return Vec::new();
    }

    let pooled = pool_3x3(&accum, w as usize, h as usize);
    let centers = find_centers(&pooled, w as usize, h as usize, params.accumulator_threshold);

    let mut circles: Vec<Circle> = Vec::new();
    for (idx, _) in centers {
        let cx = (idx % stride) as f64;
        let cy = (idx / stride) as f64;

        if circles
            .iter()
            .any(|c| (c.center_x - cx).hypot(c.center_y - cy) < params.min_dist)
        {
            continue;
        }

        if let Some(radius) = estimate_radius(cx, cy, &edge_points, params) {
            circles.push(Circle::new(cx, cy, radius));
        }
    }

    circles
}

/// Sum each cell with its 8 neighbours.
fn pool_3x3(accum: &[u32], w: usize, h: usize) -> Vec<u32> {
    let mut pooled = vec![0u32; accum.len()];
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0;
            for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    sum += accum[ny * w + nx];
                }
            }
            pooled[y * w + x] = sum;
        }
    }
    pooled
}

/// Strict local maxima above `threshold`, strongest first.
///
/// Plateaus resolve to the first cell in raster order.
fn find_centers(pooled: &[u32], w: usize, h: usize, threshold: u32) -> Vec<(usize, u32)> {
    let mut centers = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let val = pooled[idx];
            if val <= threshold {
                continue;
            }

            let mut is_max = true;
            'outer: for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    let nidx = ny * w + nx;
                    if nidx == idx {
                        continue;
                    }
                    if pooled[nidx] > val || (pooled[nidx] == val && nidx < idx) {
                        is_max = false;
                        break 'outer;
                    }
                }
            }

            if is_max {
                centers.push((idx, val));
            }
        }
    }

    // stable: ties stay in raster order
    centers.sort_by(|a, b| b.1.cmp(&a.1));
    centers
}

/// Best-supported radius around a center, or `None` if support is too weak.
fn estimate_radius(cx: f64, cy: f64, edge_points: &[(f64, f64)], params: &HoughParams) -> Option<f64> {
    let min_r = params.min_radius as usize;
    let max_r = params.max_radius as usize;
    let mut counts = vec![0u32; max_r + 2];
    let mut sums = vec![0.0f64; max_r + 2];

    for &(ex, ey) in edge_points {
        let d = (ex - cx).hypot(ey - cy);
        if d < min_r as f64 - 0.5 || d > max_r as f64 + 0.5 {
            continue;
        }
        let bin = d.round() as usize;
        counts[bin] += 1;
        sums[bin] += d;
    }

    let mut best: Option<(usize, u32)> = None;
    for r in min_r.max(1)..=max_r {
        let support = counts[r - 1] + counts[r] + counts[r + 1];
        if best.map_or(true, |(_, s)| support > s) {
            best = Some((r, support));
        }
    }

    let (r, support) = best?;
    if support < params.accumulator_threshold || support == 0 {
        return None;
    }

    let mean = (sums[r - 1] + sums[r] + sums[r + 1]) / support as f64;
    Some(mean.round())
}

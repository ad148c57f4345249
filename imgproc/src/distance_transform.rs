use cv_core::{FloatImage, GrayImage};
use image::Luma;

/// Cost of a horizontal or vertical step.
pub const CHAMFER_ORTHOGONAL: f32 = 1.0;
/// Cost of a diagonal step.
pub const CHAMFER_DIAGONAL: f32 = 1.4;

/// Value given to pixels before propagation. Never smaller than the
/// longest chamfer path across the grid.
pub fn chamfer_sentinel(width: u32, height: u32) -> f32 {
    (width + height) as f32 * CHAMFER_ORTHOGONAL
}

/// Approximate Euclidean distance from every pixel to the nearest zero pixel
/// of `mask`, using the 3x3 chamfer metric (1.0 orthogonal, 1.4 diagonal).
///
/// Zero pixels map to 0. If `mask` has no zero pixel, every output value is
/// [`chamfer_sentinel`].
///
/// Two raster passes: forward (top-left to bottom-right) relaxing against the
/// upper-left, up, upper-right and left neighbours, then backward relaxing
/// against the lower-right, down, lower-left and right neighbours.
pub fn chamfer_distance_transform(mask: &GrayImage) -> FloatImage {
    let (w, h) = mask.dimensions();
    let sentinel = chamfer_sentinel(w, h);
    let mut dist = FloatImage::from_fn(w, h, |x, y| {
        if mask.get_pixel(x, y)[0] == 0 {
            Luma([0.0])
        } else {
            Luma([sentinel])
        }
    });

    let width = w as usize;
    let height = h as usize;
    let d: &mut [f32] = &mut dist;

    for y in 0..height {
        for x in 0..width {
            let mut best = d[y * width + x];
            if y > 0 {
                let up = (y - 1) * width;
                if x > 0 {
                    best = best.min(d[up + x - 1] + CHAMFER_DIAGONAL);
                }
                best = best.min(d[up + x] + CHAMFER_ORTHOGONAL);
                if x + 1 < width {
                    best = best.min(d[up + x + 1] + CHAMFER_DIAGONAL);
                }
            }
            if x > 0 {
                best = best.min(d[y * width + x - 1] + CHAMFER_ORTHOGONAL);
            }
            d[y * width + x] = best;
        }
    }

    for y in (0..height).rev() {
        for x in (0..width).rev() {
            let mut best = d[y * width + x];
            if y + 1 < height {
                let down = (y + 1) * width;
                if x + 1 < width {
                    best = best.min(d[down + x + 1] + CHAMFER_DIAGONAL);
                }
                best = best.min(d[down + x] + CHAMFER_ORTHOGONAL);
                if x > 0 {
                    best = best.min(d[down + x - 1] + CHAMFER_DIAGONAL);
                }
            }
            if x + 1 < width {
                best = best.min(d[y * width + x + 1] + CHAMFER_ORTHOGONAL);
            }
            d[y * width + x] = best;
        }
    }

    dist
}

use cv_core::{FloatImage, GrayImage, OrganizedPointCloud};
use cv_imgproc::chamfer_distance_transform;
use image::Luma;

const SMOOTH: u8 = 255;
const DISCONTINUITY: u8 = 0;

#[inline]
fn flag(mask: &mut GrayImage, col: usize, row: usize) {
    mask.put_pixel(col as u32, row as u32, Luma([DISCONTINUITY]));
}

/// Per-pixel flags marking depth discontinuities and invalid depth.
///
/// Stored as an 8-bit mask where 0 marks a discontinuity, so the mask can be
/// fed directly to [`chamfer_distance_transform`].
#[derive(Debug, Clone)]
pub struct DiscontinuityMap {
    mask: GrayImage,
}

impl DiscontinuityMap {
    /// Flag every pixel whose depth differs from its right or lower neighbour
    /// by more than `max_depth_change_factor * depth / reference_depth`, or
    /// where either depth is not finite. Both pixels of an offending pair are
    /// flagged.
    pub fn compute(
        cloud: &OrganizedPointCloud<'_>,
        max_depth_change_factor: f32,
        reference_depth: f32,
    ) -> Self {
        let width = cloud.width();
        let height = cloud.height();
        let mut mask = GrayImage::from_pixel(width as u32, height as u32, Luma([SMOOTH]));

        for row in 0..height {
            for col in 0..width {
                let depth = cloud.depth(col, row);
                if !depth.is_finite() {
                    flag(&mut mask, col, row);
                }
                let threshold = max_depth_change_factor * depth / reference_depth;

                if col + 1 < width {
                    let right = cloud.depth(col + 1, row);
                    if !depth.is_finite() || !right.is_finite() || (depth - right).abs() > threshold
                    {
                        flag(&mut mask, col, row);
                        flag(&mut mask, col + 1, row);
                    }
                }
                if row + 1 < height {
                    let below = cloud.depth(col, row + 1);
                    if !depth.is_finite() || !below.is_finite() || (depth - below).abs() > threshold
                    {
                        flag(&mut mask, col, row);
                        flag(&mut mask, col, row + 1);
                    }
                }
            }
        }

        Self { mask }
    }

    pub fn width(&self) -> usize {
        self.mask.width() as usize
    }

    pub fn height(&self) -> usize {
        self.mask.height() as usize
    }

    pub fn is_discontinuity(&self, col: usize, row: usize) -> bool {
        self.mask.get_pixel(col as u32, row as u32)[0] == DISCONTINUITY
    }

    pub fn discontinuity_count(&self) -> usize {
        self.mask.pixels().filter(|p| p[0] == DISCONTINUITY).count()
    }

    /// The mask, 0 at discontinuities and 255 elsewhere.
    pub fn as_image(&self) -> &GrayImage {
        &self.mask
    }

    /// Chamfer distance from every pixel to the nearest discontinuity.
    pub fn distance_field(&self) -> FloatImage {
        chamfer_distance_transform(&self.mask)
    }
}

use cv_core::{Normal, OrganizedPointCloud, XYZ_CHANNELS};
use cv_imgproc::IntegralImage;
use nalgebra::Vector3;

use super::Window;
use crate::Result;

/// Normals from window-averaged horizontal and vertical 3D gradients.
#[derive(Debug)]
pub struct GradientSolver {
    dx: IntegralImage,
    dy: IntegralImage,
}

impl GradientSolver {
    pub fn new(cloud: &OrganizedPointCloud<'_>) -> Result<Self> {
        let width = cloud.width();
        let height = cloud.height();
        let row_stride = width * XYZ_CHANNELS;

        // Central differences; the outermost rows and columns stay zero.
        let mut diff_x = vec![0.0f32; width * height * XYZ_CHANNELS];
        let mut diff_y = vec![0.0f32; width * height * XYZ_CHANNELS];
        for row in 1..height.saturating_sub(1) {
            for col in 1..width.saturating_sub(1) {
                let gx = cloud.point(col + 1, row) - cloud.point(col - 1, row);
                let gy = cloud.point(col, row + 1) - cloud.point(col, row - 1);
                let i = row * row_stride + col * XYZ_CHANNELS;
                diff_x[i..i + XYZ_CHANNELS].copy_from_slice(gx.as_slice());
                diff_y[i..i + XYZ_CHANNELS].copy_from_slice(gy.as_slice());
            }
        }

        let dx = IntegralImage::new(
            &diff_x,
            width,
            height,
            XYZ_CHANNELS,
            false,
            XYZ_CHANNELS,
            row_stride,
        )?;
        let dy = IntegralImage::new(
            &diff_y,
            width,
            height,
            XYZ_CHANNELS,
            false,
            XYZ_CHANNELS,
            row_stride,
        )?;
        Ok(Self { dx, dy })
    }

    pub fn estimate(&self, window: Window) -> Normal {
        let (x, y) = window.origin();
        let s = window.size as i64;

        let gx = Vector3::new(
            self.dx.sum(x, y, s, s, 0),
            self.dx.sum(x, y, s, s, 1),
            self.dx.sum(x, y, s, s, 2),
        );
        let gy = Vector3::new(
            self.dy.sum(x, y, s, s, 0),
            self.dy.sum(x, y, s, s, 1),
            self.dy.sum(x, y, s, s, 2),
        );
        Normal::from_unnormalized(gx.cross(&gy), -1.0)
    }
}

use cv_core::{Normal, OrganizedPointCloud};
use cv_imgproc::IntegralImage;
use nalgebra::Vector3;

use super::Window;
use crate::Result;

/// Normals from depth slopes between shifted sub-windows.
///
/// Depth is averaged over four `(size - 1)^2` windows shifted one pixel
/// left, right, up and down; the in-plane slopes come from the points at the
/// ends of the window's horizontal and vertical axes.
#[derive(Debug)]
pub struct DepthChangeSolver<'a> {
    cloud: OrganizedPointCloud<'a>,
    depth: IntegralImage,
}

impl<'a> DepthChangeSolver<'a> {
    pub fn new(cloud: &OrganizedPointCloud<'a>) -> Result<Self> {
        let layout = cloud.layout();
        let depth = IntegralImage::new(
            &cloud.xyz_data()[2..],
            cloud.width(),
            cloud.height(),
            1,
            false,
            layout.element_stride,
            layout.row_stride,
        )?;
        Ok(Self {
            cloud: *cloud,
            depth,
        })
    }

    fn mean_depth(&self, x: i64, y: i64, size: i64) -> Option<f32> {
        let count = self.depth.finite_count(x, y, size, size);
        (count > 0).then(|| self.depth.sum(x, y, size, size, 0) / count as f32)
    }

    pub fn estimate(&self, window: Window) -> Normal {
        let Window { col, row, size } = window;
        let width = self.cloud.width();
        let height = self.cloud.height();

        // Shrink the window so the shifted sub-windows and the axis end points
        // stay on the grid.
        let max_half = col
            .min(row)
            .saturating_sub(1)
            .min(width - 1 - col)
            .min(height - 1 - row);
        let size = size.min(2 * max_half + 1);
        if size < 2 {
            return Normal::ZERO;
        }
        let half = size / 2;
        let (x, y) = Window::new(col, row, size).origin();
        let sub = size as i64 - 1;

        let (Some(left), Some(right), Some(up), Some(down)) = (
            self.mean_depth(x - 1, y, sub),
            self.mean_depth(x + 1, y, sub),
            self.mean_depth(x, y - 1, sub),
            self.mean_depth(x, y + 1, sub),
        ) else {
            return Normal::ZERO;
        };

        let span = (2 * half) as f32;
        let p_left = self.cloud.point(col - half, row);
        let p_right = self.cloud.point(col + half, row);
        let p_up = self.cloud.point(col, row - half);
        let p_down = self.cloud.point(col, row + half);

        let gx = Vector3::new(
            (p_right.x - p_left.x) / span,
            (p_right.y - p_left.y) / span,
            (right - left) / 2.0,
        );
        let gy = Vector3::new(
            (p_down.x - p_up.x) / span,
            (p_down.y - p_up.y) / span,
            (down - up) / 2.0,
        );
        Normal::from_unnormalized(gx.cross(&gy), -1.0)
    }
}

use cv_core::{Normal, OrganizedPointCloud, XYZ_CHANNELS};
use cv_imgproc::IntegralImage;
use nalgebra::{Matrix3, SymmetricEigen, Vector3};

use super::Window;
use crate::Result;

/// Middle-to-largest eigenvalue ratio below which the window's points are
/// treated as collinear or coincident.
const DEGENERATE_EIGENVALUE_RATIO: f32 = 1e-5;

/// Normals from the smallest eigenvector of the window covariance.
#[derive(Debug)]
pub struct CovarianceSolver {
    table: IntegralImage,
}

impl CovarianceSolver {
    pub fn new(cloud: &OrganizedPointCloud<'_>) -> Result<Self> {
        let layout = cloud.layout();
        let table = IntegralImage::new(
            cloud.xyz_data(),
            cloud.width(),
            cloud.height(),
            XYZ_CHANNELS,
            true,
            layout.element_stride,
            layout.row_stride,
        )?;
        Ok(Self { table })
    }

    pub fn estimate(&self, window: Window) -> Normal {
        let (x, y) = window.origin();
        let s = window.size as i64;

        let count = self.table.finite_count(x, y, s, s);
        if count < 3 {
            return Normal::ZERO;
        }
        let n = count as f32;

        let sum = Vector3::new(
            self.table.sum(x, y, s, s, 0),
            self.table.sum(x, y, s, s, 1),
            self.table.sum(x, y, s, s, 2),
        );
        let mut covariance = Matrix3::zeros();
        for i in 0..XYZ_CHANNELS {
            for j in i..XYZ_CHANNELS {
                let Some(v) = self.table.second_order_sum(x, y, s, s, i, j) else {
                    return Normal::ZERO;
                };
                covariance[(i, j)] = v;
                covariance[(j, i)] = v;
            }
        }
        covariance -= sum * sum.transpose() / n;
        covariance /= n - 1.0;

        if covariance.iter().any(|v| !v.is_finite()) {
            return Normal::ZERO;
        }

        let eigen = SymmetricEigen::new(covariance);
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
        let middle = eigen.eigenvalues[order[1]];
        let largest = eigen.eigenvalues[order[2]];
        if largest <= 0.0 || middle <= largest * DEGENERATE_EIGENVALUE_RATIO {
            return Normal::ZERO;
        }

        let mut normal: Vector3<f32> = eigen.eigenvectors.column(order[0]).into_owned();
        // face the camera
        if normal.z > 0.0 {
            normal = -normal;
        }
        Normal::from_unnormalized(normal, 1.0)
    }
}

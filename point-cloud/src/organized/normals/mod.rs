//! Integral-image normal estimation.
//!
//! One call to [`IntegralImageNormalEstimator::compute`] processes a full frame:
//!
//! 1. **Discontinuity map**: pixels next to depth jumps or missing depth
//! 2. **Distance field**: chamfer distance to the nearest discontinuity
//! 3. **Solver build**: the summed-area tables needed by the configured method
//! 4. **Per-pixel estimate**: a window sized from depth and bounded by the
//!    distance field, so windows do not straddle occlusion boundaries
//!
//! Every output normal is unit length or [`Normal::ZERO`]. Pixels closer than
//! `normal_smoothing_size` to the frame edge, pixels without depth and pixels
//! whose window would be 2 pixels or less always get the zero normal.
//!
//! All working buffers belong to the call and are dropped when it returns.

mod covariance;
mod depth_change;
mod gradient;

pub use covariance::CovarianceSolver;
pub use depth_change::DepthChangeSolver;
pub use gradient::GradientSolver;

use cv_core::{FloatImage, Normal, NormalMap, OrganizedPointCloud};
use rayon::prelude::*;
use tracing::{debug, warn};

use super::DiscontinuityMap;
use crate::{NormalEstimationConfig, NormalEstimationMethod, Result};

/// Windows at or below this size are not evaluated.
pub const MIN_WINDOW_SIZE: f32 = 2.0;

/// A square window of `size` pixels centred on `(col, row)`.
///
/// The window's top-left corner is `(col - size / 2, row - size / 2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub col: usize,
    pub row: usize,
    pub size: usize,
}

impl Window {
    pub fn new(col: usize, row: usize, size: usize) -> Self {
        Self { col, row, size }
    }

    /// Top-left corner in signed pixel coordinates; may lie outside the grid.
    #[inline]
    pub fn origin(&self) -> (i64, i64) {
        let half = (self.size / 2) as i64;
        (self.col as i64 - half, self.row as i64 - half)
    }
}

/// The per-frame solver for one [`NormalEstimationMethod`], holding the
/// summed-area tables that method needs.
#[derive(Debug)]
pub enum NormalSolver<'a> {
    Covariance(CovarianceSolver),
    Gradient(GradientSolver),
    DepthChange(DepthChangeSolver<'a>),
}

impl<'a> NormalSolver<'a> {
    pub fn build(method: NormalEstimationMethod, cloud: &OrganizedPointCloud<'a>) -> Result<Self> {
        Ok(match method {
            NormalEstimationMethod::CovarianceMatrix => {
                NormalSolver::Covariance(CovarianceSolver::new(cloud)?)
            }
            NormalEstimationMethod::Average3dGradient => {
                NormalSolver::Gradient(GradientSolver::new(cloud)?)
            }
            NormalEstimationMethod::AverageDepthChange => {
                NormalSolver::DepthChange(DepthChangeSolver::new(cloud)?)
            }
        })
    }

    pub fn method(&self) -> NormalEstimationMethod {
        match self {
            NormalSolver::Covariance(_) => NormalEstimationMethod::CovarianceMatrix,
            NormalSolver::Gradient(_) => NormalEstimationMethod::Average3dGradient,
            NormalSolver::DepthChange(_) => NormalEstimationMethod::AverageDepthChange,
        }
    }

    #[inline]
    pub fn estimate(&self, window: Window) -> Normal {
        match self {
            NormalSolver::Covariance(s) => s.estimate(window),
            NormalSolver::Gradient(s) => s.estimate(window),
            NormalSolver::DepthChange(s) => s.estimate(window),
        }
    }
}

/// Normal estimator for organized clouds using integral images.
///
/// The configuration, including the method, is fixed at construction.
/// Instances hold no per-frame state and may be shared across threads.
#[derive(Debug, Clone)]
pub struct IntegralImageNormalEstimator {
    config: NormalEstimationConfig,
}

impl IntegralImageNormalEstimator {
    pub fn new(config: NormalEstimationConfig) -> Result<Self> {
        if let Err(e) = config.validate() {
            warn!(error = %e, "rejected normal estimation config");
            return Err(e);
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &NormalEstimationConfig {
        &self.config
    }

    /// Width in pixels of the frame border that is never evaluated.
    pub fn border(&self) -> usize {
        self.config.normal_smoothing_size.ceil() as usize
    }

    /// Window size for a pixel at `depth` lying `distance` pixels from the
    /// nearest discontinuity.
    pub fn window_size(&self, depth: f32, distance: f32) -> f32 {
        let scale = if self.config.depth_dependent_smoothing {
            depth / self.config.reference_depth
        } else {
            1.0 / self.config.reference_depth
        };
        (self.config.normal_smoothing_size * scale).min(distance)
    }

    /// Estimate a normal for every pixel of `cloud`.
    pub fn compute(&self, cloud: &OrganizedPointCloud<'_>) -> Result<NormalMap> {
        let width = cloud.width();
        let height = cloud.height();
        let _span = tracing::debug_span!(
            "integral_image_normals",
            width,
            height,
            method = ?self.config.method
        )
        .entered();

        let discontinuities = DiscontinuityMap::compute(
            cloud,
            self.config.max_depth_change_factor,
            self.config.reference_depth,
        );
        debug!(
            discontinuities = discontinuities.discontinuity_count(),
            "computed depth discontinuity map"
        );
        let distance = discontinuities.distance_field();

        let solver = NormalSolver::build(self.config.method, cloud)?;
        debug!(method = ?solver.method(), "built integral images");

        let mut normals = NormalMap::new(width, height);
        let border = self.border();
        if width <= 2 * border || height <= 2 * border {
            debug!(border, "frame smaller than the unevaluated border");
            return Ok(normals);
        }

        normals
            .as_mut_slice()
            .par_chunks_mut(width)
            .enumerate()
            .filter(|(row, _)| *row >= border && *row < height - border)
            .for_each(|(row, out)| {
                for col in border..width - border {
                    out[col] = self.estimate_pixel(&solver, cloud, &distance, col, row);
                }
            });

        debug!(valid = normals.valid_count(), "estimated normals");
        Ok(normals)
    }

    fn estimate_pixel(
        &self,
        solver: &NormalSolver<'_>,
        cloud: &OrganizedPointCloud<'_>,
        distance: &FloatImage,
        col: usize,
        row: usize,
    ) -> Normal {
        let depth = cloud.depth(col, row);
        if !depth.is_finite() || depth == 0.0 {
            return Normal::ZERO;
        }
        let size = self.window_size(depth, distance.get_pixel(col as u32, row as u32)[0]);
        if size.is_nan() || size <= MIN_WINDOW_SIZE {
            return Normal::ZERO;
        }
        solver.estimate(Window::new(col, row, size as usize))
    }
}

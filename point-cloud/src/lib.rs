//! Normal estimation for organized point clouds.
//!
//! Organized clouds (depth-camera frames stored row-major with pixel adjacency)
//! allow normals to be computed from windowed statistics over summed-area
//! tables, so every pixel costs O(1) after a linear precomputation pass.
//!
//! # Module Organization
//!
//! - `organized`: depth discontinuity detection and the integral-image
//!   normal estimator with its three solvers
//!
//! # Usage
//!
//! ```no_run
//! use cv_core::OrganizedPointCloud;
//! use cv_point_cloud::{IntegralImageNormalEstimator, NormalEstimationConfig};
//!
//! # let data = vec![0.0f32; 640 * 480 * 3];
//! let cloud = OrganizedPointCloud::from_packed(&data, 640, 480)?;
//! let estimator = IntegralImageNormalEstimator::new(NormalEstimationConfig::high_quality())?;
//! let normals = estimator.compute(&cloud)?;
//! println!("{} normals estimated", normals.valid_count());
//! # Ok::<(), cv_point_cloud::PointCloudError>(())
//! ```

pub mod organized;

pub use organized::*;

use serde::{Deserialize, Serialize};

/// Depth (in metres) corresponding to the reference scale of the discontinuity
/// threshold and window sizing: 500 sensor units of 1 mm.
pub const DEFAULT_REFERENCE_DEPTH: f32 = 500.0 * 0.001;

pub type Result<T> = std::result::Result<T, PointCloudError>;

#[derive(Debug, thiserror::Error)]
pub enum PointCloudError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Core error: {0}")]
    Core(#[from] cv_core::Error),

    #[error("Image processing error: {0}")]
    Imgproc(#[from] cv_imgproc::ImgprocError),
}

/// Algorithm used to turn windowed statistics into a normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalEstimationMethod {
    /// Smallest eigenvector of the window covariance.
    CovarianceMatrix,
    /// Cross product of the window-averaged horizontal and vertical 3D gradients.
    #[default]
    Average3dGradient,
    /// Cross product of slopes from averaged depth in shifted sub-windows.
    AverageDepthChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalEstimationConfig {
    pub method: NormalEstimationMethod,
    /// Relative depth jump, per `reference_depth`, treated as a discontinuity.
    pub max_depth_change_factor: f32,
    /// Base window size in pixels; also the width of the unevaluated border.
    pub normal_smoothing_size: f32,
    /// Scale the window with depth instead of using the fixed-depth size.
    pub depth_dependent_smoothing: bool,
    /// Sensor-scale constant normalising depth in the threshold and window size.
    pub reference_depth: f32,
}

impl Default for NormalEstimationConfig {
    fn default() -> Self {
        Self {
            method: NormalEstimationMethod::default(),
            max_depth_change_factor: 0.02,
            normal_smoothing_size: 10.0,
            depth_dependent_smoothing: false,
            reference_depth: DEFAULT_REFERENCE_DEPTH,
        }
    }
}

impl NormalEstimationConfig {
    pub fn new(method: NormalEstimationMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Small windows and the cheapest solver.
    pub fn fast() -> Self {
        Self {
            method: NormalEstimationMethod::AverageDepthChange,
            normal_smoothing_size: 5.0,
            ..Self::default()
        }
    }

    /// Covariance solver with windows growing with depth.
    pub fn high_quality() -> Self {
        Self {
            method: NormalEstimationMethod::CovarianceMatrix,
            normal_smoothing_size: 10.0,
            depth_dependent_smoothing: true,
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: NormalEstimationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_max_depth_change_factor(mut self, factor: f32) -> Self {
        self.max_depth_change_factor = factor;
        self
    }

    pub fn with_normal_smoothing_size(mut self, size: f32) -> Self {
        self.normal_smoothing_size = size;
        self
    }

    pub fn with_depth_dependent_smoothing(mut self, enabled: bool) -> Self {
        self.depth_dependent_smoothing = enabled;
        self
    }

    pub fn with_reference_depth(mut self, depth: f32) -> Self {
        self.reference_depth = depth;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(PointCloudError::InvalidConfig(format!(
                    "{} must be finite and positive, got {}",
                    name, v
                )))
            }
        };
        positive("max_depth_change_factor", self.max_depth_change_factor)?;
        positive("normal_smoothing_size", self.normal_smoothing_size)?;
        positive("reference_depth", self.reference_depth)?;
        Ok(())
    }
}

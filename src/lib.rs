//! Surface normals for organized point clouds.
//!
//! Re-exports the workspace crates under short names:
//!
//! - [`core`]: cloud views, layouts, camera intrinsics and the normal map
//! - [`imgproc`]: summed-area tables and the chamfer distance transform
//! - [`point_cloud`]: discontinuity detection and the integral-image estimator

pub use cv_core as core;
pub use cv_imgproc as imgproc;
pub use cv_point_cloud as point_cloud;

pub use cv_point_cloud::{
    IntegralImageNormalEstimator, NormalEstimationConfig, NormalEstimationMethod,
};

/// Initialize a single global Rayon thread pool for the row-parallel normal loop.
///
/// Call this once at application startup. Repeated calls are idempotent and
/// return the first initialization result.
///
/// Priority order:
/// 1. explicit `num_threads`
/// 2. `CV_CPU_THREADS` env var
/// 3. Rayon default
pub fn init_thread_pool(num_threads: Option<usize>) -> cv_core::Result<usize> {
    cv_core::init_global_thread_pool(num_threads)
}

//! Grid primitives for organized point cloud processing.
//!
//! - [`integral`]: multi-channel summed-area tables with O(1) window sums
//! - [`distance_transform`]: two-pass chamfer distance transform

pub mod distance_transform;
pub mod integral;

pub use distance_transform::*;
pub use integral::*;

pub type Result<T> = std::result::Result<T, ImgprocError>;

#[derive(Debug, thiserror::Error)]
pub enum ImgprocError {
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),
}

pub fn validate_grid_size(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ImgprocError::DimensionMismatch(
            "Grid dimensions must be non-zero".into(),
        ));
    }
    Ok(())
}

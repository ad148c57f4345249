//! Operations on organized (grid-structured) point clouds:
//! - Depth discontinuity detection
//! - Integral-image normal estimation

pub mod discontinuity;
pub mod normals;

pub use discontinuity::*;
pub use normals::*;

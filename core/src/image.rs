//! Image aliases shared by the depth and normal pipelines.

use image::{ImageBuffer, Luma};

pub use image::GrayImage;

/// Single-channel floating point image, used for distance fields.
pub type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Raw sensor depth, in sensor units (e.g. millimetres for a 16-bit depth camera
/// converted to `f32`). Zero or non-finite pixels mean "no depth".
pub type DepthImage = ImageBuffer<Luma<f32>, Vec<f32>>;

//! Organized (grid-structured) point clouds.
//!
//! Points are addressed by `(col, row)` pixel coordinates and read through a
//! [`PointLayout`], so a frame can be borrowed straight out of a foreign
//! interleaved buffer (e.g. XYZ padded to 16 bytes, or XYZRGB) without copying.

use nalgebra::{Point2, Point3};

use crate::{CameraIntrinsics, DepthImage, Error, Result};

/// Number of floats in the `x, y, z` triple of one point.
pub const XYZ_CHANNELS: usize = 3;

/// Memory layout of an organized point buffer, in `f32` units.
///
/// The `x`, `y`, `z` fields of a point are contiguous and start `xyz_offset`
/// floats into the point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointLayout {
    /// Floats between two horizontally adjacent points.
    pub element_stride: usize,
    /// Floats between the first points of two consecutive rows.
    pub row_stride: usize,
    /// Offset of `x` inside a point; `y` and `z` follow.
    pub xyz_offset: usize,
}

impl PointLayout {
    /// Tightly packed `x, y, z` triples.
    pub fn packed(width: usize) -> Self {
        Self::padded(XYZ_CHANNELS, width)
    }

    /// Points of `element_stride` floats with `x, y, z` first.
    pub fn padded(element_stride: usize, width: usize) -> Self {
        Self {
            element_stride,
            row_stride: element_stride * width,
            xyz_offset: 0,
        }
    }

    pub fn with_xyz_offset(mut self, xyz_offset: usize) -> Self {
        self.xyz_offset = xyz_offset;
        self
    }

    pub fn with_row_stride(mut self, row_stride: usize) -> Self {
        self.row_stride = row_stride;
        self
    }

    /// Float index of the first field of point `(col, row)`.
    #[inline]
    pub fn index(&self, col: usize, row: usize) -> usize {
        row * self.row_stride + col * self.element_stride
    }

    /// Minimum buffer length able to hold a `width x height` grid.
    pub fn required_len(&self, width: usize, height: usize) -> usize {
        if width == 0 || height == 0 {
            return 0;
        }
        self.index(width - 1, height - 1) + self.element_stride
    }

    pub fn validate(&self, width: usize, height: usize, len: usize) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::DimensionMismatch(format!(
                "Organized cloud dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        if self.element_stride < self.xyz_offset + XYZ_CHANNELS {
            return Err(Error::InvalidInput(format!(
                "Element stride {} cannot hold xyz at offset {}",
                self.element_stride, self.xyz_offset
            )));
        }
        if self.row_stride < self.element_stride * width {
            return Err(Error::InvalidInput(format!(
                "Row stride {} is smaller than {} points of stride {}",
                self.row_stride, width, self.element_stride
            )));
        }
        let required = self.required_len(width, height);
        if len < required {
            return Err(Error::DimensionMismatch(format!(
                "Buffer holds {} floats, {}x{} grid needs {}",
                len, width, height, required
            )));
        }
        Ok(())
    }
}

/// Borrowed view of an organized point grid.
#[derive(Debug, Clone, Copy)]
pub struct OrganizedPointCloud<'a> {
    data: &'a [f32],
    width: usize,
    height: usize,
    layout: PointLayout,
}

impl<'a> OrganizedPointCloud<'a> {
    pub fn new(data: &'a [f32], width: usize, height: usize, layout: PointLayout) -> Result<Self> {
        layout.validate(width, height, data.len())?;
        Ok(Self {
            data,
            width,
            height,
            layout,
        })
    }

    /// View over tightly packed `x, y, z` triples.
    pub fn from_packed(data: &'a [f32], width: usize, height: usize) -> Result<Self> {
        Self::new(data, width, height, PointLayout::packed(width))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn layout(&self) -> PointLayout {
        self.layout
    }

    pub fn data(&self) -> &'a [f32] {
        self.data
    }

    /// The buffer starting at the `x` field of the first point, so that
    /// `xyz_data()[layout.index(col, row) + c]` is channel `c` of a point.
    pub fn xyz_data(&self) -> &'a [f32] {
        &self.data[self.layout.xyz_offset..]
    }

    #[inline]
    pub fn index(&self, col: usize, row: usize) -> usize {
        self.layout.index(col, row) + self.layout.xyz_offset
    }

    #[inline]
    pub fn point(&self, col: usize, row: usize) -> Point3<f32> {
        let i = self.index(col, row);
        Point3::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    #[inline]
    pub fn depth(&self, col: usize, row: usize) -> f32 {
        self.data[self.index(col, row) + 2]
    }
}

/// Owned organized cloud in packed `x, y, z` layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizedPointCloudBuf {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl OrganizedPointCloudBuf {
    pub fn from_points(points: &[Point3<f32>], width: usize, height: usize) -> Result<Self> {
        if points.len() != width * height {
            return Err(Error::DimensionMismatch(format!(
                "Point count {} does not match grid {}x{}",
                points.len(),
                width,
                height
            )));
        }
        let data = points.iter().flat_map(|p| [p.x, p.y, p.z]).collect();
        let buf = Self {
            data,
            width,
            height,
        };
        PointLayout::packed(width).validate(width, height, buf.data.len())?;
        Ok(buf)
    }

    /// Back-project a depth image through a pinhole model.
    ///
    /// `depth_scale` converts raw depth units to metres (0.001 for millimetres).
    /// Pixels with zero or non-finite depth become NaN points.
    pub fn from_depth_image(
        depth: &DepthImage,
        intrinsics: &CameraIntrinsics,
        depth_scale: f32,
    ) -> Result<Self> {
        let (width, height) = depth.dimensions();
        if !intrinsics.is_valid() {
            return Err(Error::InvalidInput(format!(
                "Invalid camera intrinsics: {:?}",
                intrinsics
            )));
        }
        if intrinsics.width != width || intrinsics.height != height {
            return Err(Error::DimensionMismatch(format!(
                "Depth image is {}x{}, intrinsics expect {}x{}",
                width, height, intrinsics.width, intrinsics.height
            )));
        }
        if !(depth_scale.is_finite() && depth_scale > 0.0) {
            return Err(Error::InvalidInput(format!(
                "Depth scale must be positive, got {}",
                depth_scale
            )));
        }

        let (width, height) = (width as usize, height as usize);
        let mut data = Vec::with_capacity(width * height * XYZ_CHANNELS);
        for (u, v, px) in depth.enumerate_pixels() {
            let raw = px.0[0];
            if raw == 0.0 || !raw.is_finite() {
                data.extend_from_slice(&[f32::NAN; XYZ_CHANNELS]);
                continue;
            }
            let z = (raw * depth_scale) as f64;
            let p = intrinsics.unproject(Point2::new(u as f64, v as f64), z);
            data.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        }

        PointLayout::packed(width).validate(width, height, data.len())?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn view(&self) -> OrganizedPointCloud<'_> {
        OrganizedPointCloud {
            data: &self.data,
            width: self.width,
            height: self.height,
            layout: PointLayout::packed(self.width),
        }
    }
}

use nalgebra::Vector3;

/// Tolerance used by [`Normal::is_valid`] on the vector length.
pub const UNIT_LENGTH_TOLERANCE: f32 = 1e-5;

/// A surface normal with a curvature slot.
///
/// Estimators in this workspace only ever produce unit vectors or the
/// all-zero sentinel [`Normal::ZERO`]; curvature is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Normal {
    pub normal: Vector3<f32>,
    pub curvature: f32,
}

impl Normal {
    /// Sentinel for pixels where no normal could be estimated.
    pub const ZERO: Normal = Normal {
        normal: Vector3::new(0.0, 0.0, 0.0),
        curvature: 0.0,
    };

    /// Normalize `v` scaled by `sign`, falling back to [`Normal::ZERO`] for
    /// zero-length or non-finite input.
    ///
    /// `v` is divided by its largest component first, so vectors whose squared
    /// components would underflow still come out unit length.
    pub fn from_unnormalized(v: Vector3<f32>, sign: f32) -> Self {
        if !v.iter().all(|c| c.is_finite()) {
            return Self::ZERO;
        }
        let scale = v.amax();
        if scale == 0.0 {
            return Self::ZERO;
        }
        let v = v / scale;
        let length = v.norm();
        if length == 0.0 || !length.is_finite() {
            return Self::ZERO;
        }
        let n = v * (sign / length);
        if !(n.x.is_finite() && n.y.is_finite() && n.z.is_finite()) {
            return Self::ZERO;
        }
        Self {
            normal: n,
            curvature: 0.0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.normal == Vector3::zeros()
    }

    /// True for unit-length normals.
    pub fn is_valid(&self) -> bool {
        (self.normal.norm() - 1.0).abs() <= UNIT_LENGTH_TOLERANCE
    }
}

/// Row-major grid of normals matching the input cloud's dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalMap {
    width: usize,
    height: usize,
    normals: Vec<Normal>,
}

impl NormalMap {
    /// A map filled with [`Normal::ZERO`].
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            normals: vec![Normal::ZERO; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, col: usize, row: usize) -> Normal {
        self.normals[row * self.width + col]
    }

    pub fn set(&mut self, col: usize, row: usize, normal: Normal) {
        self.normals[row * self.width + col] = normal;
    }

    pub fn as_slice(&self) -> &[Normal] {
        &self.normals
    }

    pub fn as_mut_slice(&mut self) -> &mut [Normal] {
        &mut self.normals
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, Normal> {
        self.normals.chunks_exact(self.width.max(1))
    }

    /// Number of non-sentinel normals.
    pub fn valid_count(&self) -> usize {
        self.normals.iter().filter(|n| !n.is_zero()).count()
    }

    pub fn into_vec(self) -> Vec<Normal> {
        self.normals
    }
}

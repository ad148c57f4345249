//! Multi-channel summed-area tables (integral images).
//!
//! The table is built in one pass over a strided `f32` buffer and answers sums
//! over any axis-aligned window in O(1). Accumulation happens in `f64` so that
//! large windows near the end of the table do not lose the small differences
//! the covariance estimator depends on.

use crate::{ImgprocError, Result};

/// A window after clamping to the table's grid, as half-open pixel ranges
/// `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl WindowBounds {
    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }

    pub fn height(&self) -> usize {
        self.y1 - self.y0
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }
}

/// Summed-area table over `channels` interleaved channels.
///
/// Entry `(x, y)` of every cumulative array holds the sum over `[0, x) x [0, y)`,
/// so the arrays are `(width + 1) x (height + 1)` and row/column 0 are zero.
/// A sample whose channels are not all finite contributes nothing and is not
/// counted by [`IntegralImage::finite_count`].
#[derive(Debug, Clone)]
pub struct IntegralImage {
    width: usize,
    height: usize,
    channels: usize,
    first_order: Vec<f64>,
    second_order: Option<Vec<f64>>,
    finite: Vec<u32>,
}

/// Number of unordered channel pairs `(i, j)` with `i <= j`.
#[inline]
fn pair_count(channels: usize) -> usize {
    channels * (channels + 1) / 2
}

impl IntegralImage {
    /// Build the table from `data`, reading channel `c` of pixel `(x, y)` at
    /// `data[y * row_stride + x * element_stride + c]`.
    ///
    /// With `with_second_order`, cumulative products `c_i * c_j` are also kept
    /// for every channel pair.
    pub fn new(
        data: &[f32],
        width: usize,
        height: usize,
        channels: usize,
        with_second_order: bool,
        element_stride: usize,
        row_stride: usize,
    ) -> Result<Self> {
        crate::validate_grid_size(width, height)?;
        if channels == 0 || element_stride < channels {
            return Err(ImgprocError::DimensionMismatch(format!(
                "Element stride {} cannot hold {} channels",
                element_stride, channels
            )));
        }
        if row_stride < width * element_stride {
            return Err(ImgprocError::DimensionMismatch(format!(
                "Row stride {} is smaller than {} elements of stride {}",
                row_stride, width, element_stride
            )));
        }
        let required = (height - 1) * row_stride + (width - 1) * element_stride + channels;
        if data.len() < required {
            return Err(ImgprocError::DimensionMismatch(format!(
                "Integral image input holds {} floats, {}x{} grid needs {}",
                data.len(),
                width,
                height,
                required
            )));
        }

        let stride = width + 1;
        let cells = stride * (height + 1);
        let pairs = pair_count(channels);

        let mut first_order = vec![0.0f64; cells * channels];
        let mut second_order = with_second_order.then(|| vec![0.0f64; cells * pairs]);
        let mut finite = vec![0u32; cells];

        let mut row_first = vec![0.0f64; channels];
        let mut row_second = vec![0.0f64; pairs];
        let mut sample = vec![0.0f64; channels];

        for y in 0..height {
            row_first.fill(0.0);
            row_second.fill(0.0);
            let mut row_finite = 0u32;

            for x in 0..width {
                let base = y * row_stride + x * element_stride;
                let values = &data[base..base + channels];

                if values.iter().all(|v| v.is_finite()) {
                    for (s, &v) in sample.iter_mut().zip(values) {
                        *s = v as f64;
                    }
                    for (acc, &s) in row_first.iter_mut().zip(sample.iter()) {
                        *acc += s;
                    }
                    if second_order.is_some() {
                        let mut p = 0;
                        for i in 0..channels {
                            for j in i..channels {
                                row_second[p] += sample[i] * sample[j];
                                p += 1;
                            }
                        }
                    }
                    row_finite += 1;
                }

                let cell = (y + 1) * stride + (x + 1);
                let above = y * stride + (x + 1);

                for c in 0..channels {
                    first_order[cell * channels + c] =
                        first_order[above * channels + c] + row_first[c];
                }
                if let Some(table) = second_order.as_mut() {
                    for p in 0..pairs {
                        table[cell * pairs + p] = table[above * pairs + p] + row_second[p];
                    }
                }
                finite[cell] = finite[above] + row_finite;
            }
        }

        tracing::trace!(width, height, channels, with_second_order, "built integral image");

        Ok(Self {
            width,
            height,
            channels,
            first_order,
            second_order,
            finite,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn has_second_order(&self) -> bool {
        self.second_order.is_some()
    }

    /// Clamp the window `[x, x + w) x [y, y + h)` to the grid. Returns `None`
    /// if nothing of it lies inside.
    pub fn clamp_window(&self, x: i64, y: i64, w: i64, h: i64) -> Option<WindowBounds> {
        if w <= 0 || h <= 0 {
            return None;
        }
        let x0 = x.clamp(0, self.width as i64);
        let y0 = y.clamp(0, self.height as i64);
        let x1 = x.saturating_add(w).clamp(0, self.width as i64);
        let y1 = y.saturating_add(h).clamp(0, self.height as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(WindowBounds {
            x0: x0 as usize,
            y0: y0 as usize,
            x1: x1 as usize,
            y1: y1 as usize,
        })
    }

    /// Sum of `channel` over the clamped window.
    pub fn sum(&self, x: i64, y: i64, w: i64, h: i64, channel: usize) -> f32 {
        debug_assert!(channel < self.channels, "channel out of range");
        match self.clamp_window(x, y, w, h) {
            Some(b) => self.lookup(&self.first_order, self.channels, channel, &b) as f32,
            None => 0.0,
        }
    }

    /// Sum of `c_i * c_j` over the clamped window, or `None` when the table was
    /// built without second-order terms.
    pub fn second_order_sum(
        &self,
        x: i64,
        y: i64,
        w: i64,
        h: i64,
        i: usize,
        j: usize,
    ) -> Option<f32> {
        debug_assert!(i < self.channels && j < self.channels, "channel out of range");
        let table = self.second_order.as_ref()?;
        let pairs = pair_count(self.channels);
        Some(match self.clamp_window(x, y, w, h) {
            Some(b) => self.lookup(table, pairs, self.pair(i, j), &b) as f32,
            None => 0.0,
        })
    }

    /// Number of samples with all channels finite inside the clamped window.
    pub fn finite_count(&self, x: i64, y: i64, w: i64, h: i64) -> u32 {
        let Some(b) = self.clamp_window(x, y, w, h) else {
            return 0;
        };
        let stride = self.width + 1;
        let at = |cx: usize, cy: usize| self.finite[cy * stride + cx] as i64;
        (at(b.x1, b.y1) - at(b.x0, b.y1) - at(b.x1, b.y0) + at(b.x0, b.y0)) as u32
    }

    /// Area of the window after clamping.
    pub fn area(&self, x: i64, y: i64, w: i64, h: i64) -> usize {
        self.clamp_window(x, y, w, h).map_or(0, |b| b.area())
    }

    #[inline]
    fn pair(&self, i: usize, j: usize) -> usize {
        let (i, j) = if i <= j { (i, j) } else { (j, i) };
        // rows 0..i of the upper triangle hold (channels - r) entries each
        i * self.channels - i * i.saturating_sub(1) / 2 - i + j
    }

    #[inline]
    fn lookup(&self, table: &[f64], planes: usize, plane: usize, b: &WindowBounds) -> f64 {
        let stride = self.width + 1;
        let at = |cx: usize, cy: usize| table[(cy * stride + cx) * planes + plane];
        at(b.x1, b.y1) - at(b.x0, b.y1) - at(b.x1, b.y0) + at(b.x0, b.y0)
    }
}

//! Numeric kernels shared by the hash pipelines: the `Plane` matrix type,
//! convolution, resampling, matrix multiplication and order statistics.

use std::borrow::Cow;

use rayon::prelude::*;

use crate::error::{Error, Result};

/// A width x height matrix of f32 samples in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    /// Allocate a zero-filled plane, reporting allocation failure instead of
    /// aborting the process.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let len = width.checked_mul(height).ok_or_else(|| {
            Error::InvalidInput(format!("plane dimensions overflow: {width}x{height}"))
        })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| Error::Resource(format!("failed to allocate {width}x{height} plane")))?;
        data.resize(len, 0.0);
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap existing samples; `data` must hold exactly `width * height`
    /// values.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::InvalidInput(format!(
                "{} samples do not fill a {width}x{height} plane",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A plane with every sample set to `value`.
    pub fn filled(width: usize, height: usize, value: f32) -> Result<Self> {
        let mut plane = Self::new(width, height)?;
        plane.data.fill(value);
        Ok(plane)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[inline]
    fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }
}

/// Correlate `image` with `kernel`, producing a plane of the same size.
///
/// Out-of-range samples clamp to the nearest edge pixel. The kernel sum is
/// not normalized. Output rows are computed in parallel; each reads only the
/// immutable input and writes its own disjoint slice.
pub fn convolve(image: &Plane, kernel: &Plane) -> Result<Plane> {
    if image.width == 0 || image.height == 0 {
        return Err(Error::InvalidInput("cannot convolve an empty plane".to_string()));
    }
    if kernel.width == 0 || kernel.height == 0 {
        return Err(Error::InvalidInput("cannot convolve with an empty kernel".to_string()));
    }

    let mut out = Plane::new(image.width, image.height)?;
    let wi = image.width as isize;
    let hi = image.height as isize;

    // Window extents around the anchor; for even kernels the anchor sits
    // right of center.
    let mx2 = (kernel.width / 2) as isize;
    let my2 = (kernel.height / 2) as isize;
    let mx1 = mx2 - 1 + (kernel.width % 2) as isize;
    let my1 = my2 - 1 + (kernel.height % 2) as isize;

    let width = image.width;
    out.data
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as isize;
            let row_interior = y >= my1 && y < hi - my2;
            for (xu, cell) in row.iter_mut().enumerate() {
                let x = xu as isize;
                let mut acc = 0.0f32;
                if row_interior && x >= mx1 && x < wi - mx2 {
                    // whole window in range, no clamping needed
                    for ym in -my1..=my2 {
                        let base = ((y + ym) * wi + (x - mx1)) as usize;
                        let krow = ((ym + my1) as usize) * kernel.width;
                        for kx in 0..kernel.width {
                            acc += image.data[base + kx] * kernel.data[krow + kx];
                        }
                    }
                } else {
                    for ym in -my1..=my2 {
                        let yy = (y + ym).clamp(0, hi - 1) as usize;
                        let krow = ((ym + my1) as usize) * kernel.width;
                        for xm in -mx1..=mx2 {
                            let xx = (x + xm).clamp(0, wi - 1) as usize;
                            acc += image.at(xx, yy) * kernel.data[krow + (xm + mx1) as usize];
                        }
                    }
                }
                *cell = acc;
            }
        });

    Ok(out)
}

/// Nearest-neighbor resample to `new_width` x `new_height`.
///
/// Resizing to the source dimensions is the identity and borrows the input
/// instead of copying it.
pub fn resize_nearest(image: &Plane, new_width: usize, new_height: usize) -> Result<Cow<'_, Plane>> {
    if image.width == 0 || image.height == 0 {
        return Err(Error::InvalidInput("cannot resize an empty plane".to_string()));
    }
    if new_width == 0 || new_height == 0 {
        return Err(Error::InvalidInput("cannot resize to an empty plane".to_string()));
    }
    if new_width == image.width && new_height == image.height {
        return Ok(Cow::Borrowed(image));
    }

    let mut out = Plane::new(new_width, new_height)?;
    for y in 0..new_height {
        let sy = y * image.height / new_height;
        for x in 0..new_width {
            let sx = x * image.width / new_width;
            out.data[y * new_width + x] = image.at(sx, sy);
        }
    }
    Ok(Cow::Owned(out))
}

/// Multiply two matrices. The left operand is `left.height` rows by
/// `left.width` columns, so shapes must satisfy `left.width == right.height`.
pub fn matmul(left: &Plane, right: &Plane) -> Result<Plane> {
    if left.width != right.height {
        return Err(Error::DimensionMismatch {
            left_rows: left.height,
            left_cols: left.width,
            right_rows: right.height,
            right_cols: right.width,
        });
    }

    let mut out = Plane::new(right.width, left.height)?;
    for i in 0..left.height {
        for k in 0..left.width {
            let l = left.at(k, i);
            let out_row = &mut out.data[i * right.width..(i + 1) * right.width];
            let right_row = &right.data[k * right.width..(k + 1) * right.width];
            for (o, r) in out_row.iter_mut().zip(right_row) {
                *o += l * r;
            }
        }
    }
    Ok(out)
}

/// The k-th smallest value (0-based) of `values`, found by in-place
/// selection in expected linear time.
pub fn kth_smallest(values: &[f32], k: usize) -> Result<f32> {
    if k >= values.len() {
        return Err(Error::InvalidInput(format!(
            "order statistic {k} out of range for {} values",
            values.len()
        )));
    }
    let mut scratch = Vec::new();
    scratch
        .try_reserve_exact(values.len())
        .map_err(|_| Error::Resource("failed to allocate selection scratch buffer".to_string()))?;
    scratch.extend_from_slice(values);
    let (_, kth, _) = scratch.select_nth_unstable_by(k, f32::total_cmp);
    Ok(*kth)
}

/// Median by selection. Even-length inputs average the two central order
/// statistics exactly; ties are broken by value, not position.
pub fn median(values: &[f32]) -> Result<f32> {
    let n = values.len();
    if n == 0 {
        return Err(Error::InvalidInput("median of an empty set".to_string()));
    }
    let mut scratch = Vec::new();
    scratch
        .try_reserve_exact(n)
        .map_err(|_| Error::Resource("failed to allocate selection scratch buffer".to_string()))?;
    scratch.extend_from_slice(values);

    let (below, upper, _) = scratch.select_nth_unstable_by(n / 2, f32::total_cmp);
    let upper = *upper;
    if n % 2 == 1 {
        Ok(upper)
    } else {
        // the (n/2 - 1)-th statistic is the largest value left of the pivot
        let lower = below.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        Ok((lower + upper) / 2.0)
    }
}

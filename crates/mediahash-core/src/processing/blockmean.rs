//! Block mean value hashing.
//!
//! The image is partitioned into a `bits` x `bits` grid of cells covering
//! the full area. Each cell's mean intensity is computed, then every cell is
//! compared against the median of all cell means: greater means emit 1,
//! everything else 0, in row-major reading order.
//!
//! The standard variant integrates intensity over exact cell extents, so a
//! pixel straddling a cell boundary contributes to both neighbouring cells
//! in proportion to the overlapped fraction. The quick variant assigns
//! whole pixels to cells by integer bounds, trading boundary precision for
//! speed. Both treat a fully transparent pixel as white.

use rayon::prelude::*;

use crate::error::Result;
use crate::processing::kernels;
use crate::types::Hash;

/// Per-pixel intensity: mean of the colour channels, with fully transparent
/// pixels counted as white.
#[inline]
fn intensity(rgba: &[u8]) -> f64 {
    if rgba[3] == 0 {
        255.0
    } else {
        (rgba[0] as f64 + rgba[1] as f64 + rgba[2] as f64) / 3.0
    }
}

/// Split one pixel along a grid axis: the cell index on each side of the
/// pixel and the fraction of the pixel falling into each. A pixel that does
/// not touch a cell boundary lands wholly in its cell (both indices equal).
fn split_axis(coord: usize, cell_size: f64, extent: usize) -> (usize, usize, f64, f64) {
    let past = ((coord + 1) as f64) % cell_size;
    let frac = past.fract();
    let low = (coord as f64 / cell_size).floor() as usize;
    let high = if past.trunc() > 0.0 || coord + 1 == extent {
        low
    } else {
        (coord as f64 / cell_size).ceil() as usize
    };
    (low, high, 1.0 - frac, frac)
}

/// Area-weighted block mean hash of an interleaved RGBA buffer.
///
/// Zero-area images produce an all-zero hash of the full grid length.
pub fn blockmean_hash(data: &[u8], width: usize, height: usize, bits: u32) -> Result<Hash> {
    let bits = bits as usize;
    if width * height == 0 {
        return Ok(Hash::zero_bits(bits * bits));
    }
    debug_assert_eq!(data.len(), width * height * 4);

    // Evenly divisible grids have no fractional overlap to integrate.
    if width % bits == 0 && height % bits == 0 {
        return blockmean_hash_quick(data, width, height, bits as u32);
    }

    let cell_width = width as f64 / bits as f64;
    let cell_height = height as f64 / bits as f64;
    let mut cells = vec![0.0f64; bits * bits];

    for y in 0..height {
        let (top, bottom, weight_top, weight_bottom) = split_axis(y, cell_height, height);
        let top = top.min(bits - 1);
        let bottom = bottom.min(bits - 1);
        for x in 0..width {
            let (left, right, weight_left, weight_right) = split_axis(x, cell_width, width);
            let left = left.min(bits - 1);
            let right = right.min(bits - 1);
            let value = intensity(&data[(y * width + x) * 4..(y * width + x) * 4 + 4]);

            cells[top * bits + left] += value * weight_top * weight_left;
            cells[top * bits + right] += value * weight_top * weight_right;
            cells[bottom * bits + left] += value * weight_bottom * weight_left;
            cells[bottom * bits + right] += value * weight_bottom * weight_right;
        }
    }

    let area = cell_width * cell_height;
    let means: Vec<f32> = cells.iter().map(|sum| (sum / area) as f32).collect();
    threshold_against_median(&means)
}

/// Quick block mean hash: each cell averages the whole pixels inside its
/// integer bounds. Cells are independent and computed in parallel.
pub fn blockmean_hash_quick(data: &[u8], width: usize, height: usize, bits: u32) -> Result<Hash> {
    let bits = bits as usize;
    if width * height == 0 {
        return Ok(Hash::zero_bits(bits * bits));
    }
    debug_assert_eq!(data.len(), width * height * 4);

    let means: Vec<f32> = (0..bits * bits)
        .into_par_iter()
        .map(|cell| {
            let cy = cell / bits;
            let cx = cell % bits;
            // integer cell bounds; grids finer than the image still sample
            // at least the nearest enclosing pixel
            let y0 = (cy * height / bits).min(height - 1);
            let y1 = ((cy + 1) * height / bits).max(y0 + 1);
            let x0 = (cx * width / bits).min(width - 1);
            let x1 = ((cx + 1) * width / bits).max(x0 + 1);

            let mut sum = 0.0f64;
            for y in y0..y1 {
                for x in x0..x1 {
                    sum += intensity(&data[(y * width + x) * 4..(y * width + x) * 4 + 4]);
                }
            }
            (sum / ((y1 - y0) * (x1 - x0)) as f64) as f32
        })
        .collect();

    threshold_against_median(&means)
}

fn threshold_against_median(means: &[f32]) -> Result<Hash> {
    let median = kernels::median(means)?;
    Ok(Hash::Bits(
        means.iter().map(|&m| u8::from(m > median)).collect(),
    ))
}

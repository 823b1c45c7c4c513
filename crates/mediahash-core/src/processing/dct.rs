//! Fixed 64-bit DCT hashing.
//!
//! Pipeline: luminance extraction, 7x7 mean-filter convolution, resample to
//! 32x32, forward 2D DCT by basis-matrix multiplication, crop of the 8x8
//! low-frequency block at offset (1, 1), median threshold. The result is a
//! 64-bit value carried as two 32-bit words, most significant word first;
//! bit 0 is the lowest-order bit of the low word, assigned in scan order
//! over the cropped block.

use once_cell::sync::Lazy;

use crate::error::{Error, Result};
use crate::processing::kernels::{self, Plane};
use crate::processing::pixels;
use crate::types::Hash;

/// Side length of the DCT input and basis matrix.
const DCT_SIZE: usize = 32;

/// Side length of the smoothing filter.
const MEAN_FILTER_SIZE: usize = 7;

/// Side length of the cropped low-frequency block.
const CROP_SIZE: usize = 8;

/// The 32x32 orthonormal DCT-II basis: row 0 is `1/sqrt(32)`, row y >= 1 is
/// `sqrt(2/32) * cos(pi/64 * y * (2x + 1))`. Computed once per process and
/// immutable afterwards, so concurrent readers are safe.
static DCT_BASIS: Lazy<Plane> = Lazy::new(|| {
    let mut data = vec![0.0f32; DCT_SIZE * DCT_SIZE];
    let dc = 1.0 / (DCT_SIZE as f32).sqrt();
    for value in data.iter_mut().take(DCT_SIZE) {
        *value = dc;
    }
    let scale = (2.0 / DCT_SIZE as f32).sqrt();
    for y in 1..DCT_SIZE {
        for x in 0..DCT_SIZE {
            let angle =
                std::f32::consts::PI / (2.0 * DCT_SIZE as f32) * (y * (2 * x + 1)) as f32;
            data[y * DCT_SIZE + x] = scale * angle.cos();
        }
    }
    Plane::from_vec(DCT_SIZE, DCT_SIZE, data).expect("basis dimensions are fixed")
});

/// Transpose of [`DCT_BASIS`], cached alongside it.
static DCT_BASIS_T: Lazy<Plane> = Lazy::new(|| {
    let basis = DCT_BASIS.data();
    let mut data = vec![0.0f32; DCT_SIZE * DCT_SIZE];
    for y in 0..DCT_SIZE {
        for x in 0..DCT_SIZE {
            data[x * DCT_SIZE + y] = basis[y * DCT_SIZE + x];
        }
    }
    Plane::from_vec(DCT_SIZE, DCT_SIZE, data).expect("basis dimensions are fixed")
});

/// Compute the fixed 64-bit DCT hash of an interleaved RGB buffer.
///
/// Zero-area images produce a zero hash of the fixed two-word length.
pub fn dct64_hash(data: &[u8], width: usize, height: usize) -> Result<Hash> {
    if width * height == 0 {
        return Ok(Hash::zero_words(2));
    }

    let luma = pixels::luminance_plane(data, width, height)?.ok_or_else(|| {
        Error::InvalidInput("luminance plane unavailable for a non-empty image".to_string())
    })?;

    let mean_filter = Plane::filled(MEAN_FILTER_SIZE, MEAN_FILTER_SIZE, 1.0)?;
    let smoothed = kernels::convolve(&luma, &mean_filter)?;
    let resized = kernels::resize_nearest(&smoothed, DCT_SIZE, DCT_SIZE)?;

    let transformed = kernels::matmul(&kernels::matmul(&DCT_BASIS, resized.as_ref())?, &DCT_BASIS_T)?;

    // low-frequency block, skipping the DC row and column
    let mut block = [0.0f32; CROP_SIZE * CROP_SIZE];
    for y in 0..CROP_SIZE {
        for x in 0..CROP_SIZE {
            block[y * CROP_SIZE + x] = transformed.data()[(y + 1) * DCT_SIZE + (x + 1)];
        }
    }

    Ok(Hash::Words(words_from_block(&block)?))
}

/// Threshold the cropped block against its median and pack the bits into
/// two 32-bit words, most significant first.
fn words_from_block(block: &[f32; CROP_SIZE * CROP_SIZE]) -> Result<Vec<u32>> {
    let median = kernels::median(block)?;
    let mut value = 0u64;
    for (i, &coefficient) in block.iter().enumerate() {
        if coefficient > median {
            value |= 1u64 << i;
        }
    }
    Ok(vec![(value >> 32) as u32, value as u32])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_dc_row_is_constant() {
        let expected = 1.0 / (32.0f32).sqrt();
        for x in 0..DCT_SIZE {
            assert!((DCT_BASIS.data()[x] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn basis_times_transpose_is_identity() {
        let product = kernels::matmul(&DCT_BASIS, &DCT_BASIS_T).unwrap();
        for y in 0..DCT_SIZE {
            for x in 0..DCT_SIZE {
                let expected = if x == y { 1.0 } else { 0.0 };
                let got = product.data()[y * DCT_SIZE + x];
                assert!(
                    (got - expected).abs() < 1e-4,
                    "basis product at ({x}, {y}) was {got}"
                );
            }
        }
    }

    #[test]
    fn ramp_block_sets_half_the_bits() {
        let mut block = [0.0f32; 64];
        for (i, value) in block.iter_mut().enumerate() {
            *value = i as f32;
        }
        let words = words_from_block(&block).unwrap();
        let combined = ((words[0] as u64) << 32) | words[1] as u64;
        // median of 0..=63 is 31.5; values 32..=63 exceed it
        assert_eq!(combined.count_ones(), 32);
        assert_eq!(combined, 0xffff_ffff_0000_0000);
    }

    #[test]
    fn hash_is_deterministic() {
        let width = 41;
        let height = 29;
        let data: Vec<u8> = (0..width * height * 3)
            .map(|i| ((i * 7 + 13) % 256) as u8)
            .collect();
        let first = dct64_hash(&data, width, height).unwrap();
        let second = dct64_hash(&data, width, height).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn zero_area_image_hashes_to_zero_words() {
        assert_eq!(dct64_hash(&[], 0, 7).unwrap(), Hash::zero_words(2));
        assert_eq!(dct64_hash(&[], 7, 0).unwrap(), Hash::zero_words(2));
    }

    #[test]
    fn already_32x32_input_is_hashed() {
        let data: Vec<u8> = (0..32 * 32 * 3).map(|i| (i % 251) as u8).collect();
        let hash = dct64_hash(&data, 32, 32).unwrap();
        assert_eq!(hash.len(), 2);
    }
}

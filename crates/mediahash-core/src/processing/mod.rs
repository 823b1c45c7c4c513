//! Image hash computation: decoding, pixel export and kernel dispatch.

pub mod blockmean;
pub mod dct;
pub mod kernels;
pub mod pixels;

use image::DynamicImage;
use log::debug;

use crate::config::{HashMethod, HashTask};
use crate::error::Result;
use crate::types::Hash;

/// Hash a still image file.
pub fn hash_image_file(task: &HashTask) -> Result<Hash> {
    debug!("processing image file '{}'", task.source.display());
    let img = image::open(&task.source)?;
    hash_image(&img, task.bits, task.method)
}

/// Hash an already decoded image.
///
/// Pixels are exported to the channel layout the method expects; the decoder
/// never applies embedded colour profiles, so hashes are stable across
/// profile variants of the same image. Zero-area images produce an all-zero
/// hash of the method's natural length rather than an error.
pub fn hash_image(img: &DynamicImage, bits: u32, method: HashMethod) -> Result<Hash> {
    match method {
        HashMethod::BlockMean => {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            blockmean::blockmean_hash(rgba.as_raw(), width as usize, height as usize, bits)
        }
        HashMethod::BlockMeanQuick => {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            blockmean::blockmean_hash_quick(rgba.as_raw(), width as usize, height as usize, bits)
        }
        HashMethod::Dct64 => {
            let rgb = img.to_rgb8();
            let (width, height) = rgb.dimensions();
            dct::dct64_hash(rgb.as_raw(), width as usize, height as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_pixel(width, height, Rgba(rgba)))
    }

    #[test]
    fn solid_image_blockmean_hex_is_all_zeros() {
        let img = solid_image(50, 40, [10, 200, 30, 255]);
        let hash = hash_image(&img, 16, HashMethod::BlockMean).unwrap();
        assert_eq!(hash.to_hex(), "0".repeat(64));
    }

    #[test]
    fn zero_sized_image_hashes_for_both_methods() {
        let img = solid_image(0, 0, [0, 0, 0, 0]);
        assert_eq!(
            hash_image(&img, 16, HashMethod::BlockMean).unwrap(),
            Hash::zero_bits(256)
        );
        assert_eq!(
            hash_image(&img, 16, HashMethod::Dct64).unwrap(),
            Hash::zero_words(2)
        );
    }

    #[test]
    fn dct_hash_is_stable_across_calls() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_fn(120, 90, |x, y| {
            Rgba([(x * 2) as u8, (y * 3) as u8, ((x + y) % 256) as u8, 255])
        }));
        let first = hash_image(&img, 16, HashMethod::Dct64).unwrap();
        let second = hash_image(&img, 16, HashMethod::Dct64).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_hex().len(), 16);
    }

    #[test]
    fn quick_method_dispatches() {
        let img = solid_image(64, 64, [80, 80, 80, 255]);
        let hash = hash_image(&img, 8, HashMethod::BlockMeanQuick).unwrap();
        assert_eq!(hash, Hash::zero_bits(64));
    }
}

//! Pixel preprocessing for the hash kernels.

use crate::error::Result;
use crate::processing::kernels::Plane;

/// Convert interleaved RGB samples to a single-channel luminance plane.
///
/// Uses the integer BT.601 weighting `Y = (66R + 129G + 25B + 128)/256 + 16`,
/// clamped to [0, 255]. Returns `None` when the image has no pixels; callers
/// apply the zero-area hash policy before exporting pixel data.
pub fn luminance_plane(data: &[u8], width: usize, height: usize) -> Result<Option<Plane>> {
    let pixel_count = width * height;
    if pixel_count == 0 {
        return Ok(None);
    }
    debug_assert_eq!(data.len(), pixel_count * 3);

    let mut plane = Plane::new(width, height)?;
    for (luma, rgb) in plane.data_mut().iter_mut().zip(data.chunks_exact(3)) {
        let r = rgb[0] as f32;
        let g = rgb[1] as f32;
        let b = rgb[2] as f32;
        let y = (66.0 * r + 129.0 * g + 25.0 * b + 128.0) / 256.0 + 16.0;
        *luma = y.clamp(0.0, 255.0);
    }
    Ok(Some(plane))
}

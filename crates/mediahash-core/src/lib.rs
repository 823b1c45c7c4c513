//! Core functionality for computing perceptual hashes of images and videos.
//!
//! Two hash families are provided:
//! - a block mean value hash: an N x N grid of cell intensities thresholded
//!   against the median of the cell means, and
//! - a fixed 64-bit DCT hash of the smoothed, resampled luminance plane.
//!
//! Visually similar inputs map to hashes with small Hamming distance, even
//! after minor re-encoding or colour adjustment. These are not cryptographic
//! hashes; there is no collision resistance or adversarial robustness.
//!
//! Video inputs are fingerprinted by sampling four representative frames,
//! hashing each through the still-image path, and concatenating the partial
//! hashes in slot order.

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::*;
pub use error::{Error, Result};
pub use types::*;

// -- Public Modules --
pub mod config;
pub mod processing;
pub mod serialize;
pub mod types;
pub mod video;

/// Compute the hash for one input file according to its task settings.
///
/// Each call runs the full pipeline for one file to completion; callers
/// processing several files invoke it strictly sequentially or from
/// independent worker threads. The only shared state is the cached DCT
/// basis matrix, which is initialized once and read-only afterwards.
pub fn process_task(task: &HashTask) -> Result<Hash> {
    if task.video {
        video::hash_video_file(task)
    } else {
        processing::hash_image_file(task)
    }
}

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::Hash;

/// Default hash grid size for still images
pub const DEFAULT_BITS: u32 = 16;

/// Hashing method to apply to decoded pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashMethod {
    /// Block mean value hash with fractional cell overlap integration
    BlockMean,

    /// Block mean value hash sampling whole pixels per cell
    BlockMeanQuick,

    /// Fixed 64-bit DCT hash
    Dct64,
}

impl HashMethod {
    /// The all-zero hash this method emits for inputs with no visual content
    /// (zero-area images, zero-frame videos).
    pub fn zero_hash(&self, bits: u32) -> Hash {
        match self {
            HashMethod::BlockMean | HashMethod::BlockMeanQuick => {
                Hash::zero_bits((bits * bits) as usize)
            }
            HashMethod::Dct64 => Hash::zero_words(2),
        }
    }
}

/// Per-file hash computation settings, built once from command-line
/// arguments and read-only for the rest of the pipeline.
#[derive(Debug, Clone)]
pub struct HashTask {
    /// File to hash
    pub source: PathBuf,

    /// Effective grid size for the block mean family
    pub bits: u32,

    /// Hashing method
    pub method: HashMethod,

    /// Whether to emit debugging output
    pub debug: bool,

    /// Whether the source is a video file
    pub video: bool,
}

impl HashTask {
    /// Build a task from user-facing settings.
    ///
    /// `bits` must be a positive multiple of 4. When `video` is set the
    /// effective per-frame grid is halved, so the four concatenated frame
    /// hashes come out the same size as a still-image hash.
    pub fn new(
        source: PathBuf,
        bits: u32,
        method: HashMethod,
        debug: bool,
        video: bool,
    ) -> Result<Self> {
        validate_bits(bits)?;
        let bits = if video { bits / 2 } else { bits };
        Ok(Self {
            source,
            bits,
            method,
            debug,
            video,
        })
    }
}

/// Grid sizes must be positive multiples of 4 so cells pack evenly into hex
/// digits.
pub fn validate_bits(bits: u32) -> Result<()> {
    if bits == 0 || bits % 4 != 0 {
        return Err(Error::InvalidInput(format!(
            "bits must be a positive multiple of 4, got {bits}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_bits() {
        assert!(validate_bits(0).is_err());
        assert!(validate_bits(15).is_err());
        assert!(validate_bits(16).is_ok());
    }

    #[test]
    fn video_task_halves_the_grid() {
        let task = HashTask::new(
            PathBuf::from("clip.mp4"),
            DEFAULT_BITS,
            HashMethod::BlockMean,
            false,
            true,
        )
        .unwrap();
        assert_eq!(task.bits, 8);
    }

    #[test]
    fn zero_hash_lengths() {
        assert_eq!(HashMethod::BlockMean.zero_hash(8).len(), 64);
        assert_eq!(HashMethod::Dct64.zero_hash(8).len(), 2);
    }
}

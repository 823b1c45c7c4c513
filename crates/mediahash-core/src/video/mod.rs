//! Video fingerprinting: frame decoding, sampling and aggregation.
//!
//! A video is represented by four sampled frames. Each sampled frame is
//! re-encoded as a standalone bitmap and pushed through the still-image
//! hashing path; the four partial hashes are concatenated in slot order
//! into one fingerprint.
//!
//! The decoder interface never reports a frame total up front, so hashing
//! always runs two passes over the stream: a counting pass that drains and
//! discards every decoded frame, then a sampling pass over a freshly
//! spawned decoder. Nothing is shared between the passes, so codec-internal
//! buffering cannot leak across the restart.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use ffmpeg_sidecar::iter::FfmpegIterator;
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use log::{debug, warn};

use crate::config::HashTask;
use crate::error::{Error, Result};
use crate::processing;
use crate::types::Hash;

/// Number of frames sampled per video.
const HASH_PART_COUNT: usize = 4;

/// A decoded video frame in interleaved RGB order.
struct RawFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// One decoding pass over the video stream, in presentation order.
///
/// The ffmpeg child process is reaped on drop, so early error returns
/// release the decoder before another pass spawns a new one.
struct FrameStream {
    child: FfmpegChild,
    events: FfmpegIterator,
    failed: Option<String>,
}

impl FrameStream {
    fn open(source: &Path) -> Result<Self> {
        let mut child = FfmpegCommand::new()
            .input(source.to_string_lossy())
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .spawn()
            .map_err(|e| {
                Error::Source(format!(
                    "failed to start decoder for '{}': {e}",
                    source.display()
                ))
            })?;
        let events = child.iter().map_err(|e| {
            Error::Source(format!(
                "failed to read decoder output for '{}': {e}",
                source.display()
            ))
        })?;
        Ok(Self {
            child,
            events,
            failed: None,
        })
    }

    /// Next decoded frame, or `None` at end of stream or on decoder failure.
    /// After `None`, [`FrameStream::failure`] distinguishes the two.
    fn next_frame(&mut self) -> Option<RawFrame> {
        for event in self.events.by_ref() {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    return Some(RawFrame {
                        width: frame.width,
                        height: frame.height,
                        data: frame.data,
                    });
                }
                FfmpegEvent::Error(msg) | FfmpegEvent::Log(LogLevel::Fatal, msg) => {
                    self.failed.get_or_insert(msg);
                    return None;
                }
                FfmpegEvent::Log(LogLevel::Error, msg) => {
                    warn!("decoder: {msg}");
                }
                _ => {}
            }
        }
        None
    }

    /// First fatal error the decoder reported, if any.
    fn failure(&self) -> Option<&str> {
        self.failed.as_deref()
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Fully drain one decoding pass, counting the decoded frames.
fn count_frames(source: &Path) -> Result<u64> {
    let mut stream = FrameStream::open(source)?;
    let mut count = 0u64;
    while stream.next_frame().is_some() {
        count += 1;
    }
    if let Some(msg) = stream.failure() {
        return Err(Error::Source(format!(
            "failed to decode '{}': {msg}",
            source.display()
        )));
    }
    Ok(count)
}

/// Frame indices sampled from a stream of `frame_count` frames, by slot.
///
/// Returns `None` for an empty stream. Slots are not necessarily in index
/// order, and short videos may sample the same index into several slots.
fn sample_indices(frame_count: u64) -> Option<[u64; HASH_PART_COUNT]> {
    if frame_count == 0 {
        return None;
    }
    let (first, last) = if frame_count < 11 {
        (0, frame_count - 1)
    } else {
        (10, frame_count - 11)
    };
    let mid1 = (frame_count as f64 * 0.35).floor() as u64;
    let mid2 = (frame_count as f64 * 0.7).floor() as u64;
    Some([first, mid1, mid2, last])
}

/// Re-encode a decoded frame as a standalone bitmap byte stream, so it can
/// travel through the still-image decoding path.
fn encode_bmp(frame: RawFrame) -> Result<Vec<u8>> {
    let image = RgbImage::from_raw(frame.width, frame.height, frame.data).ok_or_else(|| {
        Error::InvalidInput(format!(
            "frame buffer does not match {}x{} rgb dimensions",
            frame.width, frame.height
        ))
    })?;
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image).write_to(&mut bytes, ImageOutputFormat::Bmp)?;
    Ok(bytes.into_inner())
}

/// Debug helper: save a sampled frame next to the input as
/// `<input>-frm-<index>.bmp`. Failure to save is only a warning.
fn dump_frame(source: &Path, index: u64, bmp: &[u8]) {
    let mut name = source.as_os_str().to_owned();
    name.push(format!("-frm-{index}.bmp"));
    let path = PathBuf::from(name);
    debug!("saving frame {index} to '{}'", path.display());
    if let Err(e) = std::fs::write(&path, bmp) {
        warn!("failed to save frame {index} to '{}': {e}", path.display());
    }
}

/// Hash a video file.
///
/// Samples four representative frames and concatenates their hashes in slot
/// order. An empty stream hashes to a single-image-length zero hash with no
/// aggregation. Any sampled frame that fails to decode fails the whole file.
pub fn hash_video_file(task: &HashTask) -> Result<Hash> {
    debug!("processing video file '{}'", task.source.display());

    // Counting pass.
    let frame_count = count_frames(&task.source)?;
    debug!(
        "video '{}' has {frame_count} frames",
        task.source.display()
    );

    let Some(wanted) = sample_indices(frame_count) else {
        return Ok(task.method.zero_hash(task.bits));
    };
    debug!("sampling frames {wanted:?}");

    // Sampling pass over a fresh decoder.
    let mut stream = FrameStream::open(&task.source)?;
    let mut samples: [Option<Hash>; HASH_PART_COUNT] = [None, None, None, None];
    let mut filled = 0;
    let mut current: u64 = 0;

    while filled < HASH_PART_COUNT {
        let Some(frame) = stream.next_frame() else {
            break;
        };
        if wanted.contains(&current) {
            let bmp = encode_bmp(frame)?;
            if task.debug {
                dump_frame(&task.source, current, &bmp);
            }
            let img = image::load_from_memory(&bmp)?;
            let part = processing::hash_image(&img, task.bits, task.method)?;
            debug!("frame {current} hash: {}", part.to_hex());
            // the same frame may fill several slots
            for (slot, sample) in samples.iter_mut().enumerate() {
                if sample.is_none() && wanted[slot] == current {
                    *sample = Some(part.clone());
                    filled += 1;
                }
            }
        }
        current += 1;
    }
    if let Some(msg) = stream.failure() {
        return Err(Error::Source(format!(
            "failed to decode '{}': {msg}",
            task.source.display()
        )));
    }
    drop(stream);

    let mut parts = Vec::with_capacity(HASH_PART_COUNT);
    for (slot, sample) in samples.into_iter().enumerate() {
        parts.push(sample.ok_or_else(|| {
            Error::Source(format!(
                "frame {} for part {slot} never arrived from '{}'",
                wanted[slot],
                task.source.display()
            ))
        })?);
    }
    Hash::concat(parts)
}

//! # Frame Encoder
//!
//! Turns a [`PixelGrid`] into the ordered frame sequence the receiver expects:
//! one meta frame, then `ceil(W*H / 3)` data frames in row-major order.
//!
//! ## Sequence Counter
//!
//! Data frames carry a counter that starts at 1 and advances as
//! `(count + 1) mod 256`:
//!
//! ```text
//! frame:  1   2  ...  255  256  257 ...
//! SEQ:    1   2  ...  255    0    1 ...
//! ```
//!
//! The counter does pass through 0 every 256 data frames. Receivers tell a
//! meta frame apart by the type byte at offset 1, not by byte 2.

use tracing::{debug, info};

use super::frame::{Frame, PIXELS_PER_FRAME};
use super::grid::PixelGrid;
use crate::error::PixelwireError;

/// Number of leading frames described field-by-field at debug level.
const PREVIEW_FRAMES: usize = 10;

/// Total frames produced for a grid of `pixel_count` samples.
pub fn frame_count(pixel_count: usize) -> usize {
    1 + pixel_count.div_ceil(PIXELS_PER_FRAME)
}

/// Sequence counter of the n-th data frame (1-based).
#[inline]
pub fn seq_for(data_frame_number: usize) -> u8 {
    (data_frame_number % 256) as u8
}

/// # Encode a Grid
///
/// Pure and deterministic: the same grid always yields the same bytes.
///
/// ```
/// use pixelwire::protocol::{encode, Frame, PixelGrid};
///
/// let grid = PixelGrid::new(2, 2, vec![10, 20, 30, 40])?;
/// let frames = encode(&grid);
///
/// assert_eq!(frames.len(), 3);
/// assert_eq!(frames[0], Frame::meta(2, 2));
/// assert_eq!(frames[1], Frame::data(1, [10, 20, 30]));
/// assert_eq!(frames[2], Frame::data(2, [40, 0, 0]));
/// # Ok::<(), pixelwire::PixelwireError>(())
/// ```
pub fn encode(grid: &PixelGrid) -> Vec<Frame> {
    let mut frames = Vec::with_capacity(frame_count(grid.pixel_count()));
    frames.push(Frame::meta(grid.width(), grid.height()));

    for (i, chunk) in grid.samples().chunks(PIXELS_PER_FRAME).enumerate() {
        let mut pixels = [0u8; PIXELS_PER_FRAME];
        pixels[..chunk.len()].copy_from_slice(chunk);
        frames.push(Frame::data(seq_for(i + 1), pixels));
    }

    info!(
        width = grid.width(),
        height = grid.height(),
        frames = frames.len(),
        data_frames = frames.len() - 1,
        "encoded pixel grid"
    );
    for (i, frame) in frames.iter().take(PREVIEW_FRAMES).enumerate() {
        describe(i + 1, frame);
    }

    frames
}

fn describe(number: usize, frame: &Frame) {
    let bytes = frame.as_bytes();
    match frame {
        Frame::Meta(meta) => debug!(
            frame = number,
            hex = %frame,
            width = meta.width(),
            height = meta.height(),
            checksum = meta.checksum(),
            computed = super::frame::checksum(&bytes[..7]),
            "meta frame"
        ),
        Frame::Data(data) => debug!(
            frame = number,
            hex = %frame,
            seq = data.seq(),
            pixels = ?data.pixels(),
            checksum = data.checksum(),
            computed = super::frame::checksum(&bytes[..6]),
            "data frame"
        ),
    }
}

/// # Decode a Frame Sequence
///
/// Inverse of [`encode`], used to verify a frame list before it is sent.
/// Expects the meta frame first, then data frames whose counters follow the
/// wrap rule. Zero padding in the final frame is dropped.
///
/// ## Errors
///
/// `InvalidFrame` if the sequence is empty, out of order, has the wrong
/// number of data frames or a counter out of step.
pub fn decode(frames: &[Frame]) -> Result<PixelGrid, PixelwireError> {
    let (first, rest) = frames
        .split_first()
        .ok_or_else(|| PixelwireError::InvalidFrame("empty frame sequence".to_string()))?;

    let Frame::Meta(meta) = first else {
        return Err(PixelwireError::InvalidFrame(
            "first frame is not a meta frame".to_string(),
        ));
    };

    let pixel_count = meta.width() as usize * meta.height() as usize;
    let expected = frame_count(pixel_count) - 1;
    if rest.len() != expected {
        return Err(PixelwireError::InvalidFrame(format!(
            "expected {} data frames for {}x{}, got {}",
            expected,
            meta.width(),
            meta.height(),
            rest.len()
        )));
    }

    let mut samples = Vec::with_capacity(expected * PIXELS_PER_FRAME);
    for (i, frame) in rest.iter().enumerate() {
        let Frame::Data(data) = frame else {
            return Err(PixelwireError::InvalidFrame(format!(
                "frame {} is a meta frame",
                i + 2
            )));
        };
        if data.seq() != seq_for(i + 1) {
            return Err(PixelwireError::InvalidFrame(format!(
                "frame {} has sequence {}, expected {}",
                i + 2,
                data.seq(),
                seq_for(i + 1)
            )));
        }
        samples.extend_from_slice(&data.pixels());
    }
    samples.truncate(pixel_count);

    PixelGrid::new(meta.width() as usize, meta.height() as usize, samples)
}

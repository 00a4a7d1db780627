//! # Image Frame Protocol
//!
//! This module implements the byte-level protocol used to stream a grayscale
//! image to an FPGA receiver over a UART.
//!
//! ## Module Structure
//!
//! - [`frame`]: Meta and data frame layouts, checksums, parsing
//! - [`grid`]: The pixel grid handed in by image preprocessing
//! - [`encoder`]: Grid to frame sequence, and back
//!
//! ## Usage Example
//!
//! ```
//! use pixelwire::protocol::{encode, PixelGrid};
//!
//! // 64x64 grayscale image, all mid-gray
//! let grid = PixelGrid::new(64, 64, vec![0x80; 64 * 64])?;
//! let frames = encode(&grid);
//!
//! // 1 meta frame + ceil(4096 / 3) data frames
//! assert_eq!(frames.len(), 1 + 1366);
//!
//! // Send each `frame.as_bytes()` via transport...
//! # Ok::<(), pixelwire::PixelwireError>(())
//! ```

pub mod encoder;
pub mod frame;
pub mod grid;

pub use encoder::{decode, encode, frame_count};
pub use frame::{DataFrame, Frame, FrameKind, MetaFrame};
pub use grid::{GridStats, PixelGrid};

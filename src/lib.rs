//! # Pixelwire - Grayscale Image Transport for FPGA Receivers
//!
//! Pixelwire encodes a grid of 8-bit grayscale samples into a small framed
//! UART protocol and streams it to an FPGA board over a serial port. It
//! provides:
//!
//! - **Protocol implementation**: meta/data frame builders, checksums, parsing
//! - **Transport**: serial port enumeration and a single managed connection
//! - **Pipeline**: paced, cancellable transmission with a per-frame log
//! - **Server**: a JSON API over all of the above
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use pixelwire::{
//!     pipeline::{TransmissionLog, TransmissionPipeline},
//!     protocol::{encode, PixelGrid},
//!     transport::{SerialConfig, SerialLink},
//! };
//!
//! // Open the UART
//! let link = Arc::new(SerialLink::new());
//! link.connect(&SerialConfig::new("/dev/ttyUSB0"))?;
//!
//! // Encode a 64x64 gradient
//! let samples = (0..64 * 64).map(|i| (i % 256) as u8).collect();
//! let frames = encode(&PixelGrid::new(64, 64, samples)?);
//!
//! // Send on a worker thread, 10ms between frames
//! let log = Arc::new(TransmissionLog::new());
//! let pipeline = Arc::new(TransmissionPipeline::new(link, log.clone()));
//! let handle = pipeline.start(frames, Duration::from_millis(10))?;
//!
//! // Poll progress while it runs
//! println!("{} frames logged so far", log.len());
//!
//! let result = handle.join()?;
//! println!("{}/{} frames sent", result.succeeded, result.total_frames);
//! # Ok::<(), pixelwire::PixelwireError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Frame layouts, encoder, pixel grid |
//! | [`transport`] | Serial link and port enumeration |
//! | [`pipeline`] | Paced transmission and its log |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod error;
pub mod pipeline;
pub mod protocol;
pub mod server;
pub mod transport;

// Re-exports for convenience
pub use error::PixelwireError;
pub use protocol::{Frame, PixelGrid, encode};
pub use transport::{SerialConfig, SerialLink};

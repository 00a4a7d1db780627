//! # Error Types
//!
//! This module defines error types used throughout the pixelwire library.
//!
//! Structural errors (bad grid, no connection, nothing to send) abort an
//! operation before any byte reaches the wire. Per-frame write errors inside
//! a transmission run are recorded in the [`TransmissionLog`] instead of
//! being returned.
//!
//! [`TransmissionLog`]: crate::pipeline::TransmissionLog

use thiserror::Error;

/// Main error type for pixelwire operations
#[derive(Debug, Error)]
pub enum PixelwireError {
    /// Pixel grid dimensions or sample count are malformed
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    /// Raw bytes do not form a valid protocol frame
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Opening or configuring the serial port failed
    #[error("Connect failed: {0}")]
    Connect(String),

    /// No serial connection is open
    #[error("Serial port is not connected")]
    NotConnected,

    /// The write timeout elapsed before all bytes were accepted
    #[error("Write timed out: {0}")]
    WriteTimeout(String),

    /// Any other transport failure during a write
    #[error("Write failed: {0}")]
    Write(String),

    /// A transmission was requested with no frames
    #[error("No frames to transmit")]
    EmptyFrameSet,

    /// Another transmission run is still in flight
    #[error("A transmission is already in progress")]
    TransmissionInProgress,

    /// Image loading error (CLI input adapter)
    #[error("Image error: {0}")]
    Image(String),

    /// HTTP server error
    #[error("Server error: {0}")]
    Server(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

//! # Device Transport Layer
//!
//! This module provides the link that carries frames to the FPGA board.
//!
//! ## Available Transports
//!
//! - [`serial`]: UART over a host serial port (USB-UART bridges, COM ports)
//!
//! The transmission pipeline only needs [`FrameLink`], so tests and other
//! backends can stand in for the serial port.

pub mod config;
pub mod serial;

use serde::Serialize;

use crate::error::PixelwireError;

pub use config::{Parity, SerialConfig};
pub use serial::{list_available_ports, DisconnectOutcome, PortInfo, SerialLink, IO_TIMEOUT};

/// Connection state reported by a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LinkStatus {
    Disconnected,
    Connected { port: String, baud_rate: u32 },
}

impl LinkStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkStatus::Connected { .. })
    }
}

/// A byte sink that frames are written to, one frame per call.
pub trait FrameLink: Send + Sync {
    /// Current connection state.
    fn status(&self) -> LinkStatus;

    /// Write one frame and return the number of bytes accepted.
    fn write_frame(&self, bytes: &[u8]) -> Result<usize, PixelwireError>;

    fn is_connected(&self) -> bool {
        self.status().is_connected()
    }
}

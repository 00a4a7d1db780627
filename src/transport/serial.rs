//! # Serial UART Transport
//!
//! This module owns the physical connection to the FPGA board: a USB-UART
//! bridge or on-board serial port, driven through the `serialport` crate.
//!
//! ## Connection Lifecycle
//!
//! ```text
//!              connect(config)
//! Disconnected ───────────────► Connected(config)
//!      ▲                            │   │
//!      │         disconnect()       │   │ connect(other)
//!      └────────────────────────────┘   └──► close, then open other
//! ```
//!
//! A [`SerialLink`] holds at most one open port. `connect` always closes the
//! current port first, so calling it twice just re-opens.
//!
//! ## Timeouts
//!
//! Ports are opened with a 1 second read/write timeout so a stalled device
//! cannot hang a transmission run forever.
//!
//! ## Locking
//!
//! The port handle sits behind a mutex; connect, disconnect and writes are
//! serialized on it. Status is mirrored into a separate lock so a status
//! query never waits behind a write in progress.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use serialport::{SerialPort, SerialPortType};
use tracing::{debug, info, warn};

use super::config::SerialConfig;
use super::{FrameLink, LinkStatus};
use crate::error::PixelwireError;

/// Read and write timeout applied to every opened port
pub const IO_TIMEOUT: Duration = Duration::from_secs(1);

/// Outcome of [`SerialLink::disconnect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DisconnectOutcome {
    /// A port was open and has been closed
    Closed { port: String },
    /// Nothing was open
    NotConnected,
}

struct OpenPort {
    handle: Box<dyn SerialPort>,
    config: SerialConfig,
}

/// # Serial Link
///
/// The process-wide owner of the UART connection. Share it behind an `Arc`.
///
/// ## Example
///
/// ```no_run
/// use pixelwire::transport::{SerialConfig, SerialLink};
///
/// let link = SerialLink::new();
/// link.connect(&SerialConfig::new("/dev/ttyUSB0"))?;
///
/// let written = link.write_frame(&[0xAA, 0x00, 0x00, 1, 0, 1, 0, 0xAC, 0x55])?;
/// assert_eq!(written, 9);
///
/// link.disconnect();
/// # Ok::<(), pixelwire::PixelwireError>(())
/// ```
pub struct SerialLink {
    port: Mutex<Option<OpenPort>>,
    status: RwLock<LinkStatus>,
}

impl Default for SerialLink {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialLink {
    /// Create a link in the disconnected state.
    pub fn new() -> Self {
        Self {
            port: Mutex::new(None),
            status: RwLock::new(LinkStatus::Disconnected),
        }
    }

    /// Open `config.port` with the given line settings.
    ///
    /// Any port that is already open is closed first, even when the new
    /// settings turn out to be invalid.
    ///
    /// ## Errors
    ///
    /// `Connect` if the settings are invalid or the OS refuses the open
    /// (missing device, permission denied, unsupported baud rate).
    pub fn connect(&self, config: &SerialConfig) -> Result<LinkStatus, PixelwireError> {
        let mut guard = self.port.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = guard.take() {
            info!(port = %previous.config.port, "closing existing serial connection");
        }
        self.set_status(LinkStatus::Disconnected);

        let settings = config.validate()?;

        let handle = serialport::new(&config.port, settings.baud_rate)
            .data_bits(settings.data_bits)
            .stop_bits(settings.stop_bits)
            .parity(settings.parity)
            .flow_control(serialport::FlowControl::None)
            .timeout(IO_TIMEOUT)
            .open()
            .map_err(|e| {
                PixelwireError::Connect(format!("failed to open {}: {}", config.port, e))
            })?;

        let status = LinkStatus::Connected {
            port: config.port.clone(),
            baud_rate: config.baud_rate,
        };
        *guard = Some(OpenPort {
            handle,
            config: config.clone(),
        });
        self.set_status(status.clone());

        info!(
            port = %config.port,
            baud_rate = config.baud_rate,
            data_bits = config.data_bits,
            stop_bits = config.stop_bits,
            parity = %config.parity,
            "serial port connected"
        );
        Ok(status)
    }

    /// Close the open port, if any.
    pub fn disconnect(&self) -> DisconnectOutcome {
        let mut guard = self.port.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.take() {
            Some(open) => {
                self.set_status(LinkStatus::Disconnected);
                info!(port = %open.config.port, "serial port disconnected");
                DisconnectOutcome::Closed {
                    port: open.config.port,
                }
            }
            None => {
                debug!("disconnect requested with no open port");
                DisconnectOutcome::NotConnected
            }
        }
    }

    /// Current connection state. Never blocks on an in-flight write.
    pub fn status(&self) -> LinkStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Configuration of the open port, if connected.
    pub fn config(&self) -> Option<SerialConfig> {
        self.port
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|open| open.config.clone())
    }

    /// Write one frame's bytes and return how many the port accepted.
    ///
    /// A short count (the port accepted zero bytes mid-frame) is returned
    /// as `Ok`; the caller compares it with the frame length.
    ///
    /// ## Errors
    ///
    /// - `NotConnected` if no port is open
    /// - `WriteTimeout` if the 1 second timeout elapses
    /// - `Write` for any other I/O failure
    pub fn write_frame(&self, bytes: &[u8]) -> Result<usize, PixelwireError> {
        let mut guard = self.port.lock().unwrap_or_else(PoisonError::into_inner);
        let open = guard.as_mut().ok_or(PixelwireError::NotConnected)?;
        write_all_counted(&mut open.handle, bytes)
    }

    fn set_status(&self, status: LinkStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }
}

impl FrameLink for SerialLink {
    fn status(&self) -> LinkStatus {
        SerialLink::status(self)
    }

    fn write_frame(&self, bytes: &[u8]) -> Result<usize, PixelwireError> {
        SerialLink::write_frame(self, bytes)
    }
}

/// Write until every byte is accepted, the port stops accepting, or an
/// error occurs.
fn write_all_counted<W: Write + ?Sized>(writer: &mut W, bytes: &[u8]) -> Result<usize, PixelwireError> {
    let mut written = 0;
    while written < bytes.len() {
        match writer.write(&bytes[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                return Err(PixelwireError::WriteTimeout(format!(
                    "{} of {} bytes accepted before timeout",
                    written,
                    bytes.len()
                )));
            }
            Err(e) => return Err(PixelwireError::Write(e.to_string())),
        }
    }
    Ok(written)
}

// ============================================================================
// PORT ENUMERATION
// ============================================================================

/// One serial device found on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    /// Device path or name, e.g. `/dev/ttyUSB0`
    pub device: String,
    pub description: Option<String>,
    /// `USB VID:PID=1A86:7523 SER=...` style identifier
    pub hwid: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

/// Enumerate serial devices on the host.
pub fn list_available_ports() -> Result<Vec<PortInfo>, PixelwireError> {
    let ports = serialport::available_ports().map_err(|e| {
        warn!(error = %e, "failed to enumerate serial ports");
        PixelwireError::Io(e.into())
    })?;

    let ports: Vec<PortInfo> = ports
        .into_iter()
        // On macOS only the calling-unit devices are usable for output
        .filter(|_p| {
            #[cfg(target_os = "macos")]
            {
                !_p.port_name.starts_with("/dev/tty.")
            }
            #[cfg(not(target_os = "macos"))]
            {
                true
            }
        })
        .map(|p| port_info(p.port_name, p.port_type))
        .collect();

    info!(count = ports.len(), "enumerated serial ports");
    for port in &ports {
        debug!(
            device = %port.device,
            description = port.description.as_deref().unwrap_or("-"),
            "serial port"
        );
    }
    Ok(ports)
}

fn port_info(device: String, port_type: SerialPortType) -> PortInfo {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let mut hwid = format!("USB VID:PID={:04X}:{:04X}", usb.vid, usb.pid);
            if let Some(serial) = &usb.serial_number {
                hwid.push_str(&format!(" SER={}", serial));
            }
            PortInfo {
                description: usb
                    .product
                    .clone()
                    .or_else(|| usb.manufacturer.clone())
                    .or_else(|| Some("USB serial device".to_string())),
                hwid: Some(hwid),
                manufacturer: usb.manufacturer,
                product: usb.product,
                serial_number: usb.serial_number,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                device,
            }
        }
        SerialPortType::BluetoothPort => bare_port(device, "Bluetooth serial port"),
        SerialPortType::PciPort => bare_port(device, "PCI serial port"),
        SerialPortType::Unknown => bare_port(device, "Serial port"),
    }
}

fn bare_port(device: String, description: &str) -> PortInfo {
    PortInfo {
        device,
        description: Some(description.to_string()),
        hwid: None,
        manufacturer: None,
        product: None,
        serial_number: None,
        vid: None,
        pid: None,
    }
}

// ============================================================================
// TESTS
// ============================================================================

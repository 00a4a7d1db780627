//! # Wire Frames
//!
//! Every unit on the wire is a marker-delimited, checksummed frame. There are
//! two kinds, discriminated by the type byte at offset 1:
//!
//! | Field | Meta frame | Data frame |
//! |-------|------------|------------|
//! | Length | 9 bytes | 8 bytes |
//! | Start marker | `0xAA` | `0xAA` |
//! | Type byte | `0x00` | `0x01` |
//! | Byte 2 | `0x00` (reserved) | sequence counter |
//! | Payload | width LE16, height LE16 | 3 pixel bytes, zero-padded |
//! | Checksum | sum of bytes 0..=6, at offset 7 | sum of bytes 0..=5, at offset 6 |
//! | End marker | `0x55` | `0x55` |
//!
//! ```text
//! Meta:  AA 00 00 W_lo W_hi H_lo H_hi CHK 55
//! Data:  AA 01 SEQ P1 P2 P3 CHK 55
//! ```
//!
//! The two lengths differ, so a receiver must find frames by their markers
//! and type byte rather than by a fixed stride.

use std::fmt;

use serde::Serialize;

use crate::error::PixelwireError;

// ============================================================================
// PROTOCOL CONSTANTS
// ============================================================================

/// Start-of-frame marker
pub const START_MARKER: u8 = 0xAA;

/// End-of-frame marker
pub const END_MARKER: u8 = 0x55;

/// Type byte of the meta frame
pub const TYPE_META: u8 = 0x00;

/// Type byte of a data frame
pub const TYPE_DATA: u8 = 0x01;

/// Meta frame length in bytes
pub const META_FRAME_LEN: usize = 9;

/// Data frame length in bytes
pub const DATA_FRAME_LEN: usize = 8;

/// Pixel samples carried by one data frame
pub const PIXELS_PER_FRAME: usize = 3;

/// Little-endian encoding of a u16.
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}

/// Unsigned byte sum truncated to 8 bits.
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

// ============================================================================
// FRAME KIND
// ============================================================================

/// Classification used in transmission log entries.
///
/// `Error` never comes out of [`Frame::kind`]; it marks log entries for
/// frames whose write raised a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Meta,
    Data,
    Error,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            FrameKind::Meta => "meta",
            FrameKind::Data => "data",
            FrameKind::Error => "error",
        })
    }
}

// ============================================================================
// META FRAME
// ============================================================================

/// # Meta Frame
///
/// Announces the image dimensions. Always the first frame of a transmission.
///
/// ```
/// use pixelwire::protocol::frame::MetaFrame;
///
/// let meta = MetaFrame::new(64, 64);
/// assert_eq!(meta.as_bytes(), &[0xAA, 0x00, 0x00, 64, 0, 64, 0, 0x2A, 0x55]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaFrame {
    bytes: [u8; META_FRAME_LEN],
}

impl MetaFrame {
    pub fn new(width: u16, height: u16) -> Self {
        let [w_lo, w_hi] = u16_le(width);
        let [h_lo, h_hi] = u16_le(height);
        let mut bytes = [
            START_MARKER,
            TYPE_META,
            0x00,
            w_lo,
            w_hi,
            h_lo,
            h_hi,
            0x00,
            END_MARKER,
        ];
        bytes[7] = checksum(&bytes[..7]);
        Self { bytes }
    }

    pub fn width(&self) -> u16 {
        u16::from_le_bytes([self.bytes[3], self.bytes[4]])
    }

    pub fn height(&self) -> u16 {
        u16::from_le_bytes([self.bytes[5], self.bytes[6]])
    }

    pub fn checksum(&self) -> u8 {
        self.bytes[7]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

// ============================================================================
// DATA FRAME
// ============================================================================

/// # Data Frame
///
/// Carries three pixel samples and a sequence counter.
///
/// ```
/// use pixelwire::protocol::frame::DataFrame;
///
/// let data = DataFrame::new(1, [0x10, 0x20, 0x30]);
/// assert_eq!(data.as_bytes(), &[0xAA, 0x01, 0x01, 0x10, 0x20, 0x30, 0x0C, 0x55]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFrame {
    bytes: [u8; DATA_FRAME_LEN],
}

impl DataFrame {
    pub fn new(seq: u8, pixels: [u8; PIXELS_PER_FRAME]) -> Self {
        let mut bytes = [
            START_MARKER,
            TYPE_DATA,
            seq,
            pixels[0],
            pixels[1],
            pixels[2],
            0x00,
            END_MARKER,
        ];
        bytes[6] = checksum(&bytes[..6]);
        Self { bytes }
    }

    pub fn seq(&self) -> u8 {
        self.bytes[2]
    }

    pub fn pixels(&self) -> [u8; PIXELS_PER_FRAME] {
        [self.bytes[3], self.bytes[4], self.bytes[5]]
    }

    pub fn checksum(&self) -> u8 {
        self.bytes[6]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

// ============================================================================
// FRAME
// ============================================================================

/// One protocol frame, either kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Meta(MetaFrame),
    Data(DataFrame),
}

impl Frame {
    pub fn meta(width: u16, height: u16) -> Self {
        Frame::Meta(MetaFrame::new(width, height))
    }

    pub fn data(seq: u8, pixels: [u8; PIXELS_PER_FRAME]) -> Self {
        Frame::Data(DataFrame::new(seq, pixels))
    }

    /// Raw wire bytes (9 for meta, 8 for data).
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Frame::Meta(m) => m.as_bytes(),
            Frame::Data(d) => d.as_bytes(),
        }
    }

    /// Classify by the type byte at offset 1.
    pub fn kind(&self) -> FrameKind {
        match self.as_bytes()[1] {
            TYPE_META => FrameKind::Meta,
            _ => FrameKind::Data,
        }
    }

    /// Uppercase, space separated hex (`AA 01 01 ...`).
    pub fn to_hex(&self) -> String {
        to_hex(self.as_bytes())
    }

    /// # Parse Raw Bytes
    ///
    /// Validates markers, type byte, per-kind length and checksum.
    ///
    /// ```
    /// use pixelwire::protocol::frame::Frame;
    ///
    /// let frame = Frame::parse(&[0xAA, 0x01, 0x05, 1, 2, 3, 0xB6, 0x55])?;
    /// assert_eq!(frame, Frame::data(5, [1, 2, 3]));
    /// # Ok::<(), pixelwire::PixelwireError>(())
    /// ```
    pub fn parse(bytes: &[u8]) -> Result<Self, PixelwireError> {
        if bytes.len() < 2 {
            return Err(PixelwireError::InvalidFrame(format!(
                "frame too short ({} bytes)",
                bytes.len()
            )));
        }
        if bytes[0] != START_MARKER {
            return Err(PixelwireError::InvalidFrame(format!(
                "bad start marker 0x{:02X}",
                bytes[0]
            )));
        }

        let (expected_len, checksum_at) = match bytes[1] {
            TYPE_META => (META_FRAME_LEN, 7),
            TYPE_DATA => (DATA_FRAME_LEN, 6),
            other => {
                return Err(PixelwireError::InvalidFrame(format!(
                    "unknown type byte 0x{:02X}",
                    other
                )));
            }
        };

        if bytes.len() != expected_len {
            return Err(PixelwireError::InvalidFrame(format!(
                "expected {} bytes for type 0x{:02X}, got {}",
                expected_len,
                bytes[1],
                bytes.len()
            )));
        }
        if bytes[expected_len - 1] != END_MARKER {
            return Err(PixelwireError::InvalidFrame(format!(
                "bad end marker 0x{:02X}",
                bytes[expected_len - 1]
            )));
        }

        let expected = checksum(&bytes[..checksum_at]);
        if bytes[checksum_at] != expected {
            return Err(PixelwireError::InvalidFrame(format!(
                "checksum mismatch: frame has 0x{:02X}, computed 0x{:02X}",
                bytes[checksum_at], expected
            )));
        }

        let frame = match bytes[1] {
            TYPE_META => {
                if bytes[2] != 0x00 {
                    return Err(PixelwireError::InvalidFrame(format!(
                        "reserved meta byte is 0x{:02X}",
                        bytes[2]
                    )));
                }
                let width = u16::from_le_bytes([bytes[3], bytes[4]]);
                let height = u16::from_le_bytes([bytes[5], bytes[6]]);
                Frame::meta(width, height)
            }
            _ => Frame::data(bytes[2], [bytes[3], bytes[4], bytes[5]]),
        };
        Ok(frame)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Render bytes as uppercase, space separated hex.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16_le() {
        assert_eq!(u16_le(0x1234), [0x34, 0x12]);
        assert_eq!(u16_le(4096), [0x00, 0x10]);
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
        assert_eq!(checksum(&[]), 0x00);
    }

    #[test]
    fn test_meta_layout() {
        let meta = MetaFrame::new(0x0102, 0x0304);
        let bytes = meta.as_bytes();
        assert_eq!(bytes.len(), META_FRAME_LEN);
        assert_eq!(&bytes[..7], &[0xAA, 0x00, 0x00, 0x02, 0x01, 0x04, 0x03]);
        assert_eq!(bytes[7], checksum(&bytes[..7]));
        assert_eq!(bytes[8], 0x55);
        assert_eq!(meta.width(), 0x0102);
        assert_eq!(meta.height(), 0x0304);
    }

    #[test]
    fn test_data_layout() {
        let data = DataFrame::new(0xFF, [0xFF, 0xFF, 0xFF]);
        let bytes = data.as_bytes();
        assert_eq!(bytes.len(), DATA_FRAME_LEN);
        assert_eq!(bytes[6], checksum(&bytes[..6]));
        assert_eq!(bytes[7], 0x55);
        assert_eq!(data.seq(), 0xFF);
    }

    #[test]
    fn test_kind_from_type_byte() {
        assert_eq!(Frame::meta(1, 1).kind(), FrameKind::Meta);
        assert_eq!(Frame::data(0, [0, 0, 0]).kind(), FrameKind::Data);
    }

    #[test]
    fn test_hex_rendering() {
        let frame = Frame::data(1, [0x10, 0x20, 0x30]);
        assert_eq!(frame.to_hex(), "AA 01 01 10 20 30 0C 55");
        assert_eq!(frame.to_string(), frame.to_hex());
    }

    #[test]
    fn test_parse_accepts_encoded_frames() {
        let meta = Frame::meta(640, 480);
        assert_eq!(Frame::parse(meta.as_bytes()).unwrap(), meta);

        let data = Frame::data(0, [9, 8, 7]);
        assert_eq!(Frame::parse(data.as_bytes()).unwrap(), data);
    }

    #[test]
    fn test_parse_rejects_bad_markers() {
        let mut bytes = Frame::data(1, [1, 2, 3]).as_bytes().to_vec();
        bytes[0] = 0xAB;
        assert!(matches!(Frame::parse(&bytes), Err(PixelwireError::InvalidFrame(_))));

        let mut bytes = Frame::data(1, [1, 2, 3]).as_bytes().to_vec();
        bytes[7] = 0x00;
        assert!(matches!(Frame::parse(&bytes), Err(PixelwireError::InvalidFrame(_))));
    }

    #[test]
    fn test_parse_rejects_bad_checksum() {
        let mut bytes = Frame::meta(3, 3).as_bytes().to_vec();
        bytes[7] = bytes[7].wrapping_add(1);
        let err = Frame::parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_parse_rejects_wrong_length_for_type() {
        // Data frame bytes with a meta type byte
        let mut bytes = Frame::data(1, [1, 2, 3]).as_bytes().to_vec();
        bytes[1] = TYPE_META;
        assert!(Frame::parse(&bytes).is_err());

        assert!(Frame::parse(&[0xAA]).is_err());
        assert!(Frame::parse(&[0xAA, 0x02, 0, 0, 0, 0, 0, 0x55]).is_err());
    }
}

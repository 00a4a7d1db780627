//! # Protocol Tests
//!
//! Byte-level properties of the encoder: frame counts, checksums, sequence
//! wrap, padding and dimension round-trip.

use pixelwire::protocol::frame::{
    DATA_FRAME_LEN, END_MARKER, META_FRAME_LEN, START_MARKER, TYPE_DATA, TYPE_META, checksum,
};
use pixelwire::protocol::{Frame, PixelGrid, decode, encode};
use pretty_assertions::assert_eq;

/// Deterministic, non-trivial samples for a grid of `n` pixels.
fn samples(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i * 31 + 7) as u8).collect()
}

fn grid(width: usize, height: usize) -> PixelGrid {
    PixelGrid::new(width, height, samples(width * height)).unwrap()
}

// ============================================================================
// FRAME COUNT AND ORDER
// ============================================================================

#[test]
fn frame_count_is_one_plus_ceil_third() {
    for (w, h) in [(1, 1), (1, 2), (3, 1), (2, 2), (5, 7), (64, 64), (100, 3)] {
        let frames = encode(&grid(w, h));
        assert_eq!(frames.len(), 1 + (w * h).div_ceil(3), "grid {}x{}", w, h);
    }
}

#[test]
fn meta_frame_first_then_only_data_frames() {
    let frames = encode(&grid(10, 10));
    assert!(matches!(frames[0], Frame::Meta(_)));
    assert!(frames[1..].iter().all(|f| matches!(f, Frame::Data(_))));
}

#[test]
fn sequence_wraps_through_zero() {
    // 300 data frames: counters 1..=255, 0, 1..=44
    let frames = encode(&grid(30, 30));
    let seqs: Vec<u8> = frames[1..]
        .iter()
        .map(|f| match f {
            Frame::Data(d) => d.seq(),
            Frame::Meta(_) => panic!("meta frame after the first"),
        })
        .collect();

    assert_eq!(seqs.len(), 300);
    assert_eq!(seqs[0], 1);
    assert_eq!(seqs[254], 255);
    assert_eq!(seqs[255], 0);
    assert_eq!(seqs[256], 1);
    assert_eq!(seqs[299], 44);
}

// ============================================================================
// BYTE LAYOUT
// ============================================================================

#[test]
fn every_frame_has_markers_type_and_checksum() {
    for frame in encode(&grid(17, 9)) {
        let bytes = frame.as_bytes();
        assert_eq!(bytes[0], START_MARKER);
        assert_eq!(*bytes.last().unwrap(), END_MARKER);
        match bytes[1] {
            TYPE_META => {
                assert_eq!(bytes.len(), META_FRAME_LEN);
                assert_eq!(bytes[2], 0x00);
                assert_eq!(bytes[7], checksum(&bytes[..7]));
            }
            TYPE_DATA => {
                assert_eq!(bytes.len(), DATA_FRAME_LEN);
                assert_eq!(bytes[6], checksum(&bytes[..6]));
            }
            other => panic!("unexpected type byte {:#04X}", other),
        }
    }
}

#[test]
fn known_bytes_for_small_grid() {
    let grid = PixelGrid::new(2, 2, vec![0x10, 0x20, 0x30, 0x40]).unwrap();
    let bytes: Vec<Vec<u8>> = encode(&grid).iter().map(|f| f.as_bytes().to_vec()).collect();

    assert_eq!(
        bytes,
        vec![
            vec![0xAA, 0x00, 0x00, 0x02, 0x00, 0x02, 0x00, 0xAE, 0x55],
            vec![0xAA, 0x01, 0x01, 0x10, 0x20, 0x30, 0x0C, 0x55],
            vec![0xAA, 0x01, 0x02, 0x40, 0x00, 0x00, 0xED, 0x55],
        ]
    );
}

#[test]
fn checksum_truncates_to_low_byte() {
    let frame = Frame::data(0xFF, [0xFF, 0xFF, 0xFF]);
    // AA + 01 + FF*4 = 0x4A7
    assert_eq!(frame.as_bytes()[6], 0xA7);
}

#[test]
fn meta_dimensions_round_trip() {
    for w in [1usize, 3, 64, 4096] {
        for h in [1usize, 3, 64, 4096] {
            let Frame::Meta(meta) = Frame::meta(w as u16, h as u16) else {
                unreachable!()
            };
            let bytes = meta.as_bytes();
            let width = bytes[3] as usize | (bytes[4] as usize) << 8;
            let height = bytes[5] as usize | (bytes[6] as usize) << 8;
            assert_eq!((width, height), (w, h));
        }
    }
}

#[test]
fn meta_frame_of_encoded_grid_matches_dimensions() {
    let frames = encode(&PixelGrid::new(4096, 1, vec![0; 4096]).unwrap());
    let Frame::Meta(meta) = frames[0] else {
        panic!("first frame is not meta")
    };
    assert_eq!((meta.width(), meta.height()), (4096, 1));
}

// ============================================================================
// PADDING
// ============================================================================

#[test]
fn grid_64x64_pads_last_frame() {
    let grid = PixelGrid::new(64, 64, vec![0xFF; 64 * 64]).unwrap();
    let frames = encode(&grid);
    assert_eq!(frames.len() - 1, 1366);

    let Frame::Data(last) = frames[frames.len() - 1] else {
        panic!("last frame is not data")
    };
    assert_eq!(last.pixels(), [0xFF, 0x00, 0x00]);
}

#[test]
fn exact_multiple_has_no_padding() {
    let grid = PixelGrid::new(3, 2, vec![9; 6]).unwrap();
    let frames = encode(&grid);
    assert_eq!(frames.len(), 3);
    let Frame::Data(last) = frames[2] else {
        panic!("last frame is not data")
    };
    assert_eq!(last.pixels(), [9, 9, 9]);
}

// ============================================================================
// DETERMINISM AND VERIFICATION
// ============================================================================

#[test]
fn encoding_is_deterministic() {
    let a = encode(&grid(33, 21));
    let b = encode(&grid(33, 21));
    assert_eq!(a, b);
}

#[test]
fn decode_recovers_grid() {
    let source = grid(64, 64);
    assert_eq!(decode(&encode(&source)).unwrap(), source);
}

#[test]
fn parse_accepts_every_encoded_frame() {
    for frame in encode(&grid(11, 4)) {
        assert_eq!(Frame::parse(frame.as_bytes()).unwrap(), frame);
    }
}

#[test]
fn invalid_grids_rejected() {
    assert!(PixelGrid::new(0, 0, vec![]).is_err());
    assert!(PixelGrid::new(4, 4, vec![0; 15]).is_err());
    assert!(PixelGrid::from_wide(-2, 2, vec![0; 4]).is_err());
}

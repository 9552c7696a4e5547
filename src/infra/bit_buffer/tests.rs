//! Exhaustive test suite for the BitBuffer arena edge cases.
use super::*;
use crate::error::BitBufferError;

#[test]
/// Aligned writes land byte for byte in the backing storage.
fn test_write_aligned_bytes() {
    let mut buffer = BitBuffer::new(32);
    buffer
        .write_bytes(BitBufferHandle::new(16, 8), &[0xAB, 0xCD])
        .unwrap();
    assert_eq!(buffer.as_bytes(), &[0x00, 0xAB, 0xCD, 0x00]);
}

#[test]
/// Aligned write with a trailing partial byte preserves the neighbor bits.
fn test_write_aligned_partial_byte() {
    let mut buffer = BitBuffer::new(16);
    buffer.write_bytes(BitBufferHandle::new(16, 0), &[0x00, 0xF0]).unwrap();
    // 12-bit write: one whole byte plus 4 merged bits.
    buffer.write_bytes(BitBufferHandle::new(12, 0), &[0xFF, 0x0F]).unwrap();
    assert_eq!(buffer.as_bytes(), &[0xFF, 0xFF]);
}

#[test]
/// Unaligned writes merge via mask without touching adjacent bits.
fn test_write_unaligned_preserves_neighbors() {
    let mut buffer = BitBuffer::new(16);
    buffer.write_bytes(BitBufferHandle::new(16, 0), &[0xFF, 0xFF]).unwrap();
    // Clear bits 3..9 only.
    buffer.write_bytes(BitBufferHandle::new(6, 3), &[0x00]).unwrap();
    assert_eq!(buffer.as_bytes(), &[0b0000_0111, 0b1111_1110]);
}

#[test]
/// Round-trip through `write_raw`/`read_raw` for widths across byte seams.
fn test_raw_round_trip() {
    let mut buffer = BitBuffer::new(128);
    for (width, offset) in [(1, 0), (5, 3), (8, 8), (12, 17), (16, 40), (33, 61), (64, 64)] {
        let handle = BitBufferHandle::new(width, offset);
        let value = 0xA5A5_5A5A_DEAD_BEEFu64;
        buffer.write_raw(handle, value).unwrap();
        let mask = if width == 64 { u64::MAX } else { (1u64 << width) - 1 };
        assert_eq!(buffer.read_raw(handle).unwrap(), value & mask, "w={width} o={offset}");
    }
}

#[test]
/// A byte-aligned handle and the equivalent unaligned copy of the same
/// pattern produce identical buffer contents.
fn test_aligned_path_equivalence() {
    let mut fast = BitBuffer::new(24);
    let mut slow = BitBuffer::new(24);
    fast.write_raw(BitBufferHandle::new(13, 8), 0x15AB).unwrap();
    // Force the bit loop by writing the same 13 bits one at a time.
    for bit in 0..13 {
        let value = (0x15ABu64 >> bit) & 1;
        slow.write_raw(BitBufferHandle::new(1, 8 + bit), value).unwrap();
    }
    assert_eq!(fast.as_bytes(), slow.as_bytes());
}

#[test]
/// Out-of-range handles are rejected and leave the contents unchanged.
fn test_bounds_rejection() {
    let mut buffer = BitBuffer::new(16);
    buffer.write_raw(BitBufferHandle::new(16, 0), 0x1234).unwrap();
    let before = buffer.clone();

    assert!(matches!(
        buffer.write_raw(BitBufferHandle::new(9, 8), 0xFF),
        Err(BitBufferError::OutOfBounds {
            offset: 8,
            asked: 9,
            available: 16
        })
    ));
    assert!(matches!(
        buffer.read_raw(BitBufferHandle::new(1, 16)),
        Err(BitBufferError::OutOfBounds { .. })
    ));
    assert_eq!(buffer, before);
}

#[test]
/// Zero-sized handles: write is a no-op, read yields no value.
fn test_zero_size_handle() {
    let mut buffer = BitBuffer::new(8);
    assert!(buffer.write_bytes(BitBufferHandle::new(0, 4), &[]).is_ok());
    assert_eq!(buffer.as_bytes(), &[0x00]);
    assert!(matches!(
        buffer.read_raw(BitBufferHandle::new(0, 4)),
        Err(BitBufferError::EmptyHandle)
    ));
}

#[test]
/// The empty placeholder rejects every non-trivial access.
fn test_empty_buffer() {
    let buffer = BitBuffer::empty();
    assert_eq!(buffer.bit_size(), 0);
    assert_eq!(buffer.byte_size(), 0);
    assert!(matches!(
        buffer.read_raw(BitBufferHandle::new(1, 0)),
        Err(BitBufferError::OutOfBounds { .. })
    ));
}

#[test]
/// Widths above the 64-bit transfer container are refused up front.
fn test_raw_too_wide() {
    let mut buffer = BitBuffer::new(128);
    assert!(matches!(
        buffer.write_raw(BitBufferHandle::new(65, 0), 0),
        Err(BitBufferError::TooLongForType { max: 64, asked: 65 })
    ));
    assert!(matches!(
        buffer.read_raw(BitBufferHandle::new(65, 0)),
        Err(BitBufferError::TooLongForType { max: 64, asked: 65 })
    ));
}

#[test]
/// A short source slice is rejected before any byte lands.
fn test_source_too_small() {
    let mut buffer = BitBuffer::new(32);
    assert!(matches!(
        buffer.write_bytes(BitBufferHandle::new(16, 0), &[0xFF]),
        Err(BitBufferError::BufferTooSmall { need: 2, got: 1 })
    ));
    assert_eq!(buffer.as_bytes(), &[0, 0, 0, 0]);
}

#[test]
/// Reads zero-extend when the caller provides a zeroed destination.
fn test_read_zero_extension() {
    let mut buffer = BitBuffer::new(16);
    buffer.write_raw(BitBufferHandle::new(16, 0), 0xFFFF).unwrap();
    assert_eq!(buffer.read_raw(BitBufferHandle::new(3, 2)).unwrap(), 0b111);
}

#[test]
/// Byte size is the ceiling of the bit size.
fn test_byte_size_rounding() {
    assert_eq!(BitBuffer::new(1).byte_size(), 1);
    assert_eq!(BitBuffer::new(8).byte_size(), 1);
    assert_eq!(BitBuffer::new(9).byte_size(), 2);
}

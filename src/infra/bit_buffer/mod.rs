//! Byte-backed, bit-addressable storage arena.
//!
//! Signal values from many CAN messages are packed into one contiguous
//! buffer; fields seldom align with byte boundaries, so reads and writes are
//! bit-granular with a byte-copy fast path for aligned handles. No sign
//! extension or scaling happens at this layer: it is a raw bit-copy engine,
//! and the numeric semantics belong to the bus codec.
use alloc::vec;
use alloc::vec::Vec;

use crate::error::BitBufferError;

/// A handle into a [`BitBuffer`], basically a fat pointer.
///
/// Purely descriptive: it owns no storage and is immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitBufferHandle {
    /// Width of the region in bits.
    pub size: usize,
    /// First bit of the region, counted from the start of the arena.
    pub offset: usize,
}

impl BitBufferHandle {
    pub const fn new(size: usize, offset: usize) -> Self {
        Self { size, offset }
    }

    /// One past the last bit of the region.
    pub const fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// A buffer that operates on bits, not just bytes.
///
/// Content is zero-initialized at construction. Every access is bounds
/// checked against the bit size before any byte is touched, so a rejected
/// operation leaves the buffer unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitBuffer {
    bytes: Vec<u8>,
    bit_size: usize,
}

impl BitBuffer {
    /// Allocate a zero-filled arena of `bit_size` bits.
    pub fn new(bit_size: usize) -> Self {
        Self {
            bytes: vec![0; bit_size.div_ceil(8)],
            bit_size,
        }
    }

    /// The zero-size placeholder used before the real sizing is known.
    pub const fn empty() -> Self {
        Self {
            bytes: Vec::new(),
            bit_size: 0,
        }
    }

    /// The size of the arena, in bits.
    pub fn bit_size(&self) -> usize {
        self.bit_size
    }

    /// The size of the backing storage, in bytes.
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    /// Immutable view of the backing bytes (consumed by the snapshot logger).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn check_bounds(&self, handle: BitBufferHandle) -> Result<(), BitBufferError> {
        if handle.end() > self.bit_size {
            return Err(BitBufferError::OutOfBounds {
                offset: handle.offset,
                asked: handle.size,
                available: self.bit_size,
            });
        }
        Ok(())
    }

    /// Write the first `handle.size` bits of `src` into the region.
    ///
    /// `src` holds the bits LSB-first within each byte, matching the wire
    /// payload layout. When the handle is byte-aligned the whole-byte part is
    /// copied byte-granular; the trailing bits (and every bit of an unaligned
    /// handle) are merged one at a time via mask, so adjacent bits outside
    /// the region are preserved. A zero-sized handle is a no-op.
    pub fn write_bytes(&mut self, handle: BitBufferHandle, src: &[u8]) -> Result<(), BitBufferError> {
        self.check_bounds(handle)?;
        if handle.size == 0 {
            return Ok(());
        }
        let need = handle.size.div_ceil(8);
        if src.len() < need {
            return Err(BitBufferError::BufferTooSmall {
                need,
                got: src.len(),
            });
        }

        let mut bit_index = 0;

        // Aligned fast path: one memcpy for the whole-byte span.
        if handle.offset % 8 == 0 {
            let byte_offset = handle.offset / 8;
            let whole_bytes = handle.size / 8;
            self.bytes[byte_offset..byte_offset + whole_bytes].copy_from_slice(&src[..whole_bytes]);
            bit_index = whole_bytes * 8;
        }

        // Remaining bits, one at a time.
        while bit_index < handle.size {
            let src_mask = 1u8 << (bit_index % 8);
            let bit = src[bit_index / 8] & src_mask != 0;

            let dst_bit = handle.offset + bit_index;
            let dst_mask = 1u8 << (dst_bit % 8);
            let dst = &mut self.bytes[dst_bit / 8];
            *dst = if bit { *dst | dst_mask } else { *dst & !dst_mask };

            bit_index += 1;
        }
        Ok(())
    }

    /// Read the region's bits into the front of `dst`.
    ///
    /// Mirrors [`Self::write_bytes`]: byte-granular fast path when aligned,
    /// bit-by-bit mask merge otherwise. Bits of `dst` beyond the region are
    /// left untouched, so callers wanting zero-extension pass a zeroed
    /// buffer. A zero-sized handle yields no value.
    pub fn read_bytes(&self, handle: BitBufferHandle, dst: &mut [u8]) -> Result<(), BitBufferError> {
        self.check_bounds(handle)?;
        if handle.size == 0 {
            return Err(BitBufferError::EmptyHandle);
        }
        let need = handle.size.div_ceil(8);
        if dst.len() < need {
            return Err(BitBufferError::BufferTooSmall {
                need,
                got: dst.len(),
            });
        }

        let mut bit_index = 0;

        if handle.offset % 8 == 0 {
            let byte_offset = handle.offset / 8;
            let whole_bytes = handle.size / 8;
            dst[..whole_bytes].copy_from_slice(&self.bytes[byte_offset..byte_offset + whole_bytes]);
            bit_index = whole_bytes * 8;
        }

        while bit_index < handle.size {
            let src_bit = handle.offset + bit_index;
            let src_mask = 1u8 << (src_bit % 8);
            let bit = self.bytes[src_bit / 8] & src_mask != 0;

            let dst_mask = 1u8 << (bit_index % 8);
            let byte = &mut dst[bit_index / 8];
            *byte = if bit { *byte | dst_mask } else { *byte & !dst_mask };

            bit_index += 1;
        }
        Ok(())
    }

    /// Write the low `handle.size` bits of `value` into the region
    /// (little-endian container, unsigned truncation semantics).
    pub fn write_raw(&mut self, handle: BitBufferHandle, value: u64) -> Result<(), BitBufferError> {
        if handle.size > 64 {
            return Err(BitBufferError::TooLongForType {
                max: 64,
                asked: handle.size,
            });
        }
        let bytes = value.to_le_bytes();
        self.write_bytes(handle, &bytes[..handle.size.div_ceil(8)])
    }

    /// Read the region as a zero-extended `u64` (little-endian container).
    pub fn read_raw(&self, handle: BitBufferHandle) -> Result<u64, BitBufferError> {
        if handle.size > 64 {
            return Err(BitBufferError::TooLongForType {
                max: 64,
                asked: handle.size,
            });
        }
        let mut bytes = [0u8; 8];
        self.read_bytes(handle, &mut bytes[..handle.size.div_ceil(8)])?;
        Ok(u64::from_le_bytes(bytes))
    }
}

impl Default for BitBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

//==================================================================================TEST_BIT_BUFFER
#[cfg(test)]
#[path = "tests.rs"]
mod tests;

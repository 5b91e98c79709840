//! Bit cursors over a packed NUKE stream
//!
//! A NUKE stream is consumed from both ends. Control bits are pulled from the
//! front by four independent bit cursors, each with its own accumulator and
//! bit order, while literal bytes are pulled from the back. The two byte
//! positions must never cross.

use crate::{Result, XpkfError};

/// Packed bytes with a forward refill position and a backward literal position
#[derive(Debug)]
pub struct PackedSource<'a> {
    data: &'a [u8],
    front: usize,
    tail: usize,
}

impl<'a> PackedSource<'a> {
    /// Create a source over the packed bytes
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            front: 0,
            tail: data.len(),
        }
    }

    /// Take the next `N` bytes at the front
    fn take_front<const N: usize>(&mut self) -> Result<[u8; N]> {
        if self.tail - self.front < N {
            return Err(XpkfError::corrupt(format!(
                "forward read of {N} bytes at offset {} crosses literal tail at {}",
                self.front, self.tail
            )));
        }
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[self.front..self.front + N]);
        self.front += N;
        Ok(bytes)
    }

    /// Read a big-endian 16-bit refill word
    pub fn read_be16(&mut self) -> Result<u16> {
        self.take_front::<2>().map(u16::from_be_bytes)
    }

    /// Read a little-endian 32-bit refill word
    pub fn read_le32(&mut self) -> Result<u32> {
        self.take_front::<4>().map(u32::from_le_bytes)
    }

    /// Take the next literal byte from the back
    pub fn read_tail_byte(&mut self) -> Result<u8> {
        if self.tail <= self.front {
            return Err(XpkfError::corrupt(format!(
                "literal tail at offset {} reached forward cursors at {}",
                self.tail, self.front
            )));
        }
        self.tail -= 1;
        Ok(self.data[self.tail])
    }

    /// Current forward position
    pub fn front(&self) -> usize {
        self.front
    }

    /// Current tail position
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Bytes consumed by literals so far
    pub fn tail_consumed(&self) -> usize {
        self.data.len() - self.tail
    }
}

/// MSB-first cursor refilled with big-endian 16-bit words
#[derive(Debug, Default, Clone)]
pub struct MsbCursor {
    pending: u32,
    bits_remaining: u32,
    byte_offset: usize,
}

impl MsbCursor {
    /// Refill width in bits
    pub const REFILL_BITS: u32 = 16;

    /// Create an empty cursor; the first read refills it
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `count` bits (at most 16), most significant first
    pub fn read_bits(&mut self, source: &mut PackedSource<'_>, count: u32) -> Result<u32> {
        debug_assert!(count <= Self::REFILL_BITS);
        let mut value = 0u32;
        let mut needed = count;

        while needed > 0 {
            if self.bits_remaining == 0 {
                self.byte_offset = source.front();
                self.pending = u32::from(source.read_be16()?);
                self.bits_remaining = Self::REFILL_BITS;
            }

            let take = needed.min(self.bits_remaining);
            let shift = self.bits_remaining - take;
            let bits = (self.pending >> shift) & ((1 << take) - 1);
            value = (value << take) | bits;

            self.bits_remaining -= take;
            needed -= take;
        }

        Ok(value)
    }

    /// Offset of the word currently being consumed
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /// Bits left before the next refill
    pub fn bits_remaining(&self) -> u32 {
        self.bits_remaining
    }
}

/// LSB-first cursor refilled with little-endian 32-bit words
#[derive(Debug, Default, Clone)]
pub struct LsbCursor {
    pending: u32,
    bits_remaining: u32,
    byte_offset: usize,
}

impl LsbCursor {
    /// Refill width in bits
    pub const REFILL_BITS: u32 = 32;

    /// Create an empty cursor; the first read refills it
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `count` bits (at most 16), least significant first
    pub fn read_bits(&mut self, source: &mut PackedSource<'_>, count: u32) -> Result<u32> {
        debug_assert!(count <= 16);
        let mut value = 0u32;
        let mut filled = 0u32;

        while filled < count {
            if self.bits_remaining == 0 {
                self.byte_offset = source.front();
                self.pending = source.read_le32()?;
                self.bits_remaining = Self::REFILL_BITS;
            }

            let take = (count - filled).min(self.bits_remaining);
            let bits = self.pending & ((1 << take) - 1);
            value |= bits << filled;

            // take < 32, so the shift is always in range
            self.pending >>= take;
            self.bits_remaining -= take;
            filled += take;
        }

        Ok(value)
    }

    /// Offset of the word currently being consumed
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /// Bits left before the next refill
    pub fn bits_remaining(&self) -> u32 {
        self.bits_remaining
    }
}

//! Decompression state management
//!
//! One `NukeState` is built per decompression call. It owns the four bit
//! cursors, the output buffer and the running statistics, and borrows the
//! packed bytes through a `PackedSource`.

use super::cursor::{LsbCursor, MsbCursor, PackedSource};
use crate::DecodeStats;

/// Decompression state for a single NUKE stream
#[derive(Debug)]
pub struct NukeState<'a> {
    /// Packed bytes, consumed from both ends
    pub source: PackedSource<'a>,
    /// 1-bit cursor: literal/match flags and single-literal flags
    pub flag_bits: MsbCursor,
    /// 2-bit cursor: literal run codes and short match lengths
    pub run_bits: MsbCursor,
    /// Variable width cursor: distance extra bits
    pub extra_bits: MsbCursor,
    /// 4-bit cursor: distance indices and long match lengths
    pub nibbles: LsbCursor,
    /// Output buffer, pre-sized to the unpacked size
    pub output: Vec<u8>,
    /// Next byte of `output` to write
    pub output_pos: usize,
    /// Statistics for this stream
    pub stats: DecodeStats,
}

impl<'a> NukeState<'a> {
    /// Create a new state over `packed` producing `unpacked_size` bytes
    pub fn new(packed: &'a [u8], unpacked_size: usize) -> Self {
        Self {
            source: PackedSource::new(packed),
            flag_bits: MsbCursor::new(),
            run_bits: MsbCursor::new(),
            extra_bits: MsbCursor::new(),
            nibbles: LsbCursor::new(),
            output: vec![0; unpacked_size],
            output_pos: 0,
            stats: DecodeStats::default(),
        }
    }

    /// Whether the output buffer is full
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.output_pos == self.output.len()
    }

    /// Bytes still missing from the output
    #[inline]
    pub fn remaining(&self) -> usize {
        self.output.len() - self.output_pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let packed = [0u8; 8];
        let state = NukeState::new(&packed, 5);
        assert_eq!(state.output.len(), 5);
        assert_eq!(state.remaining(), 5);
        assert!(!state.is_complete());
        assert_eq!(state.source.tail(), 8);
    }

    #[test]
    fn test_empty_output_is_complete() {
        let state = NukeState::new(&[], 0);
        assert!(state.is_complete());
    }
}

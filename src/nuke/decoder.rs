//! Literal and back-reference decoding
//!
//! This module implements the NUKE decode loop on top of `NukeState`:
//! alternating literal runs (bytes taken from the tail of the packed data)
//! and back-references (distance from the VLC table, length from the
//! distance class or from an explicit code).

use super::state::NukeState;
use super::{LONG_MATCH_BASE, LONG_MATCH_CLASS, SHORT_MATCH_CLASS};
use crate::tables::DISTANCE_VLC;
use crate::{Result, XpkfError};
use log::trace;

impl NukeState<'_> {
    /// Read one bit from the flag cursor
    pub fn read_flag(&mut self) -> Result<bool> {
        Ok(self.flag_bits.read_bits(&mut self.source, 1)? != 0)
    }

    fn read_run_code(&mut self) -> Result<u32> {
        self.run_bits.read_bits(&mut self.source, 2)
    }

    fn read_nibble(&mut self) -> Result<u32> {
        self.nibbles.read_bits(&mut self.source, 4)
    }

    /// Decode the length of a literal run, after a clear flag bit
    pub fn decode_literal_length(&mut self) -> Result<usize> {
        if self.read_flag()? {
            return Ok(1);
        }

        let mut length = 0usize;
        loop {
            match self.read_run_code()? {
                0 => length += 3,
                code => return Ok(length + (5 - code) as usize),
            }
        }
    }

    /// Copy `length` bytes from the tail of the packed data to the output
    pub fn copy_literals(&mut self, length: usize) -> Result<()> {
        if length > self.remaining() {
            return Err(XpkfError::corrupt(format!(
                "literal run of {length} bytes at output offset {} overruns {} byte output",
                self.output_pos,
                self.output.len()
            )));
        }

        for _ in 0..length {
            self.output[self.output_pos] = self.source.read_tail_byte()?;
            self.output_pos += 1;
        }

        self.stats.literal_runs += 1;
        self.stats.literal_bytes += length;
        Ok(())
    }

    /// Decode a distance index and its distance
    pub fn decode_distance(&mut self) -> Result<(usize, usize)> {
        let index = self.read_nibble()? as usize;
        let entry = DISTANCE_VLC[index];
        let extra = self
            .extra_bits
            .read_bits(&mut self.source, u32::from(entry.bit_length))?;
        Ok((index, entry.distance(extra) as usize))
    }

    /// Decode the match length belonging to a distance index
    pub fn decode_match_length(&mut self, index: usize) -> Result<usize> {
        if index < SHORT_MATCH_CLASS {
            return Ok(2);
        }
        if index < LONG_MATCH_CLASS {
            return Ok(3);
        }

        let code = self.read_run_code()?;
        if code != 0 {
            return Ok(3 + (4 - code) as usize);
        }

        let mut length = LONG_MATCH_BASE;
        loop {
            match self.read_nibble()? {
                0 => length += 15,
                nibble => return Ok(length + (16 - nibble) as usize),
            }
        }
    }

    /// Copy `length` bytes from `distance` bytes back, byte by byte
    pub fn copy_match(&mut self, distance: usize, length: usize) -> Result<()> {
        if distance == 0 || distance > self.output_pos {
            return Err(XpkfError::corrupt(format!(
                "match distance {distance} at output offset {} points outside the output",
                self.output_pos
            )));
        }
        if length > self.remaining() {
            return Err(XpkfError::corrupt(format!(
                "match of {length} bytes at output offset {} overruns {} byte output",
                self.output_pos,
                self.output.len()
            )));
        }

        // Source and target may overlap when distance < length
        let source_pos = self.output_pos - distance;
        for i in 0..length {
            self.output[self.output_pos + i] = self.output[source_pos + i];
        }
        self.output_pos += length;

        self.stats.match_count += 1;
        self.stats.longest_match = self.stats.longest_match.max(length);
        Ok(())
    }

    /// Main expansion loop; runs until the output buffer is full
    pub fn expand(&mut self) -> Result<()> {
        while !self.is_complete() {
            if !self.read_flag()? {
                let length = self.decode_literal_length()?;
                trace!("literal run of {length} at {}", self.output_pos);
                self.copy_literals(length)?;
            }

            if self.is_complete() {
                break;
            }

            let (index, distance) = self.decode_distance()?;
            let length = self.decode_match_length(index)?;
            trace!(
                "match code {index}: distance {distance}, length {length} at {}",
                self.output_pos
            );
            self.copy_match(distance, length)?;
        }

        self.stats.forward_bytes = self.source.front();
        self.stats.output_bytes = self.output_pos;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_literal_flag() {
        // flags: 0 (literal), 1 (single byte)
        let packed = [0x40, 0x00, 0x99];
        let mut state = NukeState::new(&packed, 1);
        state.expand().unwrap();
        assert_eq!(state.output, vec![0x99]);
        assert_eq!(state.stats.literal_runs, 1);
    }

    #[test]
    fn test_literal_length_codes() {
        // flag 0 (not single), run codes 00 00 10 -> 3 + 3 + (5 - 2)
        let packed = [0x00, 0x00, 0x08, 0x00];
        let mut state = NukeState::new(&packed, 16);
        assert!(!state.read_flag().unwrap());
        assert_eq!(state.decode_literal_length().unwrap(), 9);
    }

    #[test]
    fn test_long_match_length() {
        // run code 00, then nibbles 0 and 14 -> 6 + 15 + 2
        let packed = [0x00, 0x00, 0xE0, 0x00, 0x00, 0x00];
        let mut state = NukeState::new(&packed, 64);
        assert_eq!(state.decode_match_length(12).unwrap(), 23);
    }

    #[test]
    fn test_short_match_classes() {
        let mut state = NukeState::new(&[], 8);
        assert_eq!(state.decode_match_length(0).unwrap(), 2);
        assert_eq!(state.decode_match_length(3).unwrap(), 2);
        assert_eq!(state.decode_match_length(4).unwrap(), 3);
        assert_eq!(state.decode_match_length(9).unwrap(), 3);
    }

    #[test]
    fn test_overlapping_copy() {
        let mut state = NukeState::new(&[], 6);
        state.output[0] = b'x';
        state.output[1] = b'y';
        state.output_pos = 2;
        state.copy_match(2, 4).unwrap();
        assert_eq!(state.output, b"xyxyxy");
        assert_eq!(state.stats.longest_match, 4);
    }

    #[test]
    fn test_match_overrun_is_corrupt() {
        let mut state = NukeState::new(&[], 3);
        state.output_pos = 2;
        assert!(matches!(
            state.copy_match(1, 2),
            Err(XpkfError::CorruptStream(_))
        ));
    }

    #[test]
    fn test_distance_before_start_is_corrupt() {
        let mut state = NukeState::new(&[], 8);
        state.output_pos = 2;
        assert!(state.copy_match(3, 2).is_err());
        assert!(state.copy_match(0, 2).is_err());
    }
}

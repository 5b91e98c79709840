//! NUKE decompression
//!
//! This module expands NUKE packed plane data. A packed stream carries its
//! control bits at the front and its literal bytes at the back; the decoder
//! consumes both ends until the requested number of bytes has been produced.

mod cursor;
mod decoder;
mod state;

pub use cursor::{LsbCursor, MsbCursor, PackedSource};
pub use state::NukeState;

use crate::{DecodeStats, Result};
use log::debug;

/// Distance indices below this copy 2 bytes
pub const SHORT_MATCH_CLASS: usize = 4;

/// Distance indices below this (and not short) copy 3 bytes
pub const LONG_MATCH_CLASS: usize = 10;

/// Starting length of a nibble-coded long match
pub const LONG_MATCH_BASE: usize = 6;

/// Decompress a NUKE stream into exactly `unpacked_size` bytes
pub fn decompress(packed: &[u8], unpacked_size: usize) -> Result<Vec<u8>> {
    decompress_with_stats(packed, unpacked_size).map(|(output, _)| output)
}

/// Decompress a NUKE stream and report what the decoder did
pub fn decompress_with_stats(
    packed: &[u8],
    unpacked_size: usize,
) -> Result<(Vec<u8>, DecodeStats)> {
    let mut state = NukeState::new(packed, unpacked_size);
    state.expand()?;

    debug!(
        "NUKE: {} -> {} bytes ({} literal runs, {} matches)",
        packed.len(),
        unpacked_size,
        state.stats.literal_runs,
        state.stats.match_count
    );

    Ok((state.output, state.stats))
}

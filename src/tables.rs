//! Static tables for NUKE decompression
//!
//! The distance table is derived from a signed seed table at compile time.
//! A negative seed starts a new band at offset 0, a positive seed continues
//! the current band. The bands line up with the match length classes
//! (indices 0-3 copy 2 bytes, 4-9 copy 3 bytes, 10-15 carry their own length).

/// Number of distance codes selectable by a 4-bit index
pub const DISTANCE_CODES: usize = 16;

/// Signed extra-bit seeds; a negative value restarts the offset ramp
pub const DISTANCE_SEEDS: [i8; DISTANCE_CODES] =
    [4, 6, 8, 9, -4, 7, 9, 11, 13, 14, -5, 7, 9, 11, 13, 14];

/// One entry of the distance table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlcEntry {
    /// Number of extra bits following the 4-bit index
    pub bit_length: u8,
    /// Value added to the extra bits
    pub base_offset: u32,
}

impl VlcEntry {
    /// Combine the entry with the extra bits read for it
    #[inline]
    pub const fn distance(&self, extra_bits: u32) -> u32 {
        self.base_offset + extra_bits
    }
}

/// Build the distance table from a seed table
pub const fn build_vlc_table(seeds: &[i8; DISTANCE_CODES]) -> [VlcEntry; DISTANCE_CODES] {
    let mut table = [VlcEntry {
        bit_length: 0,
        base_offset: 0,
    }; DISTANCE_CODES];
    let mut length: u32 = 0;
    let mut i = 0;

    while i < DISTANCE_CODES {
        let seed = seeds[i];
        let bits = seed.unsigned_abs();
        if seed < 0 {
            table[i] = VlcEntry {
                bit_length: bits,
                base_offset: 0,
            };
            length = 1 << bits;
        } else {
            table[i] = VlcEntry {
                bit_length: bits,
                base_offset: length,
            };
            length += 1 << bits;
        }
        i += 1;
    }

    table
}

/// Distance table indexed by the 4-bit distance code
pub const DISTANCE_VLC: [VlcEntry; DISTANCE_CODES] = build_vlc_table(&DISTANCE_SEEDS);

//! Common types and constants for XPKF planar images
//!
//! This module defines the error type, the container layout constants and the
//! small value types shared by the decompressor and the chunk walker.

use thiserror::Error;

/// Compression applied to a single plane chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// Payload is stored verbatim
    Raw = 0,
    /// Payload is NUKE compressed
    Nuke = 1,
}

impl CompressionType {
    /// Create a CompressionType from the chunk's type byte
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(CompressionType::Raw),
            1 => Ok(CompressionType::Nuke),
            _ => Err(XpkfError::UnknownCompressionType(value)),
        }
    }

    /// Short human readable name
    pub fn name(&self) -> &'static str {
        match self {
            CompressionType::Raw => "raw",
            CompressionType::Nuke => "NUKE",
        }
    }
}

/// Error type for XPKF decoding
#[derive(Debug, Error)]
pub enum XpkfError {
    /// The PCRH tag is not at offset 0, or the header is truncated
    #[error("Missing PCRH header chunk at offset 0")]
    MissingHeader,

    /// The PCRC tag is not right after the header, or the palette is truncated
    #[error("Missing PCRC palette chunk at offset 16")]
    MissingPalette,

    /// Compressed data or a plane chunk is malformed
    #[error("Corrupt stream: {0}")]
    CorruptStream(String),

    /// Plane chunk type byte is neither raw nor NUKE
    #[error("Unknown plane compression type: {0}")]
    UnknownCompressionType(u8),

    /// More planes than fit into a byte-sized pixel index
    #[error("Too many bitplanes: {0} (at most 8 supported)")]
    TooManyPlanes(usize),

    /// A pixel refers to a color the palette does not define
    #[error("Pixel index {index} outside palette of {colors} colors")]
    PaletteIndexOutOfRange {
        /// Offending pixel index
        index: u8,
        /// Number of palette entries
        colors: usize,
    },

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl XpkfError {
    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        XpkfError::CorruptStream(message.into())
    }
}

/// Result type alias for XPKF operations
pub type Result<T> = std::result::Result<T, XpkfError>;

// Container layout

/// Tag of the header chunk, always at offset 0
pub const HEADER_TAG: &[u8; 4] = b"PCRH";

/// Tag of the palette chunk
pub const PALETTE_TAG: &[u8; 4] = b"PCRC";

/// Tag of every plane chunk
pub const PLANE_TAG: &[u8; 4] = b"XPKF";

/// Length of a chunk tag
pub const TAG_LEN: usize = 4;

/// Width (u16 BE) offset in the header
pub const WIDTH_OFFSET: usize = 8;

/// Height (u16 BE) offset in the header
pub const HEIGHT_OFFSET: usize = 10;

/// Bitplane count (u8) offset in the header
pub const BITPLANES_OFFSET: usize = 15;

/// Fixed offset of the palette tag
pub const PALETTE_TAG_OFFSET: usize = 16;

/// Palette byte length (u32 BE) offset
pub const PALETTE_LEN_OFFSET: usize = 20;

/// First RGB triple of the palette
pub const PALETTE_DATA_OFFSET: usize = 24;

/// Bytes per palette entry
pub const PALETTE_ENTRY_SIZE: usize = 3;

// Plane chunk layout, relative to the tag

/// Total chunk length (u32 BE)
pub const CHUNK_LEN_OFFSET: usize = 4;

/// Packer identifier, e.g. `NUKE`
pub const PACKER_ID_OFFSET: usize = 8;

/// Declared uncompressed length of the stream (u32 BE)
pub const DECLARED_LEN_OFFSET: usize = 12;

/// Compression type byte
pub const COMPRESSION_TYPE_OFFSET: usize = 36;

/// Packed size (u16 BE)
pub const PACKED_SIZE_OFFSET: usize = 37;

/// Raw size (u16 BE)
pub const RAW_SIZE_OFFSET: usize = 39;

/// First payload byte
pub const PAYLOAD_OFFSET: usize = 41;

/// Pixel indices are bytes
pub const MAX_BITPLANES: usize = 8;

/// Statistics gathered while decompressing a NUKE stream
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodeStats {
    /// Number of literal runs (including single byte runs)
    pub literal_runs: usize,
    /// Number of bytes copied from the tail of the packed data
    pub literal_bytes: usize,
    /// Number of back-references
    pub match_count: usize,
    /// Longest back-reference
    pub longest_match: usize,
    /// Bytes consumed by the forward bit cursors
    pub forward_bytes: usize,
    /// Total bytes produced
    pub output_bytes: usize,
}

impl DecodeStats {
    /// Fold the statistics of another stream into this one
    pub fn merge(&mut self, other: &DecodeStats) {
        self.literal_runs += other.literal_runs;
        self.literal_bytes += other.literal_bytes;
        self.match_count += other.match_count;
        self.longest_match = self.longest_match.max(other.longest_match);
        self.forward_bytes += other.forward_bytes;
        self.output_bytes += other.output_bytes;
    }
}

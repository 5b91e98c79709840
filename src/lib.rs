//! XPKF - decoder for NUKE compressed planar bitmaps
//!
//! This crate decodes the image container used by the Amiga release of
//! *Jonathan*: a `PCRH` header, a `PCRC` palette and one `XPKF` chunk per
//! bitplane, each plane stored raw or packed with the XPK NUKE algorithm.
//! The planes are unpacked and folded into one palette index per pixel.
//!
//! # Features
//!
//! - NUKE decompression (LZ77 with literals read from the end of the stream)
//! - Container walking with header, palette and plane chunk descriptors
//! - Bitplane folding into 1-8 bit palette indices
//! - PNG export through the `image` crate
//! - Parallel plane decompression and batch decoding (`async` feature)
//!
//! # Example
//!
//! ```no_run
//! use xpkf::{decode_bytes, nuke};
//!
//! let data = std::fs::read("title.pic")?;
//! let image = decode_bytes(&data)?;
//! println!("{}x{}, {} colors", image.width(), image.height(), image.palette.len());
//! image.save_png("title.png")?;
//!
//! // Or unpack a single NUKE stream
//! let packed = [0x00, 0x00, 0xC0, 0x00, 0x30, 0xC0];
//! assert_eq!(nuke::decompress(&packed, 2)?, vec![0xC0, 0x30]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

// Public modules
pub mod common;
pub mod container;
pub mod error;
pub mod nuke;
pub mod planes;
pub mod raster;
pub mod tables;

// Async modules (only available with async feature)
#[cfg(feature = "async")]
pub mod async_batch;
#[cfg(feature = "async")]
pub mod async_decode;

// Re-export commonly used types
pub use common::{CompressionType, DecodeStats, Result, XpkfError, MAX_BITPLANES};
pub use container::{
    chunk_spans, unpack_plane, Container, ContainerHeader, Palette, PlaneChunk, PlaneChunks,
};
pub use planes::{PixelIndexImage, PlaneLayout};
pub use raster::IndexedImage;
pub use tables::{VlcEntry, DISTANCE_VLC};

// Re-export async types when async feature is enabled
#[cfg(feature = "async")]
pub use async_batch::AsyncBatchProcessor;
#[cfg(feature = "async")]
pub use async_decode::{decode_bytes_async, decode_file_async};

// Convenience functions

/// Decode an image held in memory
///
/// # Arguments
/// * `data` - The complete file contents
///
/// # Returns
/// The pixel indices together with the palette
pub fn decode_bytes(data: &[u8]) -> Result<IndexedImage> {
    IndexedImage::decode(data)
}

/// Read and decode an image file
pub fn decode_file<P: AsRef<std::path::Path>>(path: P) -> Result<IndexedImage> {
    let data = std::fs::read(path)?;
    decode_bytes(&data)
}

/// Decompress a NUKE stream into exactly `unpacked_size` bytes
///
/// # Arguments
/// * `packed` - The packed bytes of one stream
/// * `unpacked_size` - Number of bytes the stream expands to
pub fn decompress_nuke(packed: &[u8], unpacked_size: usize) -> Result<Vec<u8>> {
    nuke::decompress(packed, unpacked_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let _ = CompressionType::Nuke;
        let _ = PlaneLayout::Contiguous;
        assert_eq!(DISTANCE_VLC.len(), 16);

        let packed = [0x40, 0x00, 0x7F];
        assert_eq!(decompress_nuke(&packed, 1).unwrap(), vec![0x7F]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_bytes(b"not an image"),
            Err(XpkfError::MissingHeader)
        ));
    }
}

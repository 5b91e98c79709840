//! Async decoding module
//!
//! This module decodes images with each plane chunk unpacked on tokio's
//! blocking pool. Planes are still folded one at a time, in discovery order,
//! so the bit assigned to each plane does not depend on which job finishes
//! first.

#[cfg(feature = "async")]
/// Async decode functions
pub mod functions {
    use crate::common::PAYLOAD_OFFSET;
    use crate::container::{unpack_plane, Container};
    use crate::planes::PixelIndexImage;
    use crate::{DecodeStats, IndexedImage, Result, XpkfError};
    use bytes::Bytes;
    use log::debug;
    use std::path::Path;
    use tokio::task::{JoinError, JoinHandle};

    fn join_error(e: JoinError) -> XpkfError {
        XpkfError::Io(std::io::Error::other(e))
    }

    /// Decode an image, unpacking its planes in parallel
    pub async fn decode_bytes_async(data: Bytes) -> Result<IndexedImage> {
        let container = Container::parse(&data)?;
        let header = container.header;
        let palette = container.palette.clone();

        // Walk every chunk first so a bad descriptor cannot strand running jobs
        let chunks = container.planes().collect::<Result<Vec<_>>>()?;

        let mut jobs: Vec<JoinHandle<Result<(Vec<u8>, DecodeStats)>>> = Vec::new();
        for chunk in chunks {
            let start = chunk.offset + PAYLOAD_OFFSET;
            let payload = data.slice(start..start + chunk.packed_size);
            let compression = chunk.compression;
            let raw_size = chunk.raw_size;

            jobs.push(tokio::task::spawn_blocking(move || {
                unpack_plane(compression, &payload, raw_size)
            }));
        }
        debug!("spawned {} plane jobs", jobs.len());

        let mut pixels =
            PixelIndexImage::new(usize::from(header.width), usize::from(header.height));
        let mut stats = DecodeStats::default();
        for job in jobs {
            let (plane, plane_stats) = job.await.map_err(join_error)??;
            pixels.fold_plane(&plane)?;
            stats.merge(&plane_stats);
        }

        IndexedImage::assemble(header, palette, pixels, stats)
    }

    /// Read and decode an image file asynchronously
    pub async fn decode_file_async<P: AsRef<Path>>(path: P) -> Result<IndexedImage> {
        let data = tokio::fs::read(path).await?;
        decode_bytes_async(Bytes::from(data)).await
    }

    /// Write an image as PNG without blocking the runtime
    pub async fn save_png_async<P: AsRef<Path>>(image: IndexedImage, path: P) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        tokio::task::spawn_blocking(move || image.save_png(path))
            .await
            .map_err(join_error)?
    }
}

#[cfg(feature = "async")]
pub use functions::*;

#[cfg(all(test, feature = "async"))]
mod tests {
    use super::*;
    use crate::common::*;
    use bytes::Bytes;

    fn file_with_planes(planes: &[(u8, &[u8], u16)]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(HEADER_TAG);
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(&4u16.to_be_bytes());
        data.extend_from_slice(&2u16.to_be_bytes());
        data.extend_from_slice(&[0, 0, 0, planes.len() as u8]);
        data.extend_from_slice(PALETTE_TAG);
        data.extend_from_slice(&0u32.to_be_bytes());
        for &(kind, payload, raw_size) in planes {
            let start = data.len();
            data.extend_from_slice(PLANE_TAG);
            data.resize(start + COMPRESSION_TYPE_OFFSET, 0);
            data.push(kind);
            data.extend_from_slice(&(payload.len() as u16).to_be_bytes());
            data.extend_from_slice(&raw_size.to_be_bytes());
            data.extend_from_slice(payload);
        }
        data
    }

    #[tokio::test]
    async fn test_parallel_planes_keep_order() {
        let nuke_plane: &[u8] = &[0x00, 0x00, 0xC0, 0x00, 0x30, 0xC0];
        let data = file_with_planes(&[(1, nuke_plane, 2), (0, &[0xF0, 0x00], 2)]);

        let image = decode_bytes_async(Bytes::from(data.clone())).await.unwrap();
        let sync_image = crate::decode_bytes(&data).unwrap();

        assert_eq!(image.pixels.pixels(), &[3, 3, 2, 2, 0, 0, 1, 1]);
        assert_eq!(image.pixels, sync_image.pixels);
        assert_eq!(image.stats, sync_image.stats);
    }

    #[tokio::test]
    async fn test_truncated_chunk_fails_before_unpacking() {
        let mut data = file_with_planes(&[(0, &[0xF0, 0x00], 2), (0, &[0x0F, 0x00], 2)]);
        data.truncate(data.len() - 1);
        assert!(matches!(
            decode_bytes_async(Bytes::from(data)).await,
            Err(XpkfError::CorruptStream(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_declared_plane() {
        let mut data = file_with_planes(&[(0, &[0xF0, 0x00], 2)]);
        data[BITPLANES_OFFSET] = 2;
        assert!(matches!(
            decode_bytes_async(Bytes::from(data)).await,
            Err(XpkfError::CorruptStream(_))
        ));
    }

    #[tokio::test]
    async fn test_plane_error_surfaces() {
        let data = file_with_planes(&[(1, &[0x00, 0x00], 2)]);
        assert!(matches!(
            decode_bytes_async(Bytes::from(data)).await,
            Err(XpkfError::CorruptStream(_))
        ));
    }
}

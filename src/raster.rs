//! Decoded indexed images and PNG export
//!
//! `IndexedImage::decode` drives the whole pipeline: parse the container,
//! unpack each plane chunk in discovery order and fold it into the pixel
//! indices. Export expands the indices through the palette.

use crate::container::{Container, ContainerHeader, Palette};
use crate::planes::PixelIndexImage;
use crate::{DecodeStats, Result, XpkfError};
use image::{ImageFormat, RgbImage};
use log::{debug, warn};
use std::path::Path;

/// A decoded image: palette indices plus their palette
#[derive(Debug, Clone)]
pub struct IndexedImage {
    /// Header fields of the source file
    pub header: ContainerHeader,
    /// RGB palette
    pub palette: Palette,
    /// Pixel indices
    pub pixels: PixelIndexImage,
    /// Combined decoder statistics of all planes
    pub stats: DecodeStats,
}

impl IndexedImage {
    /// Decode a whole file held in memory
    pub fn decode(data: &[u8]) -> Result<Self> {
        let container = Container::parse(data)?;
        let header = container.header;
        let mut pixels =
            PixelIndexImage::new(usize::from(header.width), usize::from(header.height));
        let mut stats = DecodeStats::default();

        for chunk in container.planes() {
            let chunk = chunk?;
            let (plane, plane_stats) = chunk.unpack_with_stats()?;
            pixels.fold_plane(&plane)?;
            stats.merge(&plane_stats);
        }

        Self::assemble(container.header, container.palette, pixels, stats)
    }

    /// Wrap already folded pixel indices
    ///
    /// Fewer planes than the header declares is an error; the missing high
    /// index bits would otherwise read as zero. Surplus planes are kept.
    pub(crate) fn assemble(
        header: ContainerHeader,
        palette: Palette,
        pixels: PixelIndexImage,
        stats: DecodeStats,
    ) -> Result<Self> {
        let declared = usize::from(header.bitplanes);
        if pixels.plane_count() < declared {
            return Err(XpkfError::corrupt(format!(
                "header declares {declared} bitplanes, found {} plane chunks",
                pixels.plane_count()
            )));
        }
        if pixels.plane_count() > declared {
            warn!(
                "header declares {declared} bitplanes, found {} plane chunks",
                pixels.plane_count()
            );
        }
        debug!(
            "decoded {}x{} image from {} planes",
            pixels.width(),
            pixels.height(),
            pixels.plane_count()
        );

        Ok(Self {
            header,
            palette,
            pixels,
            stats,
        })
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.pixels.width()
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.pixels.height()
    }

    /// Expand the indices through the palette
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        let mut rgb = Vec::with_capacity(self.pixels.pixels().len() * 3);
        for &index in self.pixels.pixels() {
            let color = self
                .palette
                .get(index)
                .ok_or(XpkfError::PaletteIndexOutOfRange {
                    index,
                    colors: self.palette.len(),
                })?;
            rgb.extend_from_slice(&color);
        }

        RgbImage::from_raw(self.width() as u32, self.height() as u32, rgb)
            .ok_or_else(|| XpkfError::corrupt("pixel buffer does not match image size"))
    }

    /// Write the image as a PNG file
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_rgb_image()?
            .save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

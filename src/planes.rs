//! Bitplane assembly
//!
//! Each plane holds one bit per pixel, most significant bit first, in
//! row-major order. Planes are folded into a byte per pixel: the n-th plane
//! folded contributes bit n of every pixel index.

use crate::{Result, XpkfError, MAX_BITPLANES};

/// How the rows of a plane are packed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneLayout {
    /// Rows follow each other without padding
    Contiguous,
    /// Each row starts on a byte boundary
    ByteAligned,
    /// Each row starts on a 16-bit boundary
    WordAligned,
}

impl PlaneLayout {
    /// Bits from the start of one row to the start of the next
    pub fn row_stride_bits(&self, width: usize) -> usize {
        match self {
            PlaneLayout::Contiguous => width,
            PlaneLayout::ByteAligned => width.div_ceil(8) * 8,
            PlaneLayout::WordAligned => width.div_ceil(16) * 16,
        }
    }

    /// Bytes needed for a `width` x `height` plane
    pub fn plane_size(&self, width: usize, height: usize) -> usize {
        (self.row_stride_bits(width) * height).div_ceil(8)
    }

    /// Pick the layout whose size matches the unpacked plane exactly,
    /// preferring unpadded rows
    ///
    /// When several layouts have the same size (a 7x2 plane is 2 bytes both
    /// contiguous and byte-aligned) the contiguous one is chosen.
    pub fn detect(width: usize, height: usize, len: usize) -> Result<Self> {
        [
            PlaneLayout::Contiguous,
            PlaneLayout::ByteAligned,
            PlaneLayout::WordAligned,
        ]
        .into_iter()
        .find(|layout| layout.plane_size(width, height) == len)
        .ok_or_else(|| {
            XpkfError::corrupt(format!(
                "plane of {len} bytes does not fit a {width}x{height} image (expected {} bytes)",
                PlaneLayout::Contiguous.plane_size(width, height)
            ))
        })
    }
}

/// Pixel indices accumulated from bitplanes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelIndexImage {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    planes: usize,
}

impl PixelIndexImage {
    /// Create an image with every index 0
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
            planes: 0,
        }
    }

    /// OR the next plane into the pixel indices
    pub fn fold_plane(&mut self, plane: &[u8]) -> Result<()> {
        if self.planes >= MAX_BITPLANES {
            return Err(XpkfError::TooManyPlanes(self.planes + 1));
        }
        let layout = PlaneLayout::detect(self.width, self.height, plane.len())?;
        let stride = layout.row_stride_bits(self.width);
        let shift = self.planes;

        for (y, row) in self.pixels.chunks_exact_mut(self.width.max(1)).enumerate() {
            let row_start = y * stride;
            for (x, pixel) in row.iter_mut().enumerate() {
                let bit_pos = row_start + x;
                let bit = (plane[bit_pos / 8] >> (7 - bit_pos % 8)) & 1;
                *pixel |= bit << shift;
            }
        }

        self.planes += 1;
        Ok(())
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of planes folded so far
    pub fn plane_count(&self) -> usize {
        self.planes
    }

    /// Index of the pixel at (`x`, `y`)
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// Pixel indices in row-major order
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Take the pixel indices
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

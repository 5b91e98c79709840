//! PCRH/PCRC/XPKF container walking
//!
//! An image file starts with a `PCRH` header chunk, followed at a fixed
//! offset by a `PCRC` palette chunk. Bitplanes are stored in `XPKF` chunks
//! located by scanning the file for their tag; the order in which they are
//! found is the bit order of the planes.

use crate::common::*;
use crate::nuke;
use log::debug;
use std::ops::Range;

fn read_u16_be(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn read_u32_be(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn has_tag(data: &[u8], offset: usize, tag: &[u8; 4]) -> bool {
    data.get(offset..offset + TAG_LEN) == Some(&tag[..])
}

/// Find the first occurrence of `tag` at or after `from`
pub fn find_tag(data: &[u8], tag: &[u8; 4], from: usize) -> Option<usize> {
    data.get(from..)?
        .windows(TAG_LEN)
        .position(|window| window == tag)
        .map(|position| from + position)
}

/// Image header, read from the PCRH and PCRC chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
    /// Bitplane count declared by the header
    pub bitplanes: u8,
    /// Palette length in bytes
    pub palette_len: u32,
}

impl ContainerHeader {
    /// Parse the header and palette chunk tags
    pub fn parse(data: &[u8]) -> Result<Self> {
        if !has_tag(data, 0, HEADER_TAG) {
            return Err(XpkfError::MissingHeader);
        }
        let width = read_u16_be(data, WIDTH_OFFSET).ok_or(XpkfError::MissingHeader)?;
        let height = read_u16_be(data, HEIGHT_OFFSET).ok_or(XpkfError::MissingHeader)?;
        let bitplanes = *data.get(BITPLANES_OFFSET).ok_or(XpkfError::MissingHeader)?;

        if !has_tag(data, PALETTE_TAG_OFFSET, PALETTE_TAG) {
            return Err(XpkfError::MissingPalette);
        }
        let palette_len =
            read_u32_be(data, PALETTE_LEN_OFFSET).ok_or(XpkfError::MissingPalette)?;

        let header = Self {
            width,
            height,
            bitplanes,
            palette_len,
        };
        debug!(
            "PCRH: {}x{}, {} bitplanes, {} palette entries",
            width,
            height,
            bitplanes,
            header.palette_entries()
        );
        Ok(header)
    }

    /// Number of RGB entries in the palette
    pub fn palette_entries(&self) -> usize {
        self.palette_len as usize / PALETTE_ENTRY_SIZE
    }

    /// Number of colors addressable by the declared bitplanes
    pub fn color_count(&self) -> usize {
        1usize << self.bitplanes.min(MAX_BITPLANES as u8)
    }

    /// Number of pixels
    pub fn pixel_count(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

/// RGB palette from the PCRC chunk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<[u8; 3]>,
}

impl Palette {
    /// Read the palette entries described by `header`
    pub fn parse(data: &[u8], header: &ContainerHeader) -> Result<Self> {
        let len = header.palette_entries() * PALETTE_ENTRY_SIZE;
        let bytes = data
            .get(PALETTE_DATA_OFFSET..PALETTE_DATA_OFFSET + len)
            .ok_or(XpkfError::MissingPalette)?;

        let entries = bytes
            .chunks_exact(PALETTE_ENTRY_SIZE)
            .map(|rgb| [rgb[0], rgb[1], rgb[2]])
            .collect();
        Ok(Self { entries })
    }

    /// Build a palette from RGB triples
    pub fn from_entries(entries: Vec<[u8; 3]>) -> Self {
        Self { entries }
    }

    /// Color for a pixel index
    pub fn get(&self, index: u8) -> Option<[u8; 3]> {
        self.entries.get(usize::from(index)).copied()
    }

    /// All entries in index order
    pub fn entries(&self) -> &[[u8; 3]] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the palette has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One XPKF plane chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneChunk<'a> {
    /// File offset of the chunk tag
    pub offset: usize,
    /// Total chunk length (informational)
    pub chunk_len: u32,
    /// Packer identifier, e.g. `NUKE` (informational)
    pub packer: [u8; 4],
    /// Declared uncompressed length (informational)
    pub declared_len: u32,
    /// How the payload is stored
    pub compression: CompressionType,
    /// Payload length in the file
    pub packed_size: usize,
    /// Payload length once unpacked
    pub raw_size: usize,
    /// Payload bytes
    pub payload: &'a [u8],
}

impl<'a> PlaneChunk<'a> {
    /// Parse the plane chunk whose tag starts at `offset`
    pub fn parse(data: &'a [u8], offset: usize) -> Result<Self> {
        let truncated =
            || XpkfError::corrupt(format!("plane chunk at offset {offset} is truncated"));

        let chunk_len = read_u32_be(data, offset + CHUNK_LEN_OFFSET).ok_or_else(truncated)?;
        let packer = data
            .get(offset + PACKER_ID_OFFSET..offset + PACKER_ID_OFFSET + TAG_LEN)
            .ok_or_else(truncated)?;
        let declared_len =
            read_u32_be(data, offset + DECLARED_LEN_OFFSET).ok_or_else(truncated)?;
        let type_byte = *data
            .get(offset + COMPRESSION_TYPE_OFFSET)
            .ok_or_else(truncated)?;
        let compression = CompressionType::from_u8(type_byte)?;
        let packed_size =
            usize::from(read_u16_be(data, offset + PACKED_SIZE_OFFSET).ok_or_else(truncated)?);
        let raw_size =
            usize::from(read_u16_be(data, offset + RAW_SIZE_OFFSET).ok_or_else(truncated)?);

        let payload_start = offset + PAYLOAD_OFFSET;
        let payload = data
            .get(payload_start..payload_start + packed_size)
            .ok_or_else(|| {
                XpkfError::corrupt(format!(
                    "plane chunk at offset {offset} declares {packed_size} payload bytes, file has {}",
                    data.len().saturating_sub(payload_start)
                ))
            })?;

        Ok(Self {
            offset,
            chunk_len,
            packer: [packer[0], packer[1], packer[2], packer[3]],
            declared_len,
            compression,
            packed_size,
            raw_size,
            payload,
        })
    }

    /// File range covered by the chunk header and payload
    pub fn byte_range(&self) -> Range<usize> {
        self.offset..self.offset + PAYLOAD_OFFSET + self.packed_size
    }

    /// Packer identifier as text
    pub fn packer_name(&self) -> String {
        String::from_utf8_lossy(&self.packer).into_owned()
    }

    /// Unpack the payload
    pub fn unpack(&self) -> Result<Vec<u8>> {
        self.unpack_with_stats().map(|(plane, _)| plane)
    }

    /// Unpack the payload and report decoder statistics
    pub fn unpack_with_stats(&self) -> Result<(Vec<u8>, DecodeStats)> {
        unpack_plane(self.compression, self.payload, self.raw_size).map_err(|e| match e {
            XpkfError::CorruptStream(message) => XpkfError::CorruptStream(format!(
                "plane chunk at offset {}: {message}",
                self.offset
            )),
            other => other,
        })
    }
}

/// Unpack one plane payload into `raw_size` bytes
pub fn unpack_plane(
    compression: CompressionType,
    payload: &[u8],
    raw_size: usize,
) -> Result<(Vec<u8>, DecodeStats)> {
    match compression {
        CompressionType::Raw => {
            if payload.len() != raw_size {
                return Err(XpkfError::corrupt(format!(
                    "raw plane has packed size {} but raw size {raw_size}",
                    payload.len()
                )));
            }
            let stats = DecodeStats {
                literal_bytes: raw_size,
                output_bytes: raw_size,
                ..Default::default()
            };
            Ok((payload.to_vec(), stats))
        }
        CompressionType::Nuke => nuke::decompress_with_stats(payload, raw_size),
    }
}

/// Iterator over plane chunks in discovery order
#[derive(Debug, Clone)]
pub struct PlaneChunks<'a> {
    data: &'a [u8],
    search_from: usize,
    done: bool,
}

impl<'a> PlaneChunks<'a> {
    /// Scan `data` from the start
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            search_from: 0,
            done: false,
        }
    }
}

impl<'a> Iterator for PlaneChunks<'a> {
    type Item = Result<PlaneChunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let Some(offset) = find_tag(self.data, PLANE_TAG, self.search_from) else {
            self.done = true;
            return None;
        };
        self.search_from = offset + TAG_LEN;

        let chunk = PlaneChunk::parse(self.data, offset);
        match &chunk {
            Ok(chunk) => debug!(
                "XPKF at {}: {} {} -> {} bytes",
                offset,
                chunk.compression.name(),
                chunk.packed_size,
                chunk.raw_size
            ),
            Err(_) => self.done = true,
        }
        Some(chunk)
    }
}

/// Split the file into per-chunk spans: each XPKF tag up to the next tag,
/// the last one up to the end of the file
pub fn chunk_spans(data: &[u8]) -> Vec<Range<usize>> {
    let mut starts = Vec::new();
    let mut from = 0;
    while let Some(offset) = find_tag(data, PLANE_TAG, from) {
        starts.push(offset);
        from = offset + TAG_LEN;
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| start..starts.get(i + 1).copied().unwrap_or(data.len()))
        .collect()
}

/// A parsed image container borrowing the file contents
#[derive(Debug, Clone)]
pub struct Container<'a> {
    /// Header fields
    pub header: ContainerHeader,
    /// Palette entries
    pub palette: Palette,
    data: &'a [u8],
}

impl<'a> Container<'a> {
    /// Parse header and palette
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = ContainerHeader::parse(data)?;
        let palette = Palette::parse(data, &header)?;
        Ok(Self {
            header,
            palette,
            data,
        })
    }

    /// Plane chunks in discovery order
    pub fn planes(&self) -> PlaneChunks<'a> {
        PlaneChunks::new(self.data)
    }

    /// Underlying file contents
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

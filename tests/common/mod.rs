//! Shared helpers for building container files in tests

#![allow(dead_code)]

/// Builds PCRH/PCRC/XPKF files byte by byte
pub struct ImageBuilder {
    data: Vec<u8>,
}

impl ImageBuilder {
    pub fn new(width: u16, height: u16, bitplanes: u8, palette: &[[u8; 3]]) -> Self {
        let mut data = Vec::new();
        data.extend_from_slice(b"PCRH");
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[0, 0, 0, bitplanes]);
        data.extend_from_slice(b"PCRC");
        data.extend_from_slice(&((palette.len() * 3) as u32).to_be_bytes());
        for rgb in palette {
            data.extend_from_slice(rgb);
        }
        Self { data }
    }

    fn plane(mut self, kind: u8, payload: &[u8], raw_size: u16) -> Self {
        let start = self.data.len();
        self.data.extend_from_slice(b"XPKF");
        self.data
            .extend_from_slice(&((41 + payload.len() - 8) as u32).to_be_bytes());
        self.data.extend_from_slice(b"NUKE");
        self.data.extend_from_slice(&u32::from(raw_size).to_be_bytes());
        self.data.resize(start + 36, 0);
        self.data.push(kind);
        self.data
            .extend_from_slice(&(payload.len() as u16).to_be_bytes());
        self.data.extend_from_slice(&raw_size.to_be_bytes());
        self.data.extend_from_slice(payload);
        self
    }

    pub fn raw_plane(self, bits: &[u8]) -> Self {
        self.plane(0, bits, bits.len() as u16)
    }

    pub fn raw_plane_sized(self, bits: &[u8], raw_size: u16) -> Self {
        self.plane(0, bits, raw_size)
    }

    pub fn nuke_plane(self, packed: &[u8], raw_size: u16) -> Self {
        self.plane(1, packed, raw_size)
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

/// Gray ramp palette with `n` entries
pub fn gray_palette(n: usize) -> Vec<[u8; 3]> {
    (0..n)
        .map(|i| {
            let v = (i * 255 / n.saturating_sub(1).max(1)) as u8;
            [v, v, v]
        })
        .collect()
}

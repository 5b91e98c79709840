//! Property-based tests for the XPKF decoder
//!
//! These tests use randomized inputs to check that the decoder fails cleanly
//! on arbitrary data and that plane folding follows discovery order.

use proptest::prelude::*;
use xpkf::nuke::decompress;
use xpkf::{decode_bytes, PixelIndexImage, DISTANCE_VLC};

proptest! {
    #[test]
    fn test_decompression_never_panics(
        data in prop::collection::vec(any::<u8>(), 0..512),
        size in 0usize..2048
    ) {
        // Random data is rarely a valid stream, but must only ever fail with an error
        if let Ok(output) = decompress(&data, size) {
            prop_assert_eq!(output.len(), size);
        }
    }
}

proptest! {
    #[test]
    fn test_container_never_panics(tail in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut data = b"PCRH\0\0\0\0\0\x04\0\x02\0\0\0\x01PCRC\0\0\0\x06\0\0\0\xff\xff\xffXPKF".to_vec();
        data.extend_from_slice(&tail);
        let _ = decode_bytes(&data);
    }
}

proptest! {
    #[test]
    fn test_fold_order_assigns_bits(
        planes in prop::collection::vec(prop::collection::vec(any::<u8>(), 4), 1..=8)
    ) {
        // 8x4 image, one byte per row
        let mut image = PixelIndexImage::new(8, 4);
        for plane in &planes {
            image.fold_plane(plane).unwrap();
        }

        for (i, &index) in image.pixels().iter().enumerate() {
            for (bit, plane) in planes.iter().enumerate() {
                let expected = (plane[i / 8] >> (7 - i % 8)) & 1;
                prop_assert_eq!((index >> bit) & 1, expected);
            }
            prop_assert!(usize::from(index) < 1 << planes.len());
        }
    }
}

proptest! {
    #[test]
    fn test_distance_ranges_are_disjoint_within_band(index in 0usize..16, extra in 0u32..(1 << 14)) {
        let entry = DISTANCE_VLC[index];
        let extra = extra & ((1 << entry.bit_length) - 1);
        let distance = entry.distance(extra);

        // The next entry of the same band starts past this entry's range
        if let Some(next) = DISTANCE_VLC.get(index + 1) {
            if next.base_offset != 0 {
                prop_assert!(distance < next.base_offset);
            }
        }
        prop_assert!(distance >= entry.base_offset);
    }
}

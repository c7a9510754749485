//! Least-significant-bit codec over RGBA pixel buffers
//!
//! One payload bit is stored in the low bit of the red sample of every pixel
//! whose alpha is non-zero. Bits are written most significant first within
//! each payload byte, in buffer order. Fully transparent pixels carry nothing,
//! since many encoders normalise their colour values.

use log::info;

use crate::{DigiCdError, DigiCdResult};

const RGBA_CHANNELS: usize = 4;
const BITS_PER_BYTE: usize = 8;
const RED: usize = 0;
const ALPHA: usize = 3;

/// Row-major 8-bit RGBA samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> DigiCdResult<Self> {
        let expected = width as usize * height as usize * RGBA_CHANNELS;
        if data.len() != expected {
            return Err(DigiCdError::InvalidPixelBuffer {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Pixels that can carry a bit
    fn qualifying(&self) -> impl Iterator<Item = &[u8]> {
        self.data
            .chunks_exact(RGBA_CHANNELS)
            .filter(|px| px[ALPHA] != 0)
    }

    fn qualifying_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        self.data
            .chunks_exact_mut(RGBA_CHANNELS)
            .filter(|px| px[ALPHA] != 0)
    }
}

/// Capacity in bits: the number of non-transparent pixels
pub fn capacity(pixels: &PixelBuffer) -> usize {
    pixels.qualifying().count()
}

/// Hide `payload` in a copy of `pixels`
pub fn encode(pixels: &PixelBuffer, payload: &[u8]) -> DigiCdResult<PixelBuffer> {
    let needed_bits = payload.len() * BITS_PER_BYTE;
    let capacity_bits = capacity(pixels);
    if needed_bits > capacity_bits {
        return Err(DigiCdError::Capacity {
            needed_bits,
            capacity_bits,
        });
    }

    let mut out = pixels.clone();
    let bits = payload
        .iter()
        .flat_map(|&byte| (0..BITS_PER_BYTE).rev().map(move |i| (byte >> i) & 1));

    for (px, bit) in out.qualifying_mut().zip(bits) {
        px[RED] = (px[RED] & 0xFE) | bit;
    }

    info!(
        "encoded {} bits into {}x{} image ({} bits capacity)",
        needed_bits, pixels.width, pixels.height, capacity_bits
    );
    Ok(out)
}

/// Largest `payload_len` that `decode` will honour for these pixels:
/// capacity rounded up to whole bytes, so a trailing partial byte is still read.
pub fn max_decode_len(pixels: &PixelBuffer) -> usize {
    capacity(pixels).div_ceil(BITS_PER_BYTE)
}

/// Read `payload_len` bytes back out of `pixels`.
///
/// When the image runs out of qualifying pixels first, the collected bits are
/// kept and the last byte of the output is shifted right by
/// `8 - (bits collected % 8)`, matching files produced by earlier encoders.
/// Lengths beyond [`max_decode_len`] are refused before anything is allocated.
pub fn decode(pixels: &PixelBuffer, payload_len: usize) -> DigiCdResult<Vec<u8>> {
    let capacity_bits = capacity(pixels);
    let wanted_bits = payload_len
        .checked_mul(BITS_PER_BYTE)
        .ok_or(DigiCdError::PayloadTooLarge(payload_len))?;
    if payload_len > max_decode_len(pixels) {
        return Err(DigiCdError::Capacity {
            needed_bits: wanted_bits,
            capacity_bits,
        });
    }

    let mut decoded = vec![0u8; payload_len];
    if payload_len == 0 {
        return Ok(decoded);
    }

    let mut collected = 0;
    for px in pixels.qualifying().take(wanted_bits) {
        let byte = &mut decoded[collected / BITS_PER_BYTE];
        *byte = (*byte << 1) | (px[RED] & 1);
        collected += 1;
    }

    let extra_bits = collected % BITS_PER_BYTE;
    if extra_bits != 0 {
        decoded[payload_len - 1] >>= BITS_PER_BYTE - extra_bits;
    }

    info!("decoded {} of {} requested bits", collected, wanted_bits);
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn opaque(width: u32, height: u32, fill: u8) -> PixelBuffer {
        let mut data = Vec::new();
        for _ in 0..width * height {
            data.extend_from_slice(&[fill, fill, fill, 0xFF]);
        }
        PixelBuffer::new(width, height, data).unwrap()
    }

    #[test]
    fn test_rejects_bad_buffer_length() {
        let result = PixelBuffer::new(2, 2, vec![0; 15]);
        assert!(matches!(
            result,
            Err(DigiCdError::InvalidPixelBuffer { expected: 16, actual: 15 })
        ));
    }

    #[test]
    fn test_bit_order_msb_first() {
        let pixels = opaque(8, 1, 0x80);
        let encoded = encode(&pixels, &[0b1011_0010]).unwrap();
        let lsbs: Vec<u8> = encoded.as_bytes().chunks(4).map(|px| px[0] & 1).collect();
        assert_eq!(lsbs, vec![1, 0, 1, 1, 0, 0, 1, 0]);

        // Upper bits and other channels untouched
        for px in encoded.as_bytes().chunks(4) {
            assert_eq!(px[0] & 0xFE, 0x80);
            assert_eq!(&px[1..], &[0x80, 0x80, 0xFF]);
        }
    }

    #[test]
    fn test_capacity_exceeded() {
        let pixels = opaque(8, 1, 0);
        let result = encode(&pixels, &[0b1011_0010, 0b0000_0001]);
        assert!(matches!(
            result,
            Err(DigiCdError::Capacity { needed_bits: 16, capacity_bits: 8 })
        ));
    }

    #[test]
    fn test_transparent_pixels_skipped() {
        // Alternate opaque and transparent pixels
        let mut data = Vec::new();
        for i in 0..16 {
            let alpha = if i % 2 == 0 { 0xFF } else { 0x00 };
            data.extend_from_slice(&[0x10, 0x20, 0x30, alpha]);
        }
        let pixels = PixelBuffer::new(16, 1, data).unwrap();
        assert_eq!(capacity(&pixels), 8);

        let encoded = encode(&pixels, &[0xFF]).unwrap();
        for (i, px) in encoded.as_bytes().chunks(4).enumerate() {
            if i % 2 == 0 {
                assert_eq!(px[0], 0x11);
            } else {
                assert_eq!(px[0], 0x10);
            }
        }
        assert_eq!(decode(&encoded, 1).unwrap(), vec![0xFF]);
    }

    #[test]
    fn test_remaining_pixels_untouched() {
        let pixels = opaque(4, 4, 0x55);
        let encoded = encode(&pixels, &[0x00]).unwrap();
        assert_eq!(&encoded.as_bytes()[32..], &pixels.as_bytes()[32..]);
    }

    #[test]
    fn test_decode_zero_length() {
        assert!(decode(&opaque(2, 2, 0), 0).unwrap().is_empty());
    }

    #[test]
    fn test_decode_partial_alignment() {
        // 4 qualifying pixels holding bits 1,0,1,1 but 1 byte requested
        let mut data = Vec::new();
        for bit in [1u8, 0, 1, 1] {
            data.extend_from_slice(&[bit, 0, 0, 0xFF]);
        }
        let pixels = PixelBuffer::new(4, 1, data).unwrap();
        // Accumulated 0b1011, then shifted right by 8 - 4
        assert_eq!(decode(&pixels, 1).unwrap(), vec![0b1011 >> 4]);
    }

    #[test]
    fn test_decode_partial_shifts_last_byte() {
        // 12 qualifying pixels, 2 bytes requested: the second byte is half filled
        let mut data = Vec::new();
        for _ in 0..12 {
            data.extend_from_slice(&[1, 0, 0, 0xFF]);
        }
        let pixels = PixelBuffer::new(12, 1, data).unwrap();
        assert_eq!(max_decode_len(&pixels), 2);
        assert_eq!(decode(&pixels, 2).unwrap(), vec![0xFF, 0x0F >> 4]);
    }

    #[test]
    fn test_decode_refuses_oversized_request() {
        let pixels = opaque(4, 4, 0);
        assert!(matches!(
            decode(&pixels, 3),
            Err(DigiCdError::Capacity { needed_bits: 24, capacity_bits: 16 })
        ));
        assert!(matches!(
            decode(&pixels, 100_000_000_000_000),
            Err(DigiCdError::Capacity { .. })
        ));
        assert!(matches!(
            decode(&pixels, usize::MAX),
            Err(DigiCdError::PayloadTooLarge(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_lsb_round_trip(
            payload in proptest::collection::vec(any::<u8>(), 0..16),
            seed in any::<u8>(),
        ) {
            let pixels = opaque(16, 8, seed);
            let encoded = encode(&pixels, &payload).unwrap();
            prop_assert_eq!(decode(&encoded, payload.len()).unwrap(), payload);
        }

        #[test]
        fn prop_capacity_enforced(extra in 1usize..8) {
            let pixels = opaque(8, 2, 0);
            let payload = vec![0xAB; 2 + extra];
            let result = encode(&pixels, &payload);
            prop_assert!(
                matches!(result, Err(DigiCdError::Capacity { .. })),
                "expected a capacity error"
            );
        }
    }
}

//! Single entry point for hiding and revealing, over either carrier

use log::info;

use crate::embed::{embed_with_policy, TagPolicy};
use crate::extract::extract;
use crate::png::{CrcPolicy, PngFile};
use crate::{lsb, raster, DigiCdResult};

/// Where the payload is stored in the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// A private ancillary chunk spliced in before IEND. The image data is untouched.
    #[default]
    ChunkInsertion,
    /// Red-channel LSBs of non-transparent pixels. The image is re-encoded.
    PixelLsb,
}

#[derive(Debug, Clone, Default)]
pub struct HideOptions {
    pub strategy: Strategy,
    pub tags: TagPolicy,
    pub crc_policy: CrcPolicy,
}

#[derive(Debug, Clone, Default)]
pub struct RevealOptions {
    pub strategy: Strategy,
    pub tags: TagPolicy,
    pub crc_policy: CrcPolicy,
    /// Bytes to read back; only used by `PixelLsb`, which stores no length
    pub payload_len: usize,
}

/// Hide `payload` in the PNG `image`, returning the new file's bytes
pub fn hide(image: &[u8], payload: &[u8], options: &HideOptions) -> DigiCdResult<Vec<u8>> {
    info!("hiding {} bytes using {:?}", payload.len(), options.strategy);
    match options.strategy {
        Strategy::ChunkInsertion => {
            let png = PngFile::from_data(image.to_vec(), options.crc_policy)?;
            Ok(embed_with_policy(&png, payload, &options.tags)?.into_bytes())
        }
        Strategy::PixelLsb => {
            let pixels = raster::decode_png(image)?;
            let encoded = lsb::encode(&pixels, payload)?;
            raster::encode_png(&encoded)
        }
    }
}

/// Recover a payload previously hidden in `image`
pub fn reveal(image: &[u8], options: &RevealOptions) -> DigiCdResult<Vec<u8>> {
    match options.strategy {
        Strategy::ChunkInsertion => {
            let png = PngFile::from_data(image.to_vec(), options.crc_policy)?;
            extract(&png, &options.tags.accepted_tags)
        }
        Strategy::PixelLsb => {
            let pixels = raster::decode_png(image)?;
            lsb::decode(&pixels, options.payload_len)
        }
    }
}

/// Payload capacity of `image` in bytes for the pixel carrier
pub fn pixel_capacity(image: &[u8]) -> DigiCdResult<usize> {
    let pixels = raster::decode_png(image)?;
    Ok(lsb::capacity(&pixels) / 8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::png::ChunkType;
    use crate::raster::tests::create_rgb_png;
    use crate::DigiCdError;

    #[test]
    fn test_chunk_strategy_round_trip() {
        let image = create_rgb_png(4, 4);
        let hidden = hide(&image, b"a little song", &HideOptions::default()).unwrap();
        assert_eq!(hidden.len(), image.len() + 13 + 12);

        let options = RevealOptions {
            crc_policy: CrcPolicy::Verify,
            ..RevealOptions::default()
        };
        assert_eq!(reveal(&hidden, &options).unwrap(), b"a little song");

        // Still a decodable image with the same pixels
        assert_eq!(raster::decode_png(&hidden).unwrap(), raster::decode_png(&image).unwrap());
    }

    #[test]
    fn test_pixel_strategy_round_trip() {
        let image = create_rgb_png(8, 8);
        assert_eq!(pixel_capacity(&image).unwrap(), 8);

        let options = HideOptions {
            strategy: Strategy::PixelLsb,
            ..HideOptions::default()
        };
        let hidden = hide(&image, b"tune", &options).unwrap();

        let options = RevealOptions {
            strategy: Strategy::PixelLsb,
            payload_len: 4,
            ..RevealOptions::default()
        };
        assert_eq!(reveal(&hidden, &options).unwrap(), b"tune");
    }

    #[test]
    fn test_pixel_strategy_capacity() {
        let image = create_rgb_png(2, 2);
        let options = HideOptions {
            strategy: Strategy::PixelLsb,
            ..HideOptions::default()
        };
        let result = hide(&image, b"too long", &options);
        assert!(matches!(result, Err(DigiCdError::Capacity { capacity_bits: 4, .. })));
    }

    #[test]
    fn test_pixel_reveal_rejects_oversized_length() {
        let image = create_rgb_png(2, 2);
        let options = RevealOptions {
            strategy: Strategy::PixelLsb,
            payload_len: 100_000_000_000_000,
            ..RevealOptions::default()
        };
        let result = reveal(&image, &options);
        assert!(matches!(result, Err(DigiCdError::Capacity { capacity_bits: 4, .. })));
    }

    #[test]
    fn test_custom_tag() {
        let image = create_rgb_png(2, 2);
        let tags = TagPolicy::default().with_embed_tag(ChunkType(*b"moOd"));
        let hidden = hide(
            &image,
            &[7, 7, 7],
            &HideOptions {
                tags: tags.clone(),
                ..HideOptions::default()
            },
        )
        .unwrap();

        let default_reveal = reveal(&hidden, &RevealOptions::default());
        assert!(matches!(default_reveal, Err(DigiCdError::PayloadNotFound { .. })));

        let options = RevealOptions {
            tags,
            ..RevealOptions::default()
        };
        assert_eq!(reveal(&hidden, &options).unwrap(), vec![7, 7, 7]);
    }

    #[test]
    fn test_non_png_rejected() {
        let result = hide(b"definitely not an image", &[1], &HideOptions::default());
        assert!(matches!(result, Err(DigiCdError::Format)));
    }
}

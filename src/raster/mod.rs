//! Decoding PNG images to RGBA pixels and back, for the LSB carrier

use std::io::Cursor;

use ::png::{BitDepth, ColorType, Decoder, Encoder, Transformations};
use log::debug;

use crate::lsb::PixelBuffer;
use crate::{DigiCdError, DigiCdResult};

/// Decode a PNG into 8-bit RGBA, expanding palette, grayscale and 16-bit input
pub fn decode_png(bytes: &[u8]) -> DigiCdResult<PixelBuffer> {
    let mut decoder = Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    buf.truncate(info.buffer_size());

    if info.bit_depth != BitDepth::Eight {
        return Err(DigiCdError::UnsupportedImage(format!(
            "bit depth {:?} after expansion",
            info.bit_depth
        )));
    }

    debug!(
        "decoded {}x{} image, color type {:?}",
        info.width, info.height, info.color_type
    );

    let rgba = match info.color_type {
        ColorType::Rgba => buf,
        ColorType::Rgb => buf
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 0xFF])
            .collect(),
        ColorType::GrayscaleAlpha => buf
            .chunks_exact(2)
            .flat_map(|px| [px[0], px[0], px[0], px[1]])
            .collect(),
        ColorType::Grayscale => buf.iter().flat_map(|&g| [g, g, g, 0xFF]).collect(),
        ColorType::Indexed => {
            return Err(DigiCdError::UnsupportedImage(
                "palette image was not expanded".to_string(),
            ));
        }
    };

    PixelBuffer::new(info.width, info.height, rgba)
}

/// Encode pixels as an 8-bit RGBA PNG
pub fn encode_png(pixels: &PixelBuffer) -> DigiCdResult<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = Encoder::new(&mut out, pixels.width(), pixels.height());
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(pixels.as_bytes())?;
        writer.finish()?;
    }
    Ok(out)
}

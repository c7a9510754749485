//! Utility functions shared by the chunk reader and writer

use byteorder::{BigEndian, ByteOrder};
use crate::{DigiCdError, DigiCdResult};

/// PNG file signature
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Bytes of framing around chunk data: length + type + CRC
pub const CHUNK_OVERHEAD: usize = 12;

/// Read a big-endian u32 from byte slice, failing instead of reading out of bounds
pub fn read_u32_be(bytes: &[u8], offset: usize) -> DigiCdResult<u32> {
    let field = take(bytes, offset, 4)?;
    Ok(BigEndian::read_u32(field))
}

/// Borrow `len` bytes starting at `offset`
pub fn take(bytes: &[u8], offset: usize, len: usize) -> DigiCdResult<&[u8]> {
    let available = bytes.len().saturating_sub(offset);
    if len > available {
        return Err(DigiCdError::TruncatedChunk {
            offset,
            needed: len,
            available,
        });
    }
    Ok(&bytes[offset..offset + len])
}

/// Validate PNG signature
pub fn is_png_signature(data: &[u8]) -> bool {
    data.len() >= 8 && data[0..8] == PNG_SIGNATURE
}

/// Render a list of tags for error messages
pub fn join_tags<T: std::fmt::Display>(tags: &[T]) -> String {
    tags.iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u32_be_read() {
        let buf = [0x00, 0xDE, 0xAD, 0xBE, 0xEF];
        assert_eq!(read_u32_be(&buf, 1).unwrap(), 0xDEADBEEF);
    }

    #[test]
    fn test_u32_be_read_past_end() {
        let buf = [0x00, 0x01, 0x02];
        let result = read_u32_be(&buf, 0);
        assert!(matches!(
            result,
            Err(DigiCdError::TruncatedChunk { offset: 0, needed: 4, available: 3 })
        ));
    }

    #[test]
    fn test_take_offset_beyond_buffer() {
        let buf = [0u8; 4];
        assert!(matches!(
            take(&buf, 10, 1),
            Err(DigiCdError::TruncatedChunk { available: 0, .. })
        ));
    }

    #[test]
    fn test_png_signature_validation() {
        assert!(is_png_signature(&PNG_SIGNATURE));

        let invalid_sig = [0x00, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert!(!is_png_signature(&invalid_sig));
        assert!(!is_png_signature(&PNG_SIGNATURE[..7]));
    }
}

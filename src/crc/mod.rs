//! CRC-32 as used by PNG chunks (zlib polynomial, reflected)

use crate::png::ChunkType;

const POLYNOMIAL: u32 = 0xEDB88320;

static CRC_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { POLYNOMIAL ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// The 256-entry lookup table, built at compile time
pub fn table() -> &'static [u32; 256] {
    &CRC_TABLE
}

/// Feed `data` into a running (pre-inversion) CRC register
pub fn update(mut crc: u32, data: &[u8]) -> u32 {
    for &byte in data {
        crc = (crc >> 8) ^ CRC_TABLE[((crc ^ byte as u32) & 0xFF) as usize];
    }
    crc
}

/// Calculate CRC32 checksum for given data
pub fn crc32(data: &[u8]) -> u32 {
    update(0xFFFFFFFF, data) ^ 0xFFFFFFFF
}

/// CRC of a chunk: computed over type ++ data, length excluded
pub fn chunk_crc(chunk_type: &ChunkType, data: &[u8]) -> u32 {
    update(update(0xFFFFFFFF, chunk_type.as_bytes()), data) ^ 0xFFFFFFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn test_table_entries() {
        let t = table();
        assert_eq!(t[0], 0);
        assert_eq!(t[1], 0x77073096);
        assert_eq!(t[255], 0x2D02EF8D);
    }

    #[test]
    fn test_iend_crc() {
        assert_eq!(crc32(b"IEND"), 0xAE426082);
        assert_eq!(chunk_crc(&ChunkType::IEND, &[]), 0xAE426082);
    }

    #[test]
    fn test_matches_reference_implementation() {
        let data = b"Hello, World!";
        assert_eq!(crc32(data), 0xEC4AC3D0);
        assert_eq!(crc32(data), crc32fast::hash(data));

        let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        assert_eq!(crc32(&bytes), crc32fast::hash(&bytes));
    }

    #[test]
    fn test_chunk_crc_equals_concatenation() {
        let tag = ChunkType::DEFAULT_PAYLOAD;
        let payload = [0x01, 0x02, 0x03];
        let joined = [tag.as_bytes().as_slice(), &payload].concat();
        assert_eq!(chunk_crc(&tag, &payload), crc32(&joined));
    }
}

//! Low-level PNG chunk parsing using bounds-checked byte slicing

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::crc::chunk_crc;
use crate::utils::{is_png_signature, read_u32_be, take};
use crate::{DigiCdError, DigiCdResult};

/// Four-byte chunk type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

impl ChunkType {
    pub const IHDR: ChunkType = ChunkType(*b"IHDR");
    pub const IEND: ChunkType = ChunkType(*b"IEND");
    pub const TEXT: ChunkType = ChunkType(*b"tEXt");
    pub const ZTXT: ChunkType = ChunkType(*b"zTXt");
    pub const ITXT: ChunkType = ChunkType(*b"iTXt");
    pub const EXIF: ChunkType = ChunkType(*b"eXIf");
    /// Private ancillary tag that carries the audio track by default
    pub const DEFAULT_PAYLOAD: ChunkType = ChunkType(*b"juLi");

    /// Ancillary metadata chunks whose conventional content is keyword/text or EXIF
    pub const METADATA_ALIASES: [ChunkType; 4] =
        [ChunkType::TEXT, ChunkType::ZTXT, ChunkType::ITXT, ChunkType::EXIF];

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Lowercase first letter: readers may safely skip the chunk
    pub fn is_ancillary(&self) -> bool {
        self.0[0].is_ascii_lowercase()
    }

    pub fn is_critical(&self) -> bool {
        !self.is_ancillary()
    }

    /// Lowercase second letter: not registered in the public chunk list
    pub fn is_private(&self) -> bool {
        self.0[1].is_ascii_lowercase()
    }

    pub fn is_metadata_alias(&self) -> bool {
        Self::METADATA_ALIASES.contains(self)
    }

    /// All four bytes are ASCII letters
    pub fn is_well_formed(&self) -> bool {
        self.0.iter().all(u8::is_ascii_alphabetic)
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl FromStr for ChunkType {
    type Err = DigiCdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| DigiCdError::InvalidTag(s.to_string()))?;
        let tag = ChunkType(bytes);
        if !tag.is_well_formed() {
            return Err(DigiCdError::InvalidTag(s.to_string()));
        }
        Ok(tag)
    }
}

/// Whether the reader recomputes and compares every chunk's CRC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrcPolicy {
    #[default]
    Ignore,
    Verify,
}

/// PNG chunk structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub length: u32,
    pub chunk_type: ChunkType,
    pub data: Vec<u8>,
    pub crc: u32,
    /// Offset of the chunk's length field in the file
    pub offset: usize,
}

impl Chunk {
    pub fn computed_crc(&self) -> u32 {
        chunk_crc(&self.chunk_type, &self.data)
    }

    pub fn crc_is_valid(&self) -> bool {
        self.crc == self.computed_crc()
    }
}

/// Parsed chunk sequence of a PNG file
#[derive(Debug, Clone)]
pub struct ParsedPng {
    pub chunks: Vec<Chunk>,
    /// Offset just past the last parsed chunk
    pub end_offset: usize,
}

impl ParsedPng {
    /// The IEND chunk, if parsing reached one
    pub fn terminal_chunk(&self) -> Option<&Chunk> {
        self.chunks.last().filter(|c| c.chunk_type == ChunkType::IEND)
    }
}

/// Parse PNG chunks from byte data
pub fn parse_png_chunks(data: &[u8], policy: CrcPolicy) -> DigiCdResult<ParsedPng> {
    if !is_png_signature(data) {
        return Err(DigiCdError::Format);
    }

    let mut offset = 8; // Skip PNG signature
    let mut chunks = Vec::new();

    while offset < data.len() {
        let start = offset;

        let length = read_u32_be(data, offset)?;
        offset += 4;

        let type_bytes = take(data, offset, 4)?;
        let chunk_type = ChunkType([type_bytes[0], type_bytes[1], type_bytes[2], type_bytes[3]]);
        offset += 4;

        let chunk_data = take(data, offset, length as usize)?.to_vec();
        offset += length as usize;

        let crc = read_u32_be(data, offset)?;
        offset += 4;

        let chunk = Chunk {
            length,
            chunk_type,
            data: chunk_data,
            crc,
            offset: start,
        };

        if policy == CrcPolicy::Verify {
            DigiCdError::validate_png_chunk(&chunk.chunk_type, crc, chunk.computed_crc())?;
        }

        debug!("chunk {} at {}: {} bytes, crc {:#010x}", chunk_type, start, length, crc);
        chunks.push(chunk);

        // IEND indicates end of PNG chunks
        if chunk_type == ChunkType::IEND {
            break;
        }
    }

    Ok(ParsedPng {
        chunks,
        end_offset: offset,
    })
}

/// Find the first chunk of a given type
pub fn find_chunk(png: &ParsedPng, chunk_type: ChunkType) -> Option<&Chunk> {
    png.chunks.iter().find(|c| c.chunk_type == chunk_type)
}

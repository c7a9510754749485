//! PNG container handling: raw bytes plus the parsed chunk list

pub mod parser;

use std::fs;
use std::path::Path;

use crate::{DigiCdError, DigiCdResult};
pub use parser::{Chunk, ChunkType, CrcPolicy, ParsedPng};

/// PNG file representation. Never mutated in place; embedding builds a new one.
#[derive(Debug, Clone)]
pub struct PngFile {
    raw_data: Vec<u8>,
    parsed: ParsedPng,
}

impl PngFile {
    /// Load PNG file from path
    pub fn from_file(path: &Path, policy: CrcPolicy) -> DigiCdResult<Self> {
        let raw_data = fs::read(path)?;
        Self::from_data(raw_data, policy)
    }

    /// Create from raw data
    pub fn from_data(raw_data: Vec<u8>, policy: CrcPolicy) -> DigiCdResult<Self> {
        let parsed = parser::parse_png_chunks(&raw_data, policy)?;
        Ok(Self { raw_data, parsed })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.parsed.chunks
    }

    pub fn parsed(&self) -> &ParsedPng {
        &self.parsed
    }

    /// Find the first chunk of the given type
    pub fn find_chunk(&self, chunk_type: ChunkType) -> Option<&Chunk> {
        parser::find_chunk(&self.parsed, chunk_type)
    }

    /// Offset of the IEND chunk's length field
    pub fn terminal_chunk_offset(&self) -> DigiCdResult<usize> {
        self.parsed
            .terminal_chunk()
            .map(|c| c.offset)
            .ok_or(DigiCdError::MissingTerminalChunk)
    }

    /// Bytes after IEND that are not part of any chunk
    pub fn trailing_bytes(&self) -> &[u8] {
        &self.raw_data[self.parsed.end_offset..]
    }

    /// Write the PNG to a file
    pub fn write_to_file(&self, path: &Path) -> DigiCdResult<()> {
        fs::write(path, &self.raw_data)?;
        Ok(())
    }

    /// Get the raw data
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw_data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.raw_data
    }
}

//! Chunk listing and container validation

use crate::png::{parser, ChunkType, CrcPolicy};
use crate::DigiCdError;

/// Validation result for a carrier image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    InvalidSignature,
    /// Chunk at this offset runs past the end of the file
    Truncated(usize),
    MissingTerminalChunk,
    /// Types of chunks whose stored CRC is wrong
    CrcMismatch(Vec<String>),
}

/// One line of the chunk listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReport {
    pub offset: usize,
    pub chunk_type: ChunkType,
    pub length: u32,
    pub stored_crc: u32,
    pub computed_crc: u32,
}

impl ChunkReport {
    pub fn crc_ok(&self) -> bool {
        self.stored_crc == self.computed_crc
    }
}

/// Result of walking a PNG's chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectReport {
    pub chunks: Vec<ChunkReport>,
    pub trailing_bytes: usize,
    pub validation: ValidationResult,
}

/// List every chunk and classify the file, without failing on damage
pub fn inspect(data: &[u8]) -> InspectReport {
    let parsed = match parser::parse_png_chunks(data, CrcPolicy::Ignore) {
        Ok(parsed) => parsed,
        Err(err) => {
            let validation = match err {
                DigiCdError::TruncatedChunk { offset, .. } => ValidationResult::Truncated(offset),
                _ => ValidationResult::InvalidSignature,
            };
            return InspectReport {
                chunks: Vec::new(),
                trailing_bytes: 0,
                validation,
            };
        }
    };

    let chunks: Vec<ChunkReport> = parsed
        .chunks
        .iter()
        .map(|c| ChunkReport {
            offset: c.offset,
            chunk_type: c.chunk_type,
            length: c.length,
            stored_crc: c.crc,
            computed_crc: c.computed_crc(),
        })
        .collect();

    let bad: Vec<String> = chunks
        .iter()
        .filter(|c| !c.crc_ok())
        .map(|c| c.chunk_type.to_string())
        .collect();

    let validation = if parsed.terminal_chunk().is_none() {
        ValidationResult::MissingTerminalChunk
    } else if !bad.is_empty() {
        ValidationResult::CrcMismatch(bad)
    } else {
        ValidationResult::Valid
    };

    InspectReport {
        chunks,
        trailing_bytes: data.len() - parsed.end_offset,
        validation,
    }
}

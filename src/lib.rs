//! # DigiCD
//!
//! This library hides an audio track inside a PNG image and recovers it later,
//! leaving a file that still opens as a normal picture.
//!
//! Two carriers are supported: a private ancillary chunk spliced in front of
//! `IEND`, and the least-significant bit of the red sample of every
//! non-transparent pixel.

// Public API exports
pub mod audio;
pub mod crc;
pub mod embed;
pub mod extract;
pub mod inspect;
pub mod lsb;
pub mod png;
pub mod raster;
pub mod strategy;
pub mod utils;

pub use embed::{embed, TagPolicy};
pub use extract::extract;
pub use lsb::PixelBuffer;
pub use crate::png::{ChunkType, CrcPolicy, PngFile};
pub use strategy::{hide, reveal, HideOptions, RevealOptions, Strategy};

/// Result type alias for DigiCD operations
pub type DigiCdResult<T> = Result<T, DigiCdError>;

/// Comprehensive error type for hiding and recovering payloads
#[derive(Debug, thiserror::Error)]
pub enum DigiCdError {
    #[error("Invalid PNG signature")]
    Format,

    #[error("Truncated chunk at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedChunk {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("No payload chunk found (looked for {tags})")]
    PayloadNotFound { tags: String },

    #[error("Payload needs {needed_bits} bits but the image only carries {capacity_bits}")]
    Capacity {
        needed_bits: usize,
        capacity_bits: usize,
    },

    #[error("CRC mismatch in chunk {chunk}: stored {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        chunk: String,
        stored: u32,
        computed: u32,
    },

    #[error("No IEND chunk found")]
    MissingTerminalChunk,

    #[error("Invalid chunk tag: {0:?}")]
    InvalidTag(String),

    #[error("Chunk tag {tag} is not a safe payload carrier: {reason}")]
    NonConformantTag { tag: String, reason: &'static str },

    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    InvalidPixelBuffer { expected: usize, actual: usize },

    #[error("Payload of {0} bytes exceeds the chunk length limit")]
    PayloadTooLarge(usize),

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("Input file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG decode error: {0}")]
    PngDecode(#[from] ::png::DecodingError),

    #[error("PNG encode error: {0}")]
    PngEncode(#[from] ::png::EncodingError),

    #[error("Audio probe error: {0}")]
    Audio(#[from] hound::Error),

    #[error("Malformed ID3 tag: {0}")]
    Id3(String),
}

impl DigiCdError {
    /// Validate that a PNG chunk's stored CRC matches the computed value
    pub fn validate_png_chunk(chunk_type: &ChunkType, stored: u32, computed: u32) -> DigiCdResult<()> {
        if stored != computed {
            Err(DigiCdError::CrcMismatch {
                chunk: chunk_type.to_string(),
                stored,
                computed,
            })
        } else {
            Ok(())
        }
    }
}

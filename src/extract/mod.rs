//! Locating and returning an embedded payload chunk

use log::{debug, info};

use crate::png::{Chunk, ChunkType, PngFile};
use crate::utils::join_tags;
use crate::{DigiCdError, DigiCdResult};

/// Progress of a chunk scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState<'a> {
    Scanning,
    Done(&'a Chunk),
    NotFound,
}

/// Walks chunks in file order looking for the first accepted tag
pub struct PayloadScanner<'a> {
    chunks: std::slice::Iter<'a, Chunk>,
    candidates: &'a [ChunkType],
    state: ScanState<'a>,
}

impl<'a> PayloadScanner<'a> {
    pub fn new(png: &'a PngFile, candidates: &'a [ChunkType]) -> Self {
        Self {
            chunks: png.chunks().iter(),
            candidates,
            state: ScanState::Scanning,
        }
    }

    pub fn state(&self) -> &ScanState<'a> {
        &self.state
    }

    /// Examine one chunk; terminal states are sticky
    pub fn step(&mut self) -> &ScanState<'a> {
        if self.state != ScanState::Scanning {
            return &self.state;
        }

        self.state = match self.chunks.next() {
            Some(chunk) if self.candidates.contains(&chunk.chunk_type) => ScanState::Done(chunk),
            Some(chunk) if chunk.chunk_type == ChunkType::IEND => ScanState::NotFound,
            Some(chunk) => {
                debug!("skipping {} chunk at {}", chunk.chunk_type, chunk.offset);
                ScanState::Scanning
            }
            None => ScanState::NotFound,
        };
        &self.state
    }

    /// Run to completion
    pub fn run(mut self) -> Option<&'a Chunk> {
        loop {
            match self.step() {
                ScanState::Scanning => continue,
                ScanState::Done(chunk) => return Some(*chunk),
                ScanState::NotFound => return None,
            }
        }
    }
}

/// Return the data of the first chunk whose type is in `candidates`
pub fn extract(png: &PngFile, candidates: &[ChunkType]) -> DigiCdResult<Vec<u8>> {
    match PayloadScanner::new(png, candidates).run() {
        Some(chunk) => {
            info!(
                "found {} byte payload in {} chunk at offset {}",
                chunk.data.len(),
                chunk.chunk_type,
                chunk.offset
            );
            Ok(chunk.data.clone())
        }
        None => Err(DigiCdError::PayloadNotFound {
            tags: join_tags(candidates),
        }),
    }
}

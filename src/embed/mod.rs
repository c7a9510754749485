//! Splicing a payload chunk into a PNG in front of IEND

use log::{info, warn};

use crate::crc::chunk_crc;
use crate::png::{ChunkType, CrcPolicy, PngFile};
use crate::utils::CHUNK_OVERHEAD;
use crate::{DigiCdError, DigiCdResult};

/// Largest chunk data length PNG allows (2^31 - 1)
pub const MAX_CHUNK_LENGTH: usize = 0x7FFF_FFFF;

/// Which tags may carry a payload.
///
/// The default embeds into and accepts only the private ancillary `juLi`
/// chunk. Metadata chunks (`tEXt`, `zTXt`, `iTXt`, `eXIf`) hold a keyword and
/// text by convention, so filling one with raw audio produces a file other
/// tools may reject or mangle. That is only allowed when
/// `allow_metadata_alias` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPolicy {
    pub embed_tag: ChunkType,
    pub accepted_tags: Vec<ChunkType>,
    pub allow_metadata_alias: bool,
}

impl Default for TagPolicy {
    fn default() -> Self {
        Self {
            embed_tag: ChunkType::DEFAULT_PAYLOAD,
            accepted_tags: vec![ChunkType::DEFAULT_PAYLOAD],
            allow_metadata_alias: false,
        }
    }
}

impl TagPolicy {
    /// Accepts `tEXt` as a carrier on extraction as well, for files written by
    /// older tools that stored the track there.
    pub fn legacy() -> Self {
        Self {
            embed_tag: ChunkType::DEFAULT_PAYLOAD,
            accepted_tags: vec![ChunkType::DEFAULT_PAYLOAD, ChunkType::TEXT],
            allow_metadata_alias: true,
        }
    }

    pub fn with_embed_tag(mut self, tag: ChunkType) -> Self {
        self.embed_tag = tag;
        if !self.accepted_tags.contains(&tag) {
            self.accepted_tags.insert(0, tag);
        }
        self
    }

    /// Check that `tag` may be written as a payload chunk under this policy
    pub fn check_embed_tag(&self, tag: ChunkType) -> DigiCdResult<()> {
        check_carrier(tag)?;
        if tag.is_metadata_alias() {
            if !self.allow_metadata_alias {
                return Err(DigiCdError::NonConformantTag {
                    tag: tag.to_string(),
                    reason: "metadata chunks expect keyword and text, not binary data",
                });
            }
            warn!("embedding binary payload in metadata chunk {}; other tools may reject the file", tag);
        }
        Ok(())
    }
}

/// A carrier tag must be four letters and ancillary
fn check_carrier(tag: ChunkType) -> DigiCdResult<()> {
    if !tag.is_well_formed() {
        return Err(DigiCdError::InvalidTag(tag.to_string()));
    }
    if tag.is_critical() {
        return Err(DigiCdError::NonConformantTag {
            tag: tag.to_string(),
            reason: "critical chunks must be understood by every decoder",
        });
    }
    Ok(())
}

/// Insert `payload` as a new `tag` chunk immediately before IEND.
///
/// Every byte before IEND is copied verbatim, and IEND plus any trailing bytes
/// follow unchanged, so the output is exactly `len(payload) + 12` bytes longer.
/// Critical tags are refused; metadata aliases are only gated by
/// [`embed_with_policy`].
pub fn embed(png: &PngFile, payload: &[u8], tag: ChunkType) -> DigiCdResult<PngFile> {
    check_carrier(tag)?;
    if payload.len() > MAX_CHUNK_LENGTH {
        return Err(DigiCdError::PayloadTooLarge(payload.len()));
    }

    let iend_pos = png.terminal_chunk_offset()?;
    let raw = png.as_bytes();

    let mut new_data = Vec::with_capacity(raw.len() + payload.len() + CHUNK_OVERHEAD);
    new_data.extend_from_slice(&raw[..iend_pos]);
    write_chunk(&mut new_data, tag, payload);
    new_data.extend_from_slice(&raw[iend_pos..]);

    info!(
        "embedded {} byte payload as {} chunk at offset {}",
        payload.len(),
        tag,
        iend_pos
    );

    PngFile::from_data(new_data, CrcPolicy::Ignore)
}

/// Embed using the policy's tag after checking it is an acceptable carrier
pub fn embed_with_policy(png: &PngFile, payload: &[u8], policy: &TagPolicy) -> DigiCdResult<PngFile> {
    policy.check_embed_tag(policy.embed_tag)?;
    embed(png, payload, policy.embed_tag)
}

/// Serialize one chunk: length, type, data, CRC
pub fn write_chunk(out: &mut Vec<u8>, tag: ChunkType, data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(tag.as_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(&chunk_crc(&tag, data).to_be_bytes());
}

//! Identifying the audio payload for whatever plays it back

use std::fmt;
use std::io::Cursor;

use hound::WavReader;

use crate::DigiCdResult;

pub mod id3;

pub use id3::{cover_art, CoverArt};

/// What kind of audio a payload appears to be
#[derive(Debug, Clone, PartialEq)]
pub enum AudioInfo {
    Wav {
        channels: u16,
        sample_rate: u32,
        bits_per_sample: u16,
        duration_secs: f64,
    },
    /// MPEG audio, optionally behind an ID3v2 tag
    Mpeg { id3_version: Option<(u8, u8)> },
    Unknown,
}

impl AudioInfo {
    /// MIME type to hand to a player along with the bytes
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioInfo::Wav { .. } => "audio/wav",
            AudioInfo::Mpeg { .. } => "audio/mpeg",
            AudioInfo::Unknown => "application/octet-stream",
        }
    }
}

impl fmt::Display for AudioInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioInfo::Wav {
                channels,
                sample_rate,
                bits_per_sample,
                duration_secs,
            } => write!(
                f,
                "WAV, {} ch, {} Hz, {} bit, {:.2}s",
                channels, sample_rate, bits_per_sample, duration_secs
            ),
            AudioInfo::Mpeg { id3_version: Some((major, rev)) } => {
                write!(f, "MPEG audio with ID3v2.{}.{} tag", major, rev)
            }
            AudioInfo::Mpeg { id3_version: None } => write!(f, "MPEG audio"),
            AudioInfo::Unknown => write!(f, "unknown audio format"),
        }
    }
}

/// Sniff the payload format. A RIFF/WAVE header that hound cannot read is an error.
pub fn probe(payload: &[u8]) -> DigiCdResult<AudioInfo> {
    if payload.len() >= 12 && &payload[0..4] == b"RIFF" && &payload[8..12] == b"WAVE" {
        let reader = WavReader::new(Cursor::new(payload))?;
        let spec = reader.spec();
        return Ok(AudioInfo::Wav {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            duration_secs: reader.duration() as f64 / spec.sample_rate as f64,
        });
    }

    if payload.len() >= 10 && &payload[0..3] == b"ID3" {
        return Ok(AudioInfo::Mpeg {
            id3_version: Some((payload[3], payload[4])),
        });
    }

    // MPEG frame sync: 11 set bits
    if payload.len() >= 2 && payload[0] == 0xFF && payload[1] & 0xE0 == 0xE0 {
        return Ok(AudioInfo::Mpeg { id3_version: None });
    }

    Ok(AudioInfo::Unknown)
}

/// One-line description of the payload for reports. Never fails: a payload
/// the prober cannot read is still a recovered payload.
pub fn describe(payload: &[u8]) -> String {
    match probe(payload) {
        Ok(info) => format!("{}, {}", info, info.mime_type()),
        Err(e) => format!("unrecognised audio ({})", e),
    }
}

//! ID3v2 tag reading, limited to the attached picture used as cover art

use byteorder::{BigEndian, ByteOrder};
use log::debug;

use crate::utils::take;
use crate::{DigiCdError, DigiCdResult};

const HEADER_LEN: usize = 10;
const FLAG_UNSYNC: u8 = 0x80;
const FLAG_EXTENDED: u8 = 0x40;
/// Picture type 3 in the ID3 picture-type table
const FRONT_COVER: u8 = 3;

/// Picture embedded in an ID3v2 tag (APIC, or PIC in v2.2)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    pub mime_type: String,
    pub picture_type: u8,
    pub description: String,
    pub data: Vec<u8>,
}

impl CoverArt {
    /// File extension matching the MIME type
    pub fn extension(&self) -> &'static str {
        match self.mime_type.to_ascii_lowercase().as_str() {
            "image/png" | "png" => "png",
            "image/jpeg" | "image/jpg" | "jpg" => "jpg",
            "image/gif" | "gif" => "gif",
            "image/bmp" | "bmp" => "bmp",
            _ => "bin",
        }
    }
}

/// Decode a 28-bit synchsafe integer
fn synchsafe(bytes: &[u8]) -> usize {
    bytes.iter().fold(0usize, |acc, &b| (acc << 7) | (b & 0x7F) as usize)
}

/// Undo unsynchronisation: every `FF 00` becomes `FF`
fn resync(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut prev_ff = false;
    for &b in data {
        if !(prev_ff && b == 0x00) {
            out.push(b);
        }
        prev_ff = b == 0xFF;
    }
    out
}

/// Offset just past a text terminator for the given encoding
fn skip_terminated(data: &[u8], start: usize, encoding: u8) -> DigiCdResult<usize> {
    let rest = data.get(start..).unwrap_or_default();
    let end = if encoding == 1 || encoding == 2 {
        rest.chunks_exact(2)
            .position(|pair| pair == [0, 0])
            .map(|i| i * 2 + 2)
    } else {
        rest.iter().position(|&b| b == 0).map(|i| i + 1)
    };
    end.map(|n| start + n)
        .ok_or_else(|| DigiCdError::Id3("unterminated text field".to_string()))
}

fn decode_text(bytes: &[u8], encoding: u8) -> String {
    match encoding {
        1 | 2 => {
            let mut units: Vec<u16> = bytes.chunks_exact(2).map(BigEndian::read_u16).collect();
            // Encoding 1 carries a BOM; FFFE read big-endian means little-endian data
            match units.first().copied() {
                Some(0xFEFF) => {
                    units.remove(0);
                }
                Some(0xFFFE) => {
                    units.remove(0);
                    units = units.into_iter().map(u16::swap_bytes).collect();
                }
                _ => {}
            }
            String::from_utf16_lossy(&units)
        }
        3 => String::from_utf8_lossy(bytes).into_owned(),
        _ => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Parse an APIC body (or PIC body when `v22` is set)
fn parse_picture(body: &[u8], v22: bool) -> DigiCdResult<CoverArt> {
    let encoding = take(body, 0, 1)?[0];
    let (mime_type, after_mime) = if v22 {
        let format = take(body, 1, 3)?;
        (String::from_utf8_lossy(format).into_owned(), 4)
    } else {
        let end = skip_terminated(body, 1, 0)?;
        (decode_text(&body[1..end - 1], 0), end)
    };
    let picture_type = take(body, after_mime, 1)?[0];
    let desc_start = after_mime + 1;
    let desc_end = skip_terminated(body, desc_start, encoding)?;
    let terminator = if encoding == 1 || encoding == 2 { 2 } else { 1 };
    let description = decode_text(&body[desc_start..desc_end - terminator], encoding);

    Ok(CoverArt {
        mime_type,
        picture_type,
        description,
        data: body[desc_end..].to_vec(),
    })
}

/// Find the cover picture in an ID3v2 tag at the start of `payload`.
///
/// Returns `Ok(None)` when there is no tag or the tag holds no picture. The
/// front cover is preferred; otherwise the first picture is returned.
/// Compressed and encrypted frames are skipped.
pub fn cover_art(payload: &[u8]) -> DigiCdResult<Option<CoverArt>> {
    if payload.len() < HEADER_LEN || &payload[0..3] != b"ID3" {
        return Ok(None);
    }
    let major = payload[3];
    let flags = payload[5];
    let tag_size = synchsafe(&payload[6..10]);
    if !(2..=4).contains(&major) {
        return Err(DigiCdError::Id3(format!("unsupported version 2.{}", major)));
    }

    let mut tag = take(payload, HEADER_LEN, tag_size)?.to_vec();
    if flags & FLAG_UNSYNC != 0 && major < 4 {
        tag = resync(&tag);
    }

    let mut offset = 0;
    if flags & FLAG_EXTENDED != 0 && major > 2 {
        let size_field = take(&tag, 0, 4)?;
        offset = if major == 4 {
            synchsafe(size_field)
        } else {
            BigEndian::read_u32(size_field) as usize + 4
        };
    }

    let (id_len, header_len) = if major == 2 { (3, 6) } else { (4, 10) };
    let mut found: Option<CoverArt> = None;

    while offset + header_len <= tag.len() {
        let header = &tag[offset..offset + header_len];
        if header[0] == 0 {
            break; // padding
        }
        let id = &header[..id_len];
        let size = match major {
            2 => BigEndian::read_u24(&header[3..6]) as usize,
            3 => BigEndian::read_u32(&header[4..8]) as usize,
            _ => synchsafe(&header[4..8]),
        };
        let frame_flags = if major == 2 { 0 } else { header[9] };
        let body_start = offset + header_len;
        let body = take(&tag, body_start, size)?;
        offset = body_start + size;

        let is_picture = if major == 2 { id == b"PIC" } else { id == b"APIC" };
        if !is_picture {
            continue;
        }

        let picture = match major {
            3 => {
                // compression 0x80, encryption 0x40, grouping 0x20
                if frame_flags & 0xC0 != 0 {
                    debug!("skipping compressed or encrypted APIC frame");
                    continue;
                }
                let skip = if frame_flags & 0x20 != 0 { 1 } else { 0 };
                parse_picture(take(body, skip, size.saturating_sub(skip))?, false)?
            }
            4 => {
                // compression 0x08, encryption 0x04, unsync 0x02, data length 0x01
                if frame_flags & 0x0C != 0 {
                    debug!("skipping compressed or encrypted APIC frame");
                    continue;
                }
                let mut skip = if frame_flags & 0x40 != 0 { 1 } else { 0 };
                if frame_flags & 0x01 != 0 {
                    skip += 4;
                }
                let raw = take(body, skip, size.saturating_sub(skip))?;
                if frame_flags & 0x02 != 0 {
                    parse_picture(&resync(raw), false)?
                } else {
                    parse_picture(raw, false)?
                }
            }
            _ => parse_picture(body, true)?,
        };

        debug!(
            "found {} picture of type {} ({} bytes)",
            picture.mime_type,
            picture.picture_type,
            picture.data.len()
        );
        if picture.picture_type == FRONT_COVER {
            return Ok(Some(picture));
        }
        if found.is_none() {
            found = Some(picture);
        }
    }

    Ok(found)
}

// src/decode.rs

//! Source file decoding.
//!
//! Exported packages store service descriptors and flow bodies as XML, but
//! the container frequently wraps them in binary framing, mixed encodings,
//! or trailing garbage. This module recovers well-formed text from raw bytes
//! using a fixed strategy cascade:
//!
//! 1. Try UTF-8, UTF-16 (BOM or NUL-byte heuristic), then Latin-1, accepting
//!    the first decode that contains a recognizable root-tag marker.
//! 2. Scan the raw bytes for the earliest known start marker, slice from
//!    there, and retry with lossy decoding.
//! 3. Last resort: keep only printable ASCII plus tab/CR/LF.
//!
//! Every accepted decode is cleaned: C0 control characters (except
//! tab/CR/LF) are stripped and anything after the last `>` is truncated.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

/// Markers that identify decoded text as a recognizable descriptor root
const ROOT_MARKERS: [&str; 3] = ["<?xml", "<Values", "<node"];

/// Byte sequences scanned for when no whole-file decode succeeds
const START_MARKERS: [&[u8]; 4] = [b"<?xml", b"<Values", b"<node", b"<record"];

static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f]").unwrap());

/// Errors from the decode cascade
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("input is empty")]
    EmptyInput,

    #[error("no decoding strategy produced usable text")]
    Undecodable,
}

/// Decode raw bytes from one package unit into cleaned XML text.
///
/// Failure is expected for genuinely binary units (compiled class files,
/// images); callers substitute an empty body rather than aborting.
pub fn decode_source(raw: &[u8]) -> Result<String, DecodeError> {
    if raw.is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    // Whole-file decode, accepting the first result with a root marker.
    for decoded in [try_utf8(raw), try_utf16(raw), Some(latin1(raw))]
        .into_iter()
        .flatten()
    {
        if has_root_marker(&decoded) {
            return Ok(clean(&decoded));
        }
    }

    // Binary framing before the XML payload: slice from the earliest marker.
    if let Some(offset) = earliest_marker(raw) {
        debug!(offset, "sliced binary prefix before XML marker");
        let sliced = String::from_utf8_lossy(&raw[offset..]);
        if !sliced.trim().is_empty() {
            return Ok(clean(&sliced));
        }
    }

    // Last resort: printable ASCII plus whitespace.
    let filtered: String = raw
        .iter()
        .filter(|&&b| (32..127).contains(&b) || b == b'\t' || b == b'\n' || b == b'\r')
        .map(|&b| b as char)
        .collect();
    let cleaned = clean(&filtered);
    if cleaned.trim().is_empty() {
        return Err(DecodeError::Undecodable);
    }
    Ok(cleaned)
}

fn has_root_marker(text: &str) -> bool {
    ROOT_MARKERS.iter().any(|m| text.contains(m))
}

fn try_utf8(raw: &[u8]) -> Option<String> {
    std::str::from_utf8(raw).ok().map(str::to_string)
}

/// Decode UTF-16 via BOM, or via a NUL-byte density heuristic when the
/// exporter wrote BOM-less little-endian text.
fn try_utf16(raw: &[u8]) -> Option<String> {
    if raw.len() < 2 {
        return None;
    }
    let (le, body) = match (raw[0], raw[1]) {
        (0xff, 0xfe) => (true, &raw[2..]),
        (0xfe, 0xff) => (false, &raw[2..]),
        _ => {
            let nuls = raw.iter().filter(|&&b| b == 0).count();
            if nuls * 3 < raw.len() {
                return None;
            }
            // More NULs at odd offsets means little-endian ASCII-range text.
            let odd_nuls = raw.iter().skip(1).step_by(2).filter(|&&b| b == 0).count();
            (odd_nuls * 2 >= nuls, raw)
        }
    };
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|c| {
            if le {
                u16::from_le_bytes([c[0], c[1]])
            } else {
                u16::from_be_bytes([c[0], c[1]])
            }
        })
        .collect();
    String::from_utf16(&units).ok()
}

fn latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| b as char).collect()
}

fn earliest_marker(raw: &[u8]) -> Option<usize> {
    START_MARKERS
        .iter()
        .filter_map(|m| find_subsequence(raw, m))
        .min()
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Strip control characters and truncate trailing garbage after the final
/// closing angle bracket.
fn clean(text: &str) -> String {
    let stripped = CONTROL_CHARS.replace_all(text, "");
    match stripped.rfind('>') {
        Some(pos) => stripped[..=pos].to_string(),
        None => stripped.into_owned(),
    }
}

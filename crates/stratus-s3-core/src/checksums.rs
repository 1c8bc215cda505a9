//! ETag and Content-MD5 computation.
//!
//! Single-part ETags are the quoted hex MD5 of the body. Multipart ETags
//! are composite: the MD5 of the concatenated raw part digests, suffixed
//! with `-<part_count>`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use md5::{Digest, Md5};

/// Compute the unquoted hex MD5 digest of a byte slice.
#[must_use]
pub fn compute_md5(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Compute the quoted ETag for a single-part body.
#[must_use]
pub fn compute_etag(data: &[u8]) -> String {
    format!("\"{}\"", compute_md5(data))
}

/// Compute the composite multipart ETag from the parts' hex MD5 digests.
///
/// The digests are decoded back to raw bytes, concatenated, hashed, and the
/// part count appended: `"<md5-of-part-md5s>-<count>"`.
#[must_use]
pub fn compute_multipart_etag(part_md5_hexes: &[String], part_count: usize) -> String {
    let mut concatenated = Vec::with_capacity(part_md5_hexes.len() * 16);
    for hex_digest in part_md5_hexes {
        // Digests we produced ourselves are always valid hex.
        if let Ok(raw) = hex::decode(hex_digest) {
            concatenated.extend_from_slice(&raw);
        }
    }
    format!("\"{}-{part_count}\"", compute_md5(&concatenated))
}

/// Verify a `Content-MD5` header value against the received body.
///
/// The header carries the base64 encoding of the raw 16-byte MD5 digest.
/// Returns `false` for undecodable headers as well as genuine mismatches.
#[must_use]
pub fn content_md5_matches(header_value: &str, body: &[u8]) -> bool {
    let Ok(expected) = BASE64.decode(header_value.trim()) else {
        return false;
    };
    expected.as_slice() == Md5::digest(body).as_slice()
}

/// Normalize an ETag for comparison: strip surrounding quotes and lowercase.
///
/// Multipart completion compares client-supplied ETags against stored ones
/// case-insensitively with quotes ignored.
#[must_use]
pub fn normalize_etag(etag: &str) -> String {
    etag.trim().trim_matches('"').to_ascii_lowercase()
}

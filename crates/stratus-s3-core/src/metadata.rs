//! User metadata validation.
//!
//! Metadata entries arrive as `x-amz-meta-*` headers. Entries whose names
//! contain control characters or RFC 2616 separators are dropped rather than
//! rejected; the count of dropped entries is reported back through the
//! `x-amz-missing-meta` response header.

use std::collections::BTreeMap;

/// RFC 2616 separator characters, illegal in header tokens.
const SEPARATORS: &[char] = &[
    '(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '/', '[', ']', '?', '=', '{', '}', ' ',
    '\t',
];

/// Whether `name` is a legal metadata entry name.
#[must_use]
pub fn is_valid_meta_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            let code = c as u32;
            code > 31 && code != 127 && !SEPARATORS.contains(&c)
        })
}

/// Split metadata into storable entries and a dropped-entry count.
#[must_use]
pub fn filter_metadata(metadata: BTreeMap<String, String>) -> (BTreeMap<String, String>, u32) {
    let mut kept = BTreeMap::new();
    let mut dropped = 0u32;
    for (name, value) in metadata {
        if is_valid_meta_name(&name) {
            kept.insert(name.to_ascii_lowercase(), value);
        } else {
            dropped += 1;
        }
    }
    (kept, dropped)
}

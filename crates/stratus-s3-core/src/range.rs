//! Byte-range header parsing.
//!
//! Only the single inclusive form `bytes=start-end` is honored. Suffix
//! ranges (`bytes=-5`), open-ended ranges (`bytes=0-`), and multi-range
//! headers (`bytes=0-10,20-30`) are silently ignored and the full body is
//! served.

use crate::error::{ServiceError, ServiceResult};

/// A resolved byte range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset.
    pub start: u64,
    /// Last byte offset, inclusive.
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Never empty once constructed; kept for clippy symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Render the `Content-Range` header value for an object of `size` bytes.
    #[must_use]
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// Parse a `Range` header against an object of `size` bytes.
///
/// Returns `Ok(None)` when the header is absent or in a form this gateway
/// does not serve partially. Returns `InvalidRange` when the range starts at
/// or past the end of the object. An `end` past the last byte is clamped.
pub fn resolve_range(header: Option<&str>, size: u64) -> ServiceResult<Option<ByteRange>> {
    let Some(raw) = header else {
        return Ok(None);
    };
    let Some(spec) = raw.trim().strip_prefix("bytes=") else {
        return Ok(None);
    };
    // Multi-range requests fall back to the full body.
    if spec.contains(',') {
        return Ok(None);
    }
    let Some((start_str, end_str)) = spec.split_once('-') else {
        return Ok(None);
    };
    // Suffix (`-5`) and open-ended (`0-`) forms fall back to the full body.
    if start_str.is_empty() || end_str.is_empty() {
        return Ok(None);
    }
    let (Ok(start), Ok(end)) = (start_str.parse::<u64>(), end_str.parse::<u64>()) else {
        return Ok(None);
    };
    if start > end {
        return Ok(None);
    }
    if start >= size {
        return Err(ServiceError::InvalidRange { size });
    }
    Ok(Some(ByteRange {
        start,
        end: end.min(size.saturating_sub(1)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_inclusive_range() {
        let range = resolve_range(Some("bytes=2-5"), 100).unwrap().unwrap();
        assert_eq!(range.start, 2);
        assert_eq!(range.end, 5);
        assert_eq!(range.len(), 4);
        assert_eq!(range.content_range(100), "bytes 2-5/100");
    }

    #[test]
    fn test_should_clamp_end_to_object_size() {
        let range = resolve_range(Some("bytes=90-200"), 100).unwrap().unwrap();
        assert_eq!(range.end, 99);
    }

    #[test]
    fn test_should_ignore_suffix_and_open_ended_forms() {
        assert_eq!(resolve_range(Some("bytes=-5"), 100).unwrap(), None);
        assert_eq!(resolve_range(Some("bytes=10-"), 100).unwrap(), None);
    }

    #[test]
    fn test_should_ignore_multi_range_header() {
        assert_eq!(resolve_range(Some("bytes=0-10,20-30"), 100).unwrap(), None);
    }

    #[test]
    fn test_should_ignore_malformed_header() {
        assert_eq!(resolve_range(Some("chunks=0-10"), 100).unwrap(), None);
        assert_eq!(resolve_range(Some("bytes=ten-twenty"), 100).unwrap(), None);
        assert_eq!(resolve_range(Some("bytes=9-2"), 100).unwrap(), None);
        assert_eq!(resolve_range(None, 100).unwrap(), None);
    }

    #[test]
    fn test_should_reject_range_past_end() {
        let err = resolve_range(Some("bytes=100-110"), 100).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRange { size: 100 }));
    }
}

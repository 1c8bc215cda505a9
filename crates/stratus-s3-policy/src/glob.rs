//! Glob matching for policy statements.
//!
//! The access policy language uses `*` (any run of characters, including
//! none) and `?` (exactly one character) in action names, resource ARNs,
//! principal IDs, and `StringLike` condition values. Matching is byte-wise
//! and case-sensitive.

/// Returns `true` when `candidate` matches `pattern`.
///
/// An empty pattern matches only the empty string; a bare `"*"` matches
/// everything, including the empty string.
#[must_use]
pub fn matches(pattern: &str, candidate: &str) -> bool {
    if pattern.is_empty() {
        return candidate.is_empty();
    }
    if pattern == "*" {
        return true;
    }
    deep_match(pattern.as_bytes(), candidate.as_bytes())
}

fn deep_match(mut pattern: &[u8], mut candidate: &[u8]) -> bool {
    while !pattern.is_empty() {
        match pattern[0] {
            b'?' => {
                if candidate.is_empty() {
                    return false;
                }
            }
            b'*' => {
                // Trailing `*` swallows the rest; otherwise try matching the
                // remainder against zero characters, then against one more.
                return pattern.len() == 1
                    || deep_match(&pattern[1..], candidate)
                    || (!candidate.is_empty() && deep_match(pattern, &candidate[1..]));
            }
            c => {
                if candidate.is_empty() || candidate[0] != c {
                    return false;
                }
            }
        }
        pattern = &pattern[1..];
        candidate = &candidate[1..];
    }
    candidate.is_empty()
}

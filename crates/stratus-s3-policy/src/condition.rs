//! Condition block evaluation.
//!
//! Supported operators: `IpAddress`/`NotIpAddress` over CIDR values of
//! `aws:SourceIp`, and `StringEquals`/`StringNotEquals`/`StringLike`/
//! `StringNotLike` over `s3:prefix`, `s3:delimiter`, and `s3:max-keys`.
//! An unknown operator, an unknown condition key, or a key the request
//! carries no value for makes the statement non-matching; it is never an
//! evaluation-time error.

use std::collections::BTreeMap;
use std::net::IpAddr;

use crate::document::{ConditionBlock, ValueList};
use crate::evaluate::AccessRequest;
use crate::glob;

/// Whether every operator in `block` holds for `request`.
pub(crate) fn conditions_match(block: &ConditionBlock, request: &AccessRequest) -> bool {
    block
        .0
        .iter()
        .all(|(operator, keys)| operator_matches(operator, keys, request))
}

fn operator_matches(
    operator: &str,
    keys: &BTreeMap<String, ValueList>,
    request: &AccessRequest,
) -> bool {
    match operator {
        "IpAddress" => ip_matches(keys, request, false),
        "NotIpAddress" => ip_matches(keys, request, true),
        "StringEquals" => strings_match(keys, request, false, false),
        "StringNotEquals" => strings_match(keys, request, false, true),
        "StringLike" => strings_match(keys, request, true, false),
        "StringNotLike" => strings_match(keys, request, true, true),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// IP conditions
// ---------------------------------------------------------------------------

fn ip_matches(keys: &BTreeMap<String, ValueList>, request: &AccessRequest, negate: bool) -> bool {
    keys.iter().all(|(key, ranges)| {
        if !key.eq_ignore_ascii_case("aws:SourceIp") {
            return false;
        }
        let Some(address) = request.source_ip else {
            return false;
        };
        let contained = ranges.iter().any(|range| cidr_contains(range, address));
        contained != negate
    })
}

/// Whether `address` falls inside `range` (`a.b.c.d/len` or a bare address).
///
/// Unparseable ranges and address-family mismatches never contain anything.
fn cidr_contains(range: &str, address: IpAddr) -> bool {
    let (base, length) = match range.split_once('/') {
        Some((base, length)) => {
            let Ok(length) = length.parse::<u32>() else {
                return false;
            };
            (base, Some(length))
        }
        None => (range, None),
    };
    let Ok(base) = base.parse::<IpAddr>() else {
        return false;
    };
    match (base, address) {
        (IpAddr::V4(base), IpAddr::V4(address)) => {
            let length = length.unwrap_or(32);
            if length > 32 {
                return false;
            }
            if length == 0 {
                return true;
            }
            let shift = 32 - length;
            (u32::from(base) >> shift) == (u32::from(address) >> shift)
        }
        (IpAddr::V6(base), IpAddr::V6(address)) => {
            let length = length.unwrap_or(128);
            if length > 128 {
                return false;
            }
            if length == 0 {
                return true;
            }
            let shift = 128 - length;
            (u128::from(base) >> shift) == (u128::from(address) >> shift)
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// String conditions
// ---------------------------------------------------------------------------

fn strings_match(
    keys: &BTreeMap<String, ValueList>,
    request: &AccessRequest,
    like: bool,
    negate: bool,
) -> bool {
    keys.iter().all(|(key, values)| {
        let Some(actual) = context_value(key, request) else {
            return false;
        };
        let matched = values.iter().any(|value| {
            if like {
                glob::matches(value, &actual)
            } else {
                value == &actual
            }
        });
        matched != negate
    })
}

/// The request-side value for a condition key, when the request carries one.
fn context_value(key: &str, request: &AccessRequest) -> Option<String> {
    if key.eq_ignore_ascii_case("s3:prefix") {
        request.prefix.clone()
    } else if key.eq_ignore_ascii_case("s3:delimiter") {
        request.delimiter.clone()
    } else if key.eq_ignore_ascii_case("s3:max-keys") {
        request.max_keys.map(|n| n.to_string())
    } else {
        None
    }
}

//! `multipart/form-data` parsing for browser POST uploads.
//!
//! The parser is a small explicit state machine over the buffered body
//! rather than a line-splitting pass: **Preamble** consumes everything up to
//! the first boundary delimiter, **Header** collects one part's headers up
//! to the blank line, and **Body** scans for the next delimiter to slice the
//! part payload out of the buffer. Field ordering is preserved, which
//! matters because authentication for form uploads is deferred until every
//! field has been read.
//!
//! Every part except the file is treated as a name/value field whose value
//! is trimmed. The file part is recognized by its `filename` attribute (or
//! the conventional `file` field name) and kept as raw bytes.

use bytes::Bytes;
use stratus_s3_model::error::{S3Error, S3ErrorCode};

/// A parsed `multipart/form-data` request body.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    /// Name/value fields in the order they appeared.
    pub fields: Vec<(String, String)>,
    /// Payload of the file part.
    pub file: Bytes,
    /// The `filename` attribute of the file part, used for `${filename}`
    /// substitution in the key field.
    pub file_name: Option<String>,
    /// The file part's own `Content-Type` header.
    pub file_content_type: Option<String>,
}

impl MultipartForm {
    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Extract the boundary parameter from a `Content-Type` header value.
#[must_use]
pub fn extract_boundary(content_type: &str) -> Option<String> {
    let parsed: mime::Mime = content_type.parse().ok()?;
    if parsed.type_() != mime::MULTIPART {
        return None;
    }
    parsed
        .get_param(mime::BOUNDARY)
        .map(|b| b.as_str().to_owned())
}

/// Parser states. One part cycles Header -> Body; Preamble runs once.
enum ParseState {
    Preamble,
    Header,
    Body,
}

/// Headers accumulated for the part currently being parsed.
#[derive(Default)]
struct PartHeaders {
    name: Option<String>,
    file_name: Option<String>,
    content_type: Option<String>,
}

impl PartHeaders {
    fn is_file(&self) -> bool {
        self.file_name.is_some() || self.name.as_deref() == Some("file")
    }
}

/// Parse a buffered `multipart/form-data` body.
///
/// # Errors
///
/// Returns `InvalidArgument` when the body is not well-formed multipart
/// content for the given boundary.
pub fn parse_form(body: &Bytes, boundary: &str) -> Result<MultipartForm, S3Error> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();
    // A part's payload ends where the next delimiter line begins.
    let closing = [b"\r\n".as_slice(), delimiter].concat();

    let mut form = MultipartForm::default();
    let mut state = ParseState::Preamble;
    let mut headers = PartHeaders::default();
    let mut pos = 0usize;

    loop {
        match state {
            ParseState::Preamble => {
                let (line, next) = read_line(body, pos).ok_or_else(truncated)?;
                pos = next;
                if line == delimiter {
                    state = ParseState::Header;
                } else if is_final_delimiter(line, delimiter) {
                    return Ok(form);
                }
            }
            ParseState::Header => {
                let (line, next) = read_line(body, pos).ok_or_else(truncated)?;
                pos = next;
                if line.is_empty() {
                    state = ParseState::Body;
                } else {
                    parse_part_header(line, &mut headers);
                }
            }
            ParseState::Body => {
                let end = find(body, &closing, pos).ok_or_else(truncated)?;
                let payload = &body[pos..end];
                pos = end + closing.len();

                if headers.is_file() {
                    form.file = body.slice(end - payload.len()..end);
                    form.file_name = headers.file_name.take();
                    form.file_content_type = headers.content_type.take();
                } else if let Some(name) = headers.name.take() {
                    let value = String::from_utf8_lossy(payload).trim().to_owned();
                    form.fields.push((name, value));
                }
                headers = PartHeaders::default();

                // After the delimiter: "--" closes the stream, CRLF opens
                // the next part's headers.
                if body[pos..].starts_with(b"--") {
                    return Ok(form);
                }
                let (rest, next) = read_line(body, pos).ok_or_else(truncated)?;
                if !rest.is_empty() {
                    return Err(malformed("unexpected bytes after boundary delimiter"));
                }
                pos = next;
                state = ParseState::Header;
            }
        }
    }
}

/// Read one CRLF-terminated line starting at `from`.
///
/// Returns the line without its terminator and the position just past it.
/// A trailing line without CRLF counts as a line ending at the buffer end.
fn read_line(buf: &[u8], from: usize) -> Option<(&[u8], usize)> {
    if from >= buf.len() {
        return None;
    }
    match find(buf, b"\r\n", from) {
        Some(end) => Some((&buf[from..end], end + 2)),
        None => Some((&buf[from..], buf.len())),
    }
}

/// First occurrence of `needle` in `haystack` at or after `from`.
fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| from + i)
}

fn is_final_delimiter(line: &[u8], delimiter: &[u8]) -> bool {
    line.len() == delimiter.len() + 2 && line.starts_with(delimiter) && line.ends_with(b"--")
}

/// Parse one part header line into the accumulator.
fn parse_part_header(line: &[u8], headers: &mut PartHeaders) {
    let Ok(line) = std::str::from_utf8(line) else {
        return;
    };
    let Some((name, value)) = line.split_once(':') else {
        return;
    };
    let value = value.trim();

    if name.eq_ignore_ascii_case("content-disposition") {
        for param in value.split(';') {
            let param = param.trim();
            if let Some(v) = param.strip_prefix("name=") {
                headers.name = Some(v.trim_matches('"').to_owned());
            } else if let Some(v) = param.strip_prefix("filename=") {
                headers.file_name = Some(v.trim_matches('"').to_owned());
            }
        }
    } else if name.eq_ignore_ascii_case("content-type") {
        headers.content_type = Some(value.to_owned());
    }
}

fn truncated() -> S3Error {
    malformed("multipart body ended before the closing boundary")
}

fn malformed(detail: &str) -> S3Error {
    S3Error::new(S3ErrorCode::InvalidArgument)
        .with_message(format!("Malformed multipart/form-data body: {detail}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "----stratus42";

    fn form_body(parts: &[(&str, Option<&str>, Option<&str>, &str)]) -> Bytes {
        let mut body = String::new();
        for (name, filename, content_type, value) in parts {
            body.push_str("------stratus42\r\n");
            body.push_str("Content-Disposition: form-data; name=\"");
            body.push_str(name);
            body.push('"');
            if let Some(f) = filename {
                body.push_str("; filename=\"");
                body.push_str(f);
                body.push('"');
            }
            body.push_str("\r\n");
            if let Some(ct) = content_type {
                body.push_str("Content-Type: ");
                body.push_str(ct);
                body.push_str("\r\n");
            }
            body.push_str("\r\n");
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str("------stratus42--\r\n");
        Bytes::from(body)
    }

    #[test]
    fn test_should_extract_boundary_from_content_type() {
        assert_eq!(
            extract_boundary("multipart/form-data; boundary=----stratus42"),
            Some("----stratus42".to_owned())
        );
        assert_eq!(
            extract_boundary("multipart/form-data; boundary=\"quoted\""),
            Some("quoted".to_owned())
        );
        assert_eq!(extract_boundary("application/xml"), None);
    }

    #[test]
    fn test_should_parse_fields_in_order_and_trim_values() {
        let body = form_body(&[
            ("key", None, None, "  photos/${filename} "),
            ("acl", None, None, "public-read"),
            ("AWSAccessKeyId", None, None, "STRATUSEXAMPLEKEY"),
            ("file", Some("cat.jpg"), Some("image/jpeg"), "jpegbytes"),
        ]);
        let form = parse_form(&body, BOUNDARY).expect("parses");

        assert_eq!(
            form.fields,
            vec![
                ("key".to_owned(), "photos/${filename}".to_owned()),
                ("acl".to_owned(), "public-read".to_owned()),
                ("AWSAccessKeyId".to_owned(), "STRATUSEXAMPLEKEY".to_owned()),
            ]
        );
        assert_eq!(form.file.as_ref(), b"jpegbytes");
        assert_eq!(form.file_name.as_deref(), Some("cat.jpg"));
        assert_eq!(form.file_content_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn test_should_keep_file_bytes_unmodified() {
        // File payloads must not be trimmed even when they look like text.
        let body = form_body(&[("file", Some("a.txt"), None, "  padded  ")]);
        let form = parse_form(&body, BOUNDARY).expect("parses");
        assert_eq!(form.file.as_ref(), b"  padded  ");
    }

    #[test]
    fn test_should_treat_file_field_without_filename_as_file() {
        let body = form_body(&[("file", None, None, "raw")]);
        let form = parse_form(&body, BOUNDARY).expect("parses");
        assert_eq!(form.file.as_ref(), b"raw");
        assert!(form.file_name.is_none());
    }

    #[test]
    fn test_should_reject_body_without_closing_boundary() {
        let body = Bytes::from(
            "------stratus42\r\n\
             Content-Disposition: form-data; name=\"key\"\r\n\
             \r\n\
             value-with-no-end",
        );
        let err = parse_form(&body, BOUNDARY).unwrap_err();
        assert_eq!(err.code(), S3ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_should_parse_empty_form() {
        let body = Bytes::from("------stratus42--\r\n");
        let form = parse_form(&body, BOUNDARY).expect("parses");
        assert!(form.fields.is_empty());
        assert!(form.file.is_empty());
    }

    #[test]
    fn test_should_allow_crlf_inside_file_payload() {
        let body = form_body(&[("file", Some("a.bin"), None, "line1\r\nline2")]);
        let form = parse_form(&body, BOUNDARY).expect("parses");
        assert_eq!(form.file.as_ref(), b"line1\r\nline2");
    }
}

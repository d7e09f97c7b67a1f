//! Streaming HTTP/1.1 request parser (§4.2).
//!
//! A stateless pure function over a byte buffer: given however many bytes
//! have arrived so far, it reports "need more bytes" or a fully parsed
//! request. Header keys/values and the body are borrowed `&[u8]` views into
//! the caller's receive buffer — never copied, never retained beyond the
//! handler that calls [`parse`] (see SPEC_FULL.md's ownership note).

#[cfg(test)]
mod tests;

use crate::error::{Error, Result};

pub const HTTP_LINE_DELIM: &[u8] = b"\r\n";
pub const HTTP_HDR_END_DELIM: &[u8] = b"\r\n\r\n";
pub const HTTP_HDR_KV_DELIM: &[u8] = b": ";
pub const HTTP_PROTOCOL_ID: &str = "HTTP/1.1";

/// Headers beyond this count abort parsing with a malformed-request error.
pub const MAX_HEADERS: usize = 64;

/// Borrowed `(ptr, len)`-equivalent view into the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpRequest<'a> {
    pub method: &'a [u8],
    pub uri: &'a [u8],
    pub headers: Vec<(&'a [u8], &'a [u8])>,
    pub body: &'a [u8],
}

impl<'a> HttpRequest<'a> {
    pub fn header(&self, key: &str) -> Option<&'a [u8]> {
        self.headers
            .iter()
            .find(|(k, _)| match_exact(k, key.as_bytes()))
            .map(|(_, v)| *v)
    }
}

/// Result of attempting to parse the bytes received so far.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseOutcome<'a> {
    /// Not enough bytes yet. `declared_content_length` is known once headers
    /// are complete and a non-zero `Content-Length` header was found — the
    /// caller (the TCP server) uses it to decide how much to grow its
    /// receive buffer.
    Incomplete {
        declared_content_length: Option<usize>,
    },
    /// A complete request. `consumed` is the number of bytes from the start
    /// of the buffer that made up this request (headers + body).
    Complete {
        request: HttpRequest<'a>,
        consumed: usize,
    },
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Case-sensitive exact match, used for both header keys (§4.2's
/// "Content-Length located by case-sensitive match" note — flagged as a
/// compliance gap, not fixed, since HTTP requires case-insensitivity) and
/// for [`match_verb`].
fn match_exact(a: &[u8], b: &[u8]) -> bool {
    a == b
}

/// Prefix match over a URI — `http_match_uri`.
pub fn match_uri(uri: &[u8], target: &str) -> bool {
    uri.starts_with(target.as_bytes())
}

/// Exact, length-aware match — `http_match_verb`.
pub fn match_verb(s: &[u8], verb: &str) -> bool {
    match_exact(s, verb.as_bytes())
}

/// `http_get_var` — extract a URL query parameter.
///
/// `name=` must be located directly after `?` or `&`, and the match must
/// itself occur after a `?` in the URL (so `name` can't match inside the
/// path). Returns the number of bytes written, `0` if not found, or
/// `Error::Runtime` if `out` is too small.
pub fn get_var(url: &[u8], name: &str, out: &mut [u8]) -> Result<usize> {
    let name_bytes = name.as_bytes();
    if name_bytes.len() > url.len() {
        return Ok(0);
    }

    let question_mark = match find(url, b"?") {
        Some(p) => p,
        None => return Ok(0),
    };

    let mut pattern = Vec::with_capacity(name_bytes.len() + 1);
    pattern.extend_from_slice(name_bytes);
    pattern.push(b'=');

    let search_space = &url[question_mark..];
    let rel_start = match find(search_space, &pattern) {
        Some(p) => p,
        None => return Ok(0),
    };
    let start_pos = question_mark + rel_start;

    // Must be right after '?' or '&'.
    if start_pos - 1 != question_mark && url[start_pos - 1] != b'&' {
        return Ok(0);
    }

    let value_start = start_pos + pattern.len();
    let rest = &url[value_start..];
    let value_end = match find(rest, b"&") {
        Some(p) => value_start + p,
        None => url.len(),
    };

    let value = &url[value_start..value_end];
    if value.len() + 1 > out.len() {
        return Err(Error::Runtime("output buffer too small".into()));
    }
    out[..value.len()].copy_from_slice(value);
    Ok(value.len())
}

fn parse_content_length(value: &[u8]) -> Result<usize> {
    let s = std::str::from_utf8(value).map_err(|_| Error::Runtime("bad Content-Length".into()))?;
    s.trim()
        .parse::<usize>()
        .map_err(|_| Error::Runtime("bad Content-Length".into()))
}

/// Parse an HTTP/1.1 request from `buf`, the bytes received so far.
pub fn parse(buf: &[u8]) -> Result<ParseOutcome<'_>> {
    let headers_end = match find(buf, HTTP_HDR_END_DELIM) {
        None => return Ok(ParseOutcome::Incomplete {
            declared_content_length: None,
        }),
        Some(p) => p + HTTP_HDR_END_DELIM.len(),
    };

    let header_block = &buf[..headers_end];

    let method_end = find(header_block, b" ")
        .ok_or_else(|| Error::Runtime("malformed request line".into()))?;
    let method = &header_block[..method_end];

    let rest = &header_block[method_end + 1..];
    let uri_end =
        find(rest, b" ").ok_or_else(|| Error::Runtime("malformed request line".into()))?;
    let uri = &rest[..uri_end];

    let rest = &rest[uri_end + 1..];
    let line_end =
        find(rest, HTTP_LINE_DELIM).ok_or_else(|| Error::Runtime("malformed request line".into()))?;
    let protocol = &rest[..line_end];
    if !match_verb(protocol, HTTP_PROTOCOL_ID) {
        // Spec §4.2: non-HTTP/1.1 is rejected by treating it as incomplete.
        return Ok(ParseOutcome::Incomplete {
            declared_content_length: None,
        });
    }

    let mut cursor = &rest[line_end + HTTP_LINE_DELIM.len()..];
    let mut headers = Vec::new();
    loop {
        if cursor.starts_with(HTTP_LINE_DELIM) {
            cursor = &cursor[HTTP_LINE_DELIM.len()..];
            break;
        }
        if headers.len() >= MAX_HEADERS {
            return Err(Error::Runtime("too many headers".into()));
        }
        let kv_end = find(cursor, HTTP_HDR_KV_DELIM)
            .ok_or_else(|| Error::Runtime("malformed header".into()))?;
        let key = &cursor[..kv_end];
        let after_key = &cursor[kv_end + HTTP_HDR_KV_DELIM.len()..];
        let value_end = find(after_key, HTTP_LINE_DELIM)
            .ok_or_else(|| Error::Runtime("malformed header".into()))?;
        let value = &after_key[..value_end];
        headers.push((key, value));
        cursor = &after_key[value_end + HTTP_LINE_DELIM.len()..];
    }

    debug_assert_eq!(cursor.as_ptr(), buf[headers_end..].as_ptr());

    let content_length_header = headers
        .iter()
        .find(|(k, _)| match_exact(k, b"Content-Length"))
        .map(|(_, v)| *v);

    let content_length = match content_length_header {
        None => 0,
        Some(v) if match_verb(v, "0") => 0,
        Some(v) => parse_content_length(v)?,
    };

    let body_received = buf.len() - headers_end;
    if body_received < content_length {
        return Ok(ParseOutcome::Incomplete {
            declared_content_length: Some(content_length),
        });
    }

    let body = &buf[headers_end..headers_end + content_length];
    let request = HttpRequest {
        method,
        uri,
        headers,
        body,
    };
    Ok(ParseOutcome::Complete {
        request,
        consumed: headers_end + content_length,
    })
}

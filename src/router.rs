//! Request router (§4.4) — maps a parsed [`HttpRequest`] onto a `Store`
//! operation and formats the raw HTTP/1.1 response bytes.
//!
//! Every branch locks the single store mutex for the shortest span that
//! correctness allows; the lock is never held across codec work it doesn't
//! need (e.g. `insert`'s JPEG decode happens before anything is appended, but
//! still inside the lock since `Store` serializes all mutation, §5).

use crate::error::Error;
use crate::header::resolution_from_str;
use crate::http::{get_var, match_uri, HttpRequest};
use crate::net;
use crate::store::{ListMode, Store};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// URI-to-operation dispatch (§4.4). The top-level `/` route is matched with
/// [`match_uri`], not a verb matcher — the original's `http_match_verb(&msg->uri, "/")`
/// call is treated as a likely bug (spec Open Question #3) and not reproduced.
pub fn dispatch(request: &HttpRequest<'_>, store: &Arc<Mutex<Store>>, index_path: &Path) -> Vec<u8> {
    let uri = request.uri;

    if match_uri(uri, "/imgfs/list") {
        return handle_list(store);
    }
    if match_uri(uri, "/imgfs/read") {
        return handle_read(request, store);
    }
    if match_uri(uri, "/imgfs/insert") {
        return handle_insert(request, store);
    }
    if match_uri(uri, "/imgfs/delete") {
        return handle_delete(request, store);
    }
    if match_uri(uri, "/index.html") || uri == b"/" {
        return net::serve_file(index_path);
    }

    reply_error(&Error::InvalidCommand)
}

fn handle_list(store: &Arc<Mutex<Store>>) -> Vec<u8> {
    let guard = store.lock().unwrap();
    match guard.list(ListMode::Json) {
        Ok(Some(json)) => reply_ok("application/json", json.as_bytes()),
        Ok(None) => reply_ok("application/json", b"{}"),
        Err(e) => reply_error(&e),
    }
}

fn extract_var<'a>(uri: &'a [u8], name: &str, out: &'a mut [u8; 256]) -> Option<&'a str> {
    let n = get_var(uri, name, out).ok()?;
    if n == 0 {
        return None;
    }
    std::str::from_utf8(&out[..n]).ok()
}

fn handle_read(request: &HttpRequest<'_>, store: &Arc<Mutex<Store>>) -> Vec<u8> {
    let mut res_buf = [0u8; 256];
    let mut id_buf = [0u8; 256];

    let res = match extract_var(request.uri, "res", &mut res_buf) {
        Some(r) => r,
        None => return reply_error(&Error::NotEnoughArguments),
    };
    let img_id = match extract_var(request.uri, "img_id", &mut id_buf) {
        Some(id) => id.to_string(),
        None => return reply_error(&Error::NotEnoughArguments),
    };

    let resolution = match resolution_from_str(res) {
        Ok(r) => r,
        Err(e) => return reply_error(&e),
    };

    let mut guard = store.lock().unwrap();
    match guard.read(&img_id, resolution) {
        Ok(bytes) => reply_ok("image/jpeg", &bytes),
        Err(e) => reply_error(&e),
    }
}

fn handle_insert(request: &HttpRequest<'_>, store: &Arc<Mutex<Store>>) -> Vec<u8> {
    if request.method != b"POST" {
        return reply_error(&Error::InvalidCommand);
    }
    let mut name_buf = [0u8; 256];
    let img_id = match extract_var(request.uri, "name", &mut name_buf) {
        Some(id) => id.to_string(),
        None => return reply_error(&Error::NotEnoughArguments),
    };

    let mut guard = store.lock().unwrap();
    match guard.insert(request.body, &img_id) {
        Ok(()) => reply_302("/index.html"),
        Err(e) => reply_error(&e),
    }
}

fn handle_delete(request: &HttpRequest<'_>, store: &Arc<Mutex<Store>>) -> Vec<u8> {
    let mut id_buf = [0u8; 256];
    let img_id = match extract_var(request.uri, "img_id", &mut id_buf) {
        Some(id) => id.to_string(),
        None => return reply_error(&Error::NotEnoughArguments),
    };

    let mut guard = store.lock().unwrap();
    match guard.delete(&img_id) {
        Ok(()) => reply_302("/index.html"),
        Err(e) => reply_error(&e),
    }
}

fn reply_ok(content_type: &str, body: &[u8]) -> Vec<u8> {
    format_response("200 OK", content_type, body)
}

fn reply_302(location: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"HTTP/1.1 302 Found\r\n");
    out.extend_from_slice(format!("Location: {}\r\n", location).as_bytes());
    out.extend_from_slice(b"Content-Length: 0\r\n\r\n");
    out
}

/// §4.4: every `Error` becomes a single canonical `500` body, `Error: <msg>`.
fn reply_error(err: &Error) -> Vec<u8> {
    let body = format!("Error: {}\n", err.short_message());
    format_response("500 Internal Server Error", "text/plain", body.as_bytes())
}

fn format_response(status: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 128);
    out.extend_from_slice(format!("HTTP/1.1 {}\r\n", status).as_bytes());
    out.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
    out.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
    out.extend_from_slice(b"Connection: keep-alive\r\n");
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::NamedTempFile;

    fn test_index() -> &'static Path {
        Path::new("static/index.html")
    }

    fn fresh_store() -> (Arc<Mutex<Store>>, NamedTempFile) {
        let file = NamedTempFile::new().unwrap();
        let store = Store::create(file.path(), 4, [64, 64, 128, 128]).unwrap();
        (Arc::new(Mutex::new(store)), file)
    }

    fn parse_status(resp: &[u8]) -> &str {
        let line_end = resp.windows(2).position(|w| w == b"\r\n").unwrap();
        std::str::from_utf8(&resp[..line_end]).unwrap()
    }

    #[test]
    fn list_on_empty_store_is_ok() {
        let (store, _f) = fresh_store();
        let req = HttpRequest {
            method: b"GET",
            uri: b"/imgfs/list",
            headers: vec![],
            body: b"",
        };
        let resp = dispatch(&req, &store, test_index());
        assert_eq!(parse_status(&resp), "HTTP/1.1 200 OK");
    }

    #[test]
    fn unknown_route_is_500() {
        let (store, _f) = fresh_store();
        let req = HttpRequest {
            method: b"GET",
            uri: b"/nope",
            headers: vec![],
            body: b"",
        };
        let resp = dispatch(&req, &store, test_index());
        assert_eq!(parse_status(&resp), "HTTP/1.1 500 Internal Server Error");
    }

    #[test]
    fn read_missing_image_is_500() {
        let (store, _f) = fresh_store();
        let req = HttpRequest {
            method: b"GET",
            uri: b"/imgfs/read?res=thumb&img_id=ghost",
            headers: vec![],
            body: b"",
        };
        let resp = dispatch(&req, &store, test_index());
        assert_eq!(parse_status(&resp), "HTTP/1.1 500 Internal Server Error");
    }

    #[test]
    fn delete_without_img_id_is_500() {
        let (store, _f) = fresh_store();
        let req = HttpRequest {
            method: b"GET",
            uri: b"/imgfs/delete",
            headers: vec![],
            body: b"",
        };
        let resp = dispatch(&req, &store, test_index());
        assert_eq!(parse_status(&resp), "HTTP/1.1 500 Internal Server Error");
    }
}

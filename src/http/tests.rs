use super::*;

fn get_request(extra_headers: &str, body: &str) -> Vec<u8> {
    format!(
        "GET /imgfs/read?res=thumb&img_id=pic1 HTTP/1.1\r\n\
         Host: localhost\r\n\
         {extra}Content-Length: {len}\r\n\r\n{body}",
        extra = extra_headers,
        len = body.len(),
        body = body
    )
    .into_bytes()
}

#[test]
fn incomplete_without_header_terminator() {
    let buf = b"GET / HTTP/1.1\r\nHost: x\r\n";
    let outcome = parse(buf).unwrap();
    assert_eq!(
        outcome,
        ParseOutcome::Incomplete {
            declared_content_length: None
        }
    );
}

#[test]
fn complete_request_no_body() {
    let buf = b"GET /imgfs/list HTTP/1.1\r\nHost: localhost\r\n\r\n";
    match parse(buf).unwrap() {
        ParseOutcome::Complete { request, consumed } => {
            assert_eq!(request.method, b"GET");
            assert_eq!(request.uri, b"/imgfs/list");
            assert_eq!(consumed, buf.len());
            assert_eq!(request.header("Host"), Some(&b"localhost"[..]));
        }
        other => panic!("expected Complete, got {:?}", other),
    }
}

#[test]
fn incomplete_body_reports_declared_length() {
    let full = get_request("", "hello-body");
    let partial = &full[..full.len() - 5];
    match parse(partial).unwrap() {
        ParseOutcome::Incomplete {
            declared_content_length,
        } => assert_eq!(declared_content_length, Some(10)),
        other => panic!("expected Incomplete, got {:?}", other),
    }
}

#[test]
fn split_point_round_trip() {
    let full = get_request("X-Extra: yes\r\n", "0123456789");
    for k in 0..full.len() {
        match parse(&full[..k]).unwrap() {
            ParseOutcome::Complete { consumed, .. } => {
                // Only the exact full length (or beyond) may report Complete.
                assert!(k >= consumed);
            }
            ParseOutcome::Incomplete { .. } => {}
        }
    }
    match parse(&full).unwrap() {
        ParseOutcome::Complete { request, consumed } => {
            assert_eq!(consumed, full.len());
            assert_eq!(request.body, b"0123456789");
        }
        other => panic!("expected Complete, got {:?}", other),
    }
}

#[test]
fn two_requests_back_to_back_parses_only_first() {
    let first = get_request("", "abc");
    let second = b"GET /imgfs/list HTTP/1.1\r\nHost: localhost\r\n\r\n";
    let mut combined = first.clone();
    combined.extend_from_slice(second);

    match parse(&combined).unwrap() {
        ParseOutcome::Complete { request, consumed } => {
            assert_eq!(consumed, first.len());
            assert_eq!(request.body, b"abc");
            assert_eq!(&combined[consumed..], &second[..]);
        }
        other => panic!("expected Complete, got {:?}", other),
    }
}

#[test]
fn too_many_headers_is_malformed() {
    let mut raw = String::from("GET / HTTP/1.1\r\n");
    for i in 0..(MAX_HEADERS + 1) {
        raw.push_str(&format!("X-Header-{i}: v\r\n"));
    }
    raw.push_str("\r\n");
    let err = parse(raw.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::Runtime(_)));
}

#[test]
fn non_http11_protocol_is_incomplete_not_error() {
    let buf = b"GET / HTTP/1.0\r\nHost: x\r\n\r\n";
    let outcome = parse(buf).unwrap();
    assert_eq!(
        outcome,
        ParseOutcome::Incomplete {
            declared_content_length: None
        }
    );
}

#[test]
fn match_uri_is_prefix_match() {
    assert!(match_uri(b"/imgfs/read?res=thumb", "/imgfs/read"));
    assert!(!match_uri(b"/imgfs/list", "/imgfs/read"));
}

#[test]
fn get_var_extracts_value_between_delimiters() {
    let url = b"/imgfs/read?res=thumb&img_id=pic1";
    let mut out = [0u8; 64];
    let n = get_var(url, "res", &mut out).unwrap();
    assert_eq!(&out[..n], b"thumb");

    let n = get_var(url, "img_id", &mut out).unwrap();
    assert_eq!(&out[..n], b"pic1");
}

#[test]
fn get_var_does_not_match_inside_another_name() {
    let url = b"/imgfs/read?xres=thumb";
    let mut out = [0u8; 64];
    let n = get_var(url, "res", &mut out).unwrap();
    assert_eq!(n, 0);
}

#[test]
fn get_var_missing_returns_zero() {
    let url = b"/imgfs/read?res=thumb";
    let mut out = [0u8; 64];
    let n = get_var(url, "img_id", &mut out).unwrap();
    assert_eq!(n, 0);
}

#[test]
fn get_var_too_small_buffer_errors() {
    let url = b"/imgfs/read?res=thumbnail";
    let mut out = [0u8; 2];
    let err = get_var(url, "res", &mut out).unwrap_err();
    assert!(matches!(err, Error::Runtime(_)));
}

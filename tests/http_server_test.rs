use imgfs::{Server, Store};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;
use tempfile::NamedTempFile;

fn make_jpeg(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(w, h, |x, y| image::Rgb([x as u8, y as u8, 0]));
    let mut out = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut out);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, 90);
    image::DynamicImage::ImageRgb8(img)
        .write_with_encoder(encoder)
        .unwrap();
    out
}

fn spawn_server() -> (std::net::SocketAddr, NamedTempFile) {
    let tmp = NamedTempFile::new().unwrap();
    let store = Store::create(tmp.path(), 8, [64, 64, 128, 128]).unwrap();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let bind_addr = addr.to_string();
    thread::spawn(move || {
        let server = Server::bind(&bind_addr, store).unwrap();
        server.run().unwrap();
    });
    thread::sleep(Duration::from_millis(100));
    (addr, tmp)
}

fn read_response(stream: &mut TcpStream) -> (String, Vec<u8>) {
    let mut buf = vec![0u8; 65536];
    let mut filled = 0;
    loop {
        let n = stream.read(&mut buf[filled..]).unwrap();
        filled += n;
        let text_prefix = String::from_utf8_lossy(&buf[..filled]);
        if let Some(header_end) = text_prefix.find("\r\n\r\n") {
            let content_length = text_prefix
                .lines()
                .find_map(|l| l.strip_prefix("Content-Length: "))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            let body_start = header_end + 4;
            if filled >= body_start + content_length {
                let status_line = text_prefix.lines().next().unwrap().to_string();
                let body = buf[body_start..body_start + content_length].to_vec();
                return (status_line, body);
            }
        }
        if n == 0 {
            panic!("connection closed before full response arrived");
        }
    }
}

#[test]
fn two_pipelined_requests_on_one_connection() {
    let (addr, _tmp) = spawn_server();
    let mut stream = TcpStream::connect(addr).unwrap();

    let jpeg = make_jpeg(80, 60);
    let insert_req = format!(
        "POST /imgfs/insert?name=pic1 HTTP/1.1\r\nHost: x\r\nContent-Length: {}\r\n\r\n",
        jpeg.len()
    );
    let mut combined = insert_req.into_bytes();
    combined.extend_from_slice(&jpeg);
    combined.extend_from_slice(b"GET /imgfs/list HTTP/1.1\r\nHost: x\r\n\r\n");

    stream.write_all(&combined).unwrap();

    let (status1, _) = read_response(&mut stream);
    assert_eq!(status1, "HTTP/1.1 302 Found");

    let (status2, body2) = read_response(&mut stream);
    assert_eq!(status2, "HTTP/1.1 200 OK");
    assert!(String::from_utf8_lossy(&body2).contains("pic1"));
}

#[test]
fn index_route_serves_static_file() {
    let (addr, _tmp) = spawn_server();
    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n")
        .unwrap();
    let (status, body) = read_response(&mut stream);
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert!(String::from_utf8_lossy(&body).contains("imgfs"));
}

#[test]
fn read_over_http_returns_jpeg_bytes() {
    let (addr, _tmp) = spawn_server();
    let mut stream = TcpStream::connect(addr).unwrap();

    let jpeg = make_jpeg(64, 64);
    let insert_req = format!(
        "POST /imgfs/insert?name=pic1 HTTP/1.1\r\nHost: x\r\nContent-Length: {}\r\n\r\n",
        jpeg.len()
    );
    let mut combined = insert_req.into_bytes();
    combined.extend_from_slice(&jpeg);
    stream.write_all(&combined).unwrap();
    let (status, _) = read_response(&mut stream);
    assert_eq!(status, "HTTP/1.1 302 Found");

    let mut stream2 = TcpStream::connect(addr).unwrap();
    stream2
        .write_all(b"GET /imgfs/read?res=original&img_id=pic1 HTTP/1.1\r\nHost: x\r\n\r\n")
        .unwrap();
    let (status, body) = read_response(&mut stream2);
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(body, jpeg);
}

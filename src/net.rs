//! TCP server — passive socket, accept loop, one detached thread per
//! connection (§5). Each worker masks `SIGINT`/`SIGTERM` so only the main
//! thread ever observes them, matching the original's
//! `pthread_sigmask(SIG_BLOCK, ...)` call at the top of `handle_connection`.

use crate::error::{Error, Result};
use crate::http::{self, ParseOutcome};
use crate::router;
use crate::store::Store;
use nix::sys::signal::{self, SigHandler, SigSet, SigmaskHow, Signal};
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Initial receive buffer size — grown once per connection if a declared
/// `Content-Length` would overflow it (the original's `MAX_HEADER_SIZE`).
pub const MAX_HEADER_SIZE: usize = 8192;

/// Static index page served at `/` and `/index.html` when no other path is
/// configured (`BASE_FILE` in the original).
pub const DEFAULT_INDEX_FILE: &str = "static/index.html";

/// `http_serve_file` — read a file fully into memory and reply `200 OK`
/// with `Content-Type: text/html; charset=utf-8`. A missing file replies
/// `404 Not Found` with an empty body rather than failing the connection.
pub fn serve_file(path: &Path) -> Vec<u8> {
    match std::fs::read(path) {
        Ok(body) => {
            let mut out = Vec::with_capacity(body.len() + 128);
            out.extend_from_slice(b"HTTP/1.1 200 OK\r\n");
            out.extend_from_slice(b"Content-Type: text/html; charset=utf-8\r\n");
            out.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
            out.extend_from_slice(b"Connection: keep-alive\r\n\r\n");
            out.extend_from_slice(&body);
            out
        }
        Err(e) => {
            log::warn!("serve_file(): failed to read {}: {}", path.display(), e);
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n".to_vec()
        }
    }
}

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn request_shutdown(_signum: i32) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

pub struct Server {
    listener: TcpListener,
    store: Arc<Mutex<Store>>,
    index_path: Arc<PathBuf>,
}

impl Server {
    /// Bind the passive socket and install the main-thread `SIGINT`/
    /// `SIGTERM` handler that lets [`Server::run`]'s accept loop stop
    /// cleanly (the original's `server_startup`/`server_shutdown` pairing).
    /// `std::net::TcpListener` has no explicit `listen(sock, 20)` backlog
    /// knob the way the original's raw socket call does — the OS default
    /// backlog is used instead (see DESIGN.md).
    pub fn bind(addr: &str, store: Store) -> Result<Self> {
        Self::bind_with_index(addr, store, DEFAULT_INDEX_FILE)
    }

    /// Same as [`Server::bind`] but with an explicit path to the static
    /// index page served at `/` and `/index.html` (`BASE_FILE`).
    pub fn bind_with_index<P: AsRef<Path>>(addr: &str, store: Store, index_path: P) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        log::info!("imgfs server listening on {}", addr);

        // Safety: the handler only stores to an AtomicBool, which is
        // async-signal-safe.
        unsafe {
            signal::signal(Signal::SIGINT, SigHandler::Handler(request_shutdown))
                .map_err(|e| Error::Threading(e.to_string()))?;
            signal::signal(Signal::SIGTERM, SigHandler::Handler(request_shutdown))
                .map_err(|e| Error::Threading(e.to_string()))?;
        }

        Ok(Self {
            listener,
            store: Arc::new(Mutex::new(store)),
            index_path: Arc::new(index_path.as_ref().to_path_buf()),
        })
    }

    /// Accept connections until `SIGINT`/`SIGTERM` is observed. Each
    /// connection is handled on its own detached thread, which immediately
    /// masks those same signals so only this thread ever sees them.
    pub fn run(&self) -> Result<()> {
        while !SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, _peer)) => {
                    stream.set_nonblocking(false)?;
                    let store = Arc::clone(&self.store);
                    let index_path = Arc::clone(&self.index_path);
                    thread::spawn(move || {
                        if let Err(e) = handle_connection(stream, store, index_path) {
                            log::warn!("connection handler exited: {}", e);
                        }
                    });
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(20));
                }
                Err(e) => {
                    log::warn!("accept failed: {}", e);
                }
            }
        }
        log::info!("shutdown signal received, accept loop stopping");
        Ok(())
    }

    /// Release the store, closing the backing file. Only meaningful once the
    /// accept loop has stopped and no worker threads can still reach it.
    pub fn close(self) -> Result<()> {
        let store = Arc::try_unwrap(self.store)
            .map_err(|_| Error::Threading("store still referenced by a worker".into()))?
            .into_inner()
            .map_err(|_| Error::Threading("store mutex poisoned".into()))?;
        store.close()
    }
}

fn mask_termination_signals() {
    let mut set = SigSet::empty();
    set.add(Signal::SIGINT);
    set.add(Signal::SIGTERM);
    if let Err(e) = signal::sigprocmask(SigmaskHow::SIG_BLOCK, Some(&set), None) {
        log::warn!("failed to mask signals in worker thread: {}", e);
    }
}

/// Read, parse and dispatch requests on one connection until it closes or a
/// malformed request is seen. Supports HTTP pipelining: a second request
/// already buffered after the first is handled without another `read`.
fn handle_connection(
    mut stream: TcpStream,
    store: Arc<Mutex<Store>>,
    index_path: Arc<PathBuf>,
) -> Result<()> {
    mask_termination_signals();

    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "<unknown>".into());
    log::debug!("accepted connection from {}", peer);

    let mut buf = vec![0u8; MAX_HEADER_SIZE];
    let mut filled = 0usize;
    let mut grown = false;

    loop {
        let outcome = http::parse(&buf[..filled]).map_err(|e| {
            log::warn!("malformed request from {}: {}", peer, e);
            e
        });

        match outcome {
            Ok(ParseOutcome::Complete { request, consumed }) => {
                let response = router::dispatch(&request, &store, &index_path);
                stream.write_all(&response)?;
                buf.copy_within(consumed..filled, 0);
                filled -= consumed;
                grown = false;
                continue;
            }
            Ok(ParseOutcome::Incomplete {
                declared_content_length,
            }) => {
                if let Some(content_len) = declared_content_length {
                    let needed = MAX_HEADER_SIZE + content_len;
                    if !grown && buf.len() < needed {
                        buf.resize(needed, 0);
                        grown = true;
                    }
                }
            }
            Err(e) => {
                let body = format!("Error: {}\n", e);
                let response = format!(
                    "HTTP/1.1 500 Internal Server Error\r\n\
                     Content-Type: text/plain\r\n\
                     Content-Length: {}\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
                return Ok(());
            }
        }

        if filled == buf.len() {
            log::warn!("request from {} exceeds buffer capacity, closing", peer);
            return Ok(());
        }

        let n = stream.read(&mut buf[filled..])?;
        if n == 0 {
            log::debug!("connection from {} closed", peer);
            return Ok(());
        }
        filled += n;
    }
}

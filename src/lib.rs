//! # imgfs — single-file content-addressed JPEG store
//!
//! Format guarantees:
//! - Header and metadata-slot fields are fixed-layout, little-endian
//! - Content is deduplicated by SHA-256: two valid slots sharing a hash
//!   share a bit-identical `(offset, size)` triple across all resolutions
//! - `thumbnail`/`small` variants are materialized lazily, on first `read`
//! - All mutation is serialized through one `Store` behind a single mutex;
//!   there is no partial-write recovery beyond the monotonic version counter

pub mod codec;
pub mod error;
pub mod header;
pub mod http;
pub mod metadata;
pub mod net;
pub mod router;
pub mod store;

pub use error::{Error, ExitCode, Result};
pub use header::{Header, HEADER_SIZE, NB_RES, ORIG_RES, SMALL_RES, THUMB_RES};
pub use metadata::{Metadata, MAX_IMG_ID};
pub use net::Server;
pub use store::{ListMode, Store};

/// Default listening port (`DEFAULT_LISTENING_PORT` in the original).
pub const DEFAULT_LISTENING_PORT: u16 = 8000;
/// Minimum accepted port for a CLI/env override (`STARTING_VALID_PORT`).
pub const STARTING_VALID_PORT: u16 = 1024;

pub const DEFAULT_MAX_FILES: u32 = 128;
pub const DEFAULT_THUMB_RES: (u16, u16) = (64, 64);
pub const MAX_THUMB_RES: (u16, u16) = (128, 128);
pub const DEFAULT_SMALL_RES: (u16, u16) = (256, 256);
pub const MAX_SMALL_RES: (u16, u16) = (512, 512);

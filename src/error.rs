//! Error taxonomy — one discriminated result type for every layer.
//!
//! Mirrors the fixed integer kinds of the original C implementation so CLI
//! exit codes and HTTP error replies stay stable across the port. Ordering is
//! semantic only; it is not part of any on-disk or wire format.

use std::fmt;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid argument")]
    InvalidArgument,
    #[error("out of memory")]
    OutOfMemory,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("threading error: {0}")]
    Threading(String),
    #[error("image library error: {0}")]
    ImgLib(String),
    #[error("invalid command")]
    InvalidCommand,
    #[error("not enough arguments")]
    NotEnoughArguments,
    #[error("max files reached")]
    MaxFiles,
    #[error("invalid resolution")]
    Resolutions,
    #[error("invalid image id")]
    InvalidImgId,
    #[error("image not found")]
    ImageNotFound,
    #[error("duplicate id")]
    DuplicateId,
    #[error("imgfs is full")]
    ImgfsFull,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Numeric code preserved from the original taxonomy (§6.4). Order is
    /// semantic only — never serialized, never compared across versions.
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidArgument => 1,
            Error::OutOfMemory => 2,
            Error::Io(_) => 3,
            Error::Runtime(_) => 4,
            Error::Threading(_) => 5,
            Error::ImgLib(_) => 6,
            Error::InvalidCommand => 7,
            Error::NotEnoughArguments => 8,
            Error::MaxFiles => 9,
            Error::Resolutions => 10,
            Error::InvalidImgId => 11,
            Error::ImageNotFound => 12,
            Error::DuplicateId => 13,
            Error::ImgfsFull => 14,
        }
    }

    /// Short message used both in the CLI's `ERROR: ...` line and the
    /// router's `Error: ...` HTTP body (§4.4).
    pub fn short_message(&self) -> String {
        self.to_string()
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::ImgLib(e.to_string())
    }
}

/// Wrapper so `Error::code()` can be used as a process exit code directly.
pub struct ExitCode(pub i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&Error> for ExitCode {
    fn from(e: &Error) -> Self {
        ExitCode(e.code())
    }
}

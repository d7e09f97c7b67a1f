//! On-disk header — fixed layout at byte 0 of every ImgFS file.
//!
//! # On-disk layout (64 bytes, all numeric fields little-endian)
//!
//! ```text
//! Offset  Size  Field
//!    0     32   name         NUL-padded label, set at creation
//!   32      4   version      monotonic mutation counter
//!   36      4   nb_files     count of NON_EMPTY slots
//!   40      4   max_files    slot table capacity, immutable
//!   44      8   resized_res  [thumb_w, thumb_h, small_w, small_h] (4x u16)
//!   52      4   unused_32    reserved, always 0
//!   56      8   unused_64    reserved, always 0
//! ```
//!
//! Endianness is little-endian, resolving spec Open Question #1 — the
//! original C source wrote this struct host-native via a single `fwrite`.

use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

pub const HEADER_SIZE: usize = 64;
pub const NAME_SIZE: usize = 32;

/// Fixed label stamped by `do_create`, regardless of any caller-supplied
/// template (see SPEC_FULL.md §3, Open Question resolution — not "fixed").
pub const DEFAULT_NAME: &str = "ImgFS2024";

pub const THUMB_RES: usize = 0;
pub const SMALL_RES: usize = 1;
pub const ORIG_RES: usize = 2;
pub const NB_RES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: [u8; NAME_SIZE],
    pub version: u32,
    pub nb_files: u32,
    pub max_files: u32,
    /// `[thumb_w, thumb_h, small_w, small_h]`
    pub resized_res: [u16; 4],
}

impl Header {
    pub fn new(max_files: u32, resized_res: [u16; 4]) -> Self {
        let mut name = [0u8; NAME_SIZE];
        let bytes = DEFAULT_NAME.as_bytes();
        let n = bytes.len().min(NAME_SIZE - 1);
        name[..n].copy_from_slice(&bytes[..n]);
        Self {
            name,
            version: 0,
            nb_files: 0,
            max_files,
            resized_res,
        }
    }

    pub fn name_str(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_SIZE);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    pub fn write<W: Write>(&self, mut w: W) -> Result<()> {
        w.write_all(&self.name)?;
        w.write_u32::<LittleEndian>(self.version)?;
        w.write_u32::<LittleEndian>(self.nb_files)?;
        w.write_u32::<LittleEndian>(self.max_files)?;
        for r in &self.resized_res {
            w.write_u16::<LittleEndian>(*r)?;
        }
        w.write_u32::<LittleEndian>(0)?; // unused_32
        w.write_u64::<LittleEndian>(0)?; // unused_64
        Ok(())
    }

    pub fn read<R: Read>(mut r: R) -> Result<Self> {
        let mut name = [0u8; NAME_SIZE];
        r.read_exact(&mut name)?;
        let version = r.read_u32::<LittleEndian>()?;
        let nb_files = r.read_u32::<LittleEndian>()?;
        let max_files = r.read_u32::<LittleEndian>()?;
        let mut resized_res = [0u16; 4];
        for slot in &mut resized_res {
            *slot = r.read_u16::<LittleEndian>()?;
        }
        let _unused_32 = r.read_u32::<LittleEndian>()?;
        let _unused_64 = r.read_u64::<LittleEndian>()?;
        Ok(Self {
            name,
            version,
            nb_files,
            max_files,
            resized_res,
        })
    }

    pub fn print(&self) {
        println!("ImgFS Header: {}", self.name_str());
        println!(
            "\tversion: {}\tnb_files: {}/{}\n\tresized_res: thumb {}x{}, small {}x{}",
            self.version,
            self.nb_files,
            self.max_files,
            self.resized_res[0],
            self.resized_res[1],
            self.resized_res[2],
            self.resized_res[3],
        );
    }
}

/// Resolve a CLI/HTTP `res` string to a resolution index.
pub fn resolution_from_str(s: &str) -> Result<usize> {
    match s {
        "thumbnail" | "thumb" => Ok(THUMB_RES),
        "small" => Ok(SMALL_RES),
        "original" | "orig" => Ok(ORIG_RES),
        _ => Err(Error::Resolutions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    proptest! {
        #[test]
        fn write_read_round_trip(
            max_files in any::<u32>(),
            version in any::<u32>(),
            nb_files in any::<u32>(),
            resized_res in prop::array::uniform4(any::<u16>()),
        ) {
            let mut header = Header::new(max_files, resized_res);
            header.version = version;
            header.nb_files = nb_files;

            let mut buf = Vec::new();
            header.write(&mut buf).unwrap();
            prop_assert_eq!(buf.len(), HEADER_SIZE);

            let decoded = Header::read(Cursor::new(&buf)).unwrap();
            prop_assert_eq!(decoded, header);
        }
    }

    #[test]
    fn name_defaults_to_fixed_label() {
        let header = Header::new(128, [64, 64, 256, 256]);
        assert_eq!(header.name_str(), DEFAULT_NAME);
    }

    #[test]
    fn resolution_from_str_accepts_all_aliases() {
        assert_eq!(resolution_from_str("thumbnail").unwrap(), THUMB_RES);
        assert_eq!(resolution_from_str("thumb").unwrap(), THUMB_RES);
        assert_eq!(resolution_from_str("small").unwrap(), SMALL_RES);
        assert_eq!(resolution_from_str("original").unwrap(), ORIG_RES);
        assert_eq!(resolution_from_str("orig").unwrap(), ORIG_RES);
        assert!(resolution_from_str("bogus").is_err());
    }
}

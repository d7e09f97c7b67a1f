//! Metadata slot — fixed-size record, `max_files` of them directly after
//! the header.
//!
//! # On-disk layout (208 bytes, all numeric fields little-endian)
//!
//! ```text
//! Offset  Size  Field
//!    0    128   img_id    NUL-terminated, capacity MAX_IMG_ID+1
//!  128     32   SHA       SHA-256 of the original image bytes
//!  160      8   orig_res  [width, height] (2x u32)
//!  168     12   size      [thumb, small, orig] byte lengths (3x u32)
//!  180     24   offset    [thumb, small, orig] absolute offsets (3x u64)
//!  204      2   is_valid  EMPTY=0 / NON_EMPTY=1
//!  206      2   reserved  always 0
//! ```

use crate::error::Result;
use crate::header::{NB_RES, ORIG_RES};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Largest accepted `img_id` length, excluding the NUL terminator.
pub const MAX_IMG_ID: usize = 127;
const IMG_ID_STORAGE: usize = MAX_IMG_ID + 1;
pub const SHA256_LEN: usize = 32;

pub const EMPTY: u16 = 0;
pub const NON_EMPTY: u16 = 1;

pub const METADATA_SIZE: usize = IMG_ID_STORAGE + SHA256_LEN + 8 + 12 + 24 + 2 + 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub img_id: [u8; IMG_ID_STORAGE],
    pub sha: [u8; SHA256_LEN],
    pub orig_res: [u32; 2],
    pub size: [u32; NB_RES],
    pub offset: [u64; NB_RES],
    pub is_valid: u16,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            img_id: [0u8; IMG_ID_STORAGE],
            sha: [0u8; SHA256_LEN],
            orig_res: [0; 2],
            size: [0; NB_RES],
            offset: [0; NB_RES],
            is_valid: EMPTY,
        }
    }
}

impl Metadata {
    pub fn is_valid(&self) -> bool {
        self.is_valid == NON_EMPTY
    }

    pub fn img_id_str(&self) -> String {
        let end = self.img_id.iter().position(|&b| b == 0).unwrap_or(IMG_ID_STORAGE);
        String::from_utf8_lossy(&self.img_id[..end]).into_owned()
    }

    pub fn set_img_id(&mut self, id: &str) -> Result<()> {
        let bytes = id.as_bytes();
        if bytes.is_empty() || bytes.len() > MAX_IMG_ID {
            return Err(crate::error::Error::InvalidImgId);
        }
        self.img_id = [0u8; IMG_ID_STORAGE];
        self.img_id[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    pub fn write<W: Write>(&self, mut w: W) -> Result<()> {
        w.write_all(&self.img_id)?;
        w.write_all(&self.sha)?;
        for v in &self.orig_res {
            w.write_u32::<LittleEndian>(*v)?;
        }
        for v in &self.size {
            w.write_u32::<LittleEndian>(*v)?;
        }
        for v in &self.offset {
            w.write_u64::<LittleEndian>(*v)?;
        }
        w.write_u16::<LittleEndian>(self.is_valid)?;
        w.write_u16::<LittleEndian>(0)?; // reserved
        Ok(())
    }

    pub fn read<R: Read>(mut r: R) -> Result<Self> {
        let mut img_id = [0u8; IMG_ID_STORAGE];
        r.read_exact(&mut img_id)?;
        let mut sha = [0u8; SHA256_LEN];
        r.read_exact(&mut sha)?;
        let mut orig_res = [0u32; 2];
        for slot in &mut orig_res {
            *slot = r.read_u32::<LittleEndian>()?;
        }
        let mut size = [0u32; NB_RES];
        for slot in &mut size {
            *slot = r.read_u32::<LittleEndian>()?;
        }
        let mut offset = [0u64; NB_RES];
        for slot in &mut offset {
            *slot = r.read_u64::<LittleEndian>()?;
        }
        let is_valid = r.read_u16::<LittleEndian>()?;
        let _reserved = r.read_u16::<LittleEndian>()?;
        Ok(Self {
            img_id,
            sha,
            orig_res,
            size,
            offset,
            is_valid,
        })
    }

    pub fn print(&self, index: usize) {
        println!(
            "{:3} | {:32} | {} | {:4}x{:4} | {:?} | {:?}",
            index,
            self.img_id_str(),
            hex::encode(self.sha),
            self.orig_res[0],
            self.orig_res[1],
            self.size,
            self.offset,
        );
    }

    pub fn has_resolution(&self, resolution: usize) -> bool {
        self.size[resolution] != 0 && self.offset[resolution] != 0
    }

    pub fn has_original(&self) -> bool {
        self.has_resolution(ORIG_RES)
    }
}

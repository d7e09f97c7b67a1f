//! Store engine — CRUD over a single ImgFS file (§4.1).
//!
//! [`Store`] owns the backing file handle and the in-memory metadata table.
//! Every mutating operation flushes the affected header and/or slot before
//! returning, per the spec's durability contract. There is no write-ahead
//! log and no fsync beyond what the OS does on `write_all` — crash
//! consistency is explicitly out of scope (§1 Non-goals).

mod ops;

use crate::error::{Error, Result};
use crate::header::{Header, HEADER_SIZE};
use crate::metadata::{Metadata, METADATA_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub use ops::ListMode;

/// An open ImgFS store: file handle + header + metadata table in memory.
pub struct Store {
    pub(crate) file: File,
    pub(crate) path: PathBuf,
    pub header: Header,
    pub(crate) metadata: Vec<Metadata>,
}

impl Store {
    /// Open an existing ImgFS file, reading the header and the full
    /// metadata table into memory. Fails with `Error::Io` on any short read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let header = Header::read(&mut file)?;

        let mut metadata = Vec::with_capacity(header.max_files as usize);
        for _ in 0..header.max_files {
            metadata.push(Metadata::read(&mut file)?);
        }

        Ok(Self {
            file,
            path,
            header,
            metadata,
        })
    }

    /// Create a new ImgFS file: write a fresh header and a zeroed metadata
    /// table, then open it for further mutation.
    ///
    /// `name` is accepted for API symmetry with the original but is
    /// currently ignored — `do_create` always stamps the fixed store label
    /// (see SPEC_FULL.md §3, Open Question resolution).
    pub fn create<P: AsRef<Path>>(
        path: P,
        max_files: u32,
        resized_res: [u16; 4],
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let header = Header::new(max_files, resized_res);
        let metadata: Vec<Metadata> = (0..max_files).map(|_| Metadata::default()).collect();

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        header.write(&mut file)?;
        for slot in &metadata {
            slot.write(&mut file)?;
        }
        file.flush()?;

        log::info!(
            "created imgfs store at {} (max_files={})",
            path.display(),
            max_files
        );

        Ok(Self {
            file,
            path,
            header,
            metadata,
        })
    }

    /// Release the file handle. Idempotent in the sense that a `Store` can
    /// only be closed once — ownership is consumed, so a second call is not
    /// expressible (the original's C `do_close` was a no-op on an
    /// already-closed handle; Rust's move semantics make that state
    /// unreachable instead of merely tolerated).
    pub fn close(self) -> Result<()> {
        log::debug!("closing imgfs store at {}", self.path.display());
        drop(self);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn slot_offset(&self, index: usize) -> u64 {
        HEADER_SIZE as u64 + (index * METADATA_SIZE) as u64
    }

    pub(crate) fn write_header(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.header.write(&mut self.file)?;
        Ok(())
    }

    pub(crate) fn write_slot(&mut self, index: usize) -> Result<()> {
        let offset = self.slot_offset(index);
        self.file.seek(SeekFrom::Start(offset))?;
        self.metadata[index].write(&mut self.file)?;
        Ok(())
    }

    pub(crate) fn read_blob(&mut self, offset: u64, size: u32) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; size as usize];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub(crate) fn append_blob(&mut self, data: &[u8]) -> Result<u64> {
        let offset = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(data)?;
        Ok(offset)
    }

    pub(crate) fn find_by_img_id(&self, img_id: &str) -> Option<usize> {
        self.metadata
            .iter()
            .position(|m| m.is_valid() && m.img_id_str() == img_id)
    }

    fn find_empty_slot(&self) -> Result<usize> {
        self.metadata
            .iter()
            .position(|m| !m.is_valid())
            .ok_or(Error::ImgfsFull)
    }

    pub(crate) fn allocate_slot(&self) -> Result<usize> {
        if self.header.nb_files >= self.header.max_files {
            return Err(Error::ImgfsFull);
        }
        self.find_empty_slot()
    }
}

//! Store operations: list, insert, delete, read, lazy resize, dedup (§4.1).

use super::Store;
use crate::codec;
use crate::error::{Error, Result};
use crate::header::{NB_RES, ORIG_RES};
use crate::metadata::{Metadata, EMPTY, NON_EMPTY, SHA256_LEN};
use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    Stdout,
    Json,
}

#[derive(Serialize)]
struct ImageList {
    #[serde(rename = "Images")]
    images: Vec<String>,
}

impl Store {
    /// `list(mode)` — `Stdout` prints header + every valid slot; `Json`
    /// returns `{"Images": [...]}` in slot-table order.
    pub fn list(&self, mode: ListMode) -> Result<Option<String>> {
        match mode {
            ListMode::Stdout => {
                self.header.print();
                if self.header.nb_files == 0 {
                    println!("<< empty imgFS >>");
                } else {
                    for (i, slot) in self.metadata.iter().enumerate() {
                        if slot.is_valid() {
                            slot.print(i);
                        }
                    }
                }
                Ok(None)
            }
            ListMode::Json => {
                let images = self
                    .metadata
                    .iter()
                    .filter(|m| m.is_valid())
                    .map(|m| m.img_id_str())
                    .collect();
                let json = serde_json::to_string(&ImageList { images })
                    .map_err(|e| Error::Runtime(e.to_string()))?;
                Ok(Some(json))
            }
        }
    }

    /// Insert a JPEG image under `img_id`, deduplicating by content hash.
    pub fn insert(&mut self, buffer: &[u8], img_id: &str) -> Result<()> {
        let index = self.allocate_slot()?;

        let mut slot = Metadata::default();
        slot.set_img_id(img_id)?;

        let mut hasher = Sha256::new();
        hasher.update(buffer);
        let digest = hasher.finalize();
        slot.sha.copy_from_slice(&digest[..SHA256_LEN]);

        let (width, height) = codec::dimensions(buffer)?;
        slot.orig_res = [width, height];

        self.dedup(&mut slot, index)?;

        if slot.offset[ORIG_RES] == 0 {
            let offset = self.append_blob(buffer)?;
            slot.offset = [0, 0, offset];
            slot.size = [0, 0, buffer.len() as u32];
        }

        slot.is_valid = NON_EMPTY;
        self.metadata[index] = slot;
        self.header.nb_files += 1;
        self.header.version += 1;

        self.write_header()?;
        self.write_slot(index)?;

        log::info!("inserted image '{}' at slot {}", img_id, index);
        Ok(())
    }

    /// Scan all other valid slots for an `img_id` collision (reject) or a
    /// `SHA` collision (alias the existing blob triple). No I/O happens
    /// here beyond what the caller already has in memory.
    fn dedup(&self, target: &mut Metadata, target_index: usize) -> Result<()> {
        for (i, existing) in self.metadata.iter().enumerate() {
            if i == target_index || !existing.is_valid() {
                continue;
            }
            if existing.img_id == target.img_id {
                return Err(Error::DuplicateId);
            }
            if existing.sha == target.sha {
                target.offset = existing.offset;
                target.size = existing.size;
                return Ok(());
            }
        }
        // No alias found: mark for fresh append in the caller.
        target.offset[ORIG_RES] = 0;
        Ok(())
    }

    /// Delete the slot matching `img_id`. Blob bytes are never reclaimed
    /// (§4.1 — simplicity over space); other slots aliasing the same blobs
    /// remain valid.
    pub fn delete(&mut self, img_id: &str) -> Result<()> {
        let index = self.find_by_img_id(img_id).ok_or(Error::ImageNotFound)?;

        self.metadata[index].is_valid = EMPTY;
        self.write_slot(index)?;

        self.header.version += 1;
        self.header.nb_files -= 1;
        self.write_header()?;

        log::info!("deleted image '{}' (slot {})", img_id, index);
        Ok(())
    }

    /// Read `resolution` bytes for `img_id`, lazily materializing
    /// thumbnail/small variants on first access.
    pub fn read(&mut self, img_id: &str, resolution: usize) -> Result<Vec<u8>> {
        let index = self.find_by_img_id(img_id).ok_or(Error::ImageNotFound)?;

        if resolution != ORIG_RES && !self.metadata[index].has_resolution(resolution) {
            self.lazily_resize(resolution, index)?;
        }

        let slot = &self.metadata[index];
        let (offset, size) = (slot.offset[resolution], slot.size[resolution]);
        self.read_blob(offset, size)
    }

    /// Materialize a thumbnail/small variant for `slot_index`, appending
    /// the encoded bytes and rewriting only that slot. The header's
    /// `version` is **not** bumped (§4.1 note, §5 ordering guarantee).
    pub(crate) fn lazily_resize(&mut self, resolution: usize, slot_index: usize) -> Result<()> {
        if resolution >= NB_RES {
            return Err(Error::Resolutions);
        }
        let slot = self
            .metadata
            .get(slot_index)
            .ok_or(Error::InvalidImgId)?;
        if !slot.is_valid() {
            return Err(Error::InvalidImgId);
        }
        if resolution == ORIG_RES || slot.has_resolution(resolution) {
            return Ok(());
        }

        let orig_offset = slot.offset[ORIG_RES];
        let orig_size = slot.size[ORIG_RES];
        let target_w = self.header.resized_res[2 * resolution];
        let target_h = self.header.resized_res[2 * resolution + 1];

        let original = self.read_blob(orig_offset, orig_size)?;
        let resized = codec::thumbnail_jpeg(&original, target_w, target_h)?;

        let offset = self.append_blob(&resized)?;
        self.metadata[slot_index].offset[resolution] = offset;
        self.metadata[slot_index].size[resolution] = resized.len() as u32;
        self.write_slot(slot_index)?;

        log::debug!(
            "materialized resolution {} for slot {} ({} bytes)",
            resolution,
            slot_index,
            resized.len()
        );
        Ok(())
    }
}

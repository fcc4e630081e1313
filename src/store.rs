//! Attachment byte sources

use crate::error::{EvidenceError, Result};
use crate::types::AttachmentMeta;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Where attachment bytes come from
pub trait AttachmentStore {
    fn read(&self, meta: &AttachmentMeta) -> Result<Vec<u8>>;
}

/// Reads `storage_path` relative to a root directory. Absolute paths and
/// paths with `..` components are rejected.
#[derive(Debug, Clone)]
pub struct FsAttachmentStore {
    root: PathBuf,
}

impl FsAttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AttachmentStore for FsAttachmentStore {
    fn read(&self, meta: &AttachmentMeta) -> Result<Vec<u8>> {
        let relative = meta
            .storage_path
            .as_deref()
            .ok_or_else(|| EvidenceError::attachment(&meta.filename, "No storage path recorded"))?;

        if !is_contained(Path::new(relative)) {
            return Err(EvidenceError::attachment(
                &meta.filename,
                format!("Storage path escapes the store root: {relative}"),
            ));
        }

        let path = self.root.join(relative);
        if !path.is_file() {
            return Err(EvidenceError::attachment(
                &meta.filename,
                format!("Attachment file not found on disk: {}", path.display()),
            ));
        }

        Ok(std::fs::read(path)?)
    }
}

fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Attachment bytes held in memory, keyed by attachment id
#[derive(Debug, Clone, Default)]
pub struct MemoryAttachmentStore {
    blobs: HashMap<Uuid, Vec<u8>>,
}

impl MemoryAttachmentStore {
    pub fn insert(&mut self, id: Uuid, bytes: Vec<u8>) {
        self.blobs.insert(id, bytes);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl AttachmentStore for MemoryAttachmentStore {
    fn read(&self, meta: &AttachmentMeta) -> Result<Vec<u8>> {
        self.blobs
            .get(&meta.id)
            .cloned()
            .ok_or_else(|| EvidenceError::attachment(&meta.filename, "Attachment not found"))
    }
}

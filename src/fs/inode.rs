use serde::{Deserialize, Serialize};
use std::fmt;

use super::{block::pointer, BlockId, BlockKind, MAX_NAME_LEN};
use crate::utils::{
    self,
    time_util::Timestamp,
    traits::{BlockCodec, SerializeIntoBlock},
};
use crate::{FsError, Result};

/// a file name as stored in an inode: at most 8 bytes, NUL padded
#[derive(Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Default)]
pub struct FileName([u8; MAX_NAME_LEN + 1]);

impl FileName {
    pub fn new(name: &str) -> Result<Self> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > MAX_NAME_LEN || bytes.contains(&0) {
            return Err(FsError::InvalidName(name.to_string()));
        }
        let mut raw = [0u8; MAX_NAME_LEN + 1];
        raw[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8] {
        let len = self.0.iter().position(|b| *b == 0).unwrap_or(MAX_NAME_LEN);
        &self.0[..len]
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string())
    }
}

/// one file: its metadata and the head of its content chain
///
/// Inodes are linked through the header's `next` into the directory chain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    /// lives in the block header, not in the body
    #[serde(skip)]
    next: Option<BlockId>,
    pub name: FileName,
    /// bytes of live content
    pub size: u32,
    /// first data block, `None` exactly when `size == 0`
    #[serde(with = "pointer")]
    pub content_head: Option<BlockId>,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
    pub accessed_at: Timestamp,
    pub read_only: bool,
}

impl Inode {
    pub fn new(name: FileName, next: Option<BlockId>) -> Self {
        let now = utils::time_util::now();
        Inode {
            next,
            name,
            size: 0,
            content_head: None,
            created_at: now,
            modified_at: now,
            accessed_at: now,
            read_only: false,
        }
    }

    /// next inode of the directory chain
    pub fn next(&self) -> Option<BlockId> {
        self.next
    }

    pub fn set_next(&mut self, next: Option<BlockId>) {
        self.next = next;
    }
}

/// This block is about file metadata operations
impl Inode {
    pub fn update_modified_at(&mut self) {
        let now = utils::time_util::now();
        self.modified_at = now;
        self.accessed_at = now;
    }

    pub fn update_accessed_at(&mut self) {
        self.accessed_at = utils::time_util::now();
    }

    pub fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            Err(FsError::ReadOnly(self.name.to_string()))
        } else {
            Ok(())
        }
    }
}

impl SerializeIntoBlock for Inode {}

impl BlockCodec for Inode {
    const KIND: BlockKind = BlockKind::Inode;

    fn next(&self) -> Option<BlockId> {
        self.next
    }

    fn encode_body(&self, body: &mut [u8]) -> std::result::Result<(), String> {
        self.serialize_into(body).map(|_| ())
    }

    fn decode_body(next: Option<BlockId>, body: &[u8]) -> std::result::Result<Self, String> {
        let mut inode = Self::deserialize_from(body)?;
        inode.next = next;
        Ok(inode)
    }
}

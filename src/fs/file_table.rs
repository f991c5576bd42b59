use super::{BlockId, FileDescriptor};
use crate::{FsError, Result};

/// a live descriptor: which inode, and where the next byte is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFile {
    pub inode_block: BlockId,
    /// byte offset, may point past the end of the file
    pub cursor: u64,
}

/// fixed-capacity table of open files, a descriptor is an index into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTable {
    slots: Vec<Option<OpenFile>>,
}

impl FileTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn has_free_slot(&self) -> bool {
        self.slots.iter().any(Option::is_none)
    }

    /// the first free slot, starting with its cursor at 0
    pub fn allocate(&mut self, inode_block: BlockId) -> Result<FileDescriptor> {
        let fd = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(FsError::TooManyOpenFiles)?;
        self.slots[fd] = Some(OpenFile {
            inode_block,
            cursor: 0,
        });
        Ok(fd)
    }

    pub fn get(&self, fd: FileDescriptor) -> Result<&OpenFile> {
        self.slots
            .get(fd)
            .and_then(Option::as_ref)
            .ok_or(FsError::InvalidDescriptor(fd))
    }

    pub fn get_mut(&mut self, fd: FileDescriptor) -> Result<&mut OpenFile> {
        self.slots
            .get_mut(fd)
            .and_then(Option::as_mut)
            .ok_or(FsError::InvalidDescriptor(fd))
    }

    /// empty slot `fd`, an already empty slot is fine
    pub fn release(&mut self, fd: FileDescriptor) -> Result<()> {
        let slot = self
            .slots
            .get_mut(fd)
            .ok_or(FsError::InvalidDescriptor(fd))?;
        *slot = None;
        Ok(())
    }

    /// empty every slot open on `inode_block`
    pub fn release_inode(&mut self, inode_block: BlockId) {
        for slot in &mut self.slots {
            if matches!(slot, Some(open) if open.inode_block == inode_block) {
                *slot = None;
            }
        }
    }

    pub fn clear(&mut self) {
        self.slots.fill(None);
    }
}

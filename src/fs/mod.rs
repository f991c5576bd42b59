//! our tiny filesystem
//!
//! A volume is an array of fixed-size blocks. Block 0 holds the superblock;
//! every other block sits on exactly one singly linked chain:
//! - the free list, rooted at `SuperBlock::free_list_head`
//! - the inode chain (the flat directory), rooted at `SuperBlock::root_inode`
//! - one content chain per file, rooted at `Inode::content_head`
pub mod block;
pub mod inode;
pub mod superblock;
mod content;
mod directory;
mod file_table;
mod free_list;
mod fs_api_impl;
mod fs_layout;
pub use block::*;
pub use file_table::{FileTable, OpenFile};
pub use fs_api_impl::{FileInfo, FsStats};
pub use fs_layout::*;
pub use inode::*;
pub use superblock::*;

/// index of a block on the volume
pub type BlockId = u32;
/// index into the open file table
pub type FileDescriptor = usize;

pub const MAGIC: u8 = 0x44;
pub const SUPERBLOCK_ID: BlockId = 0;
pub const BLOCK_HEADER_SIZE: usize = 4;
pub const DEFAULT_BLOCK_SIZE: usize = 256;
pub const DEFAULT_DISK_SIZE: u64 = 10240;
pub const DEFAULT_DISK_NAME: &str = "tinyFSDisk";
pub const FILE_TABLE_SIZE: usize = 20;
/// largest volume whose headers keep the one-byte `next`
pub const MAX_NARROW_BLOCKS: u64 = 255;
/// `next` is at most two bytes wide and `0xFFFF` means "no block"
pub const MAX_BLOCKS: u64 = 65535;
/// usable bytes of a file name, one more byte on disk for the terminating NUL
pub const MAX_NAME_LEN: usize = 8;
/// nothing smaller than this can hold an inode
pub const MIN_BLOCK_SIZE: usize = 64;

/// settings fixed when a [TinyFs] session is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsConfig {
    /// block size of volumes formatted and mounted by this session
    pub block_size: usize,
    /// capacity of the open file table
    pub open_file_limit: usize,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            open_file_limit: FILE_TABLE_SIZE,
        }
    }
}

impl FsConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.block_size < MIN_BLOCK_SIZE {
            return Err(crate::FsError::InvalidSize(format!(
                "block size {} is smaller than the minimum {MIN_BLOCK_SIZE}",
                self.block_size
            )));
        }
        if self.open_file_limit == 0 {
            return Err(crate::FsError::InvalidSize(
                "open file table must hold at least one file".to_string(),
            ));
        }
        Ok(())
    }

    /// usable bytes per data block
    pub fn payload_size(&self) -> usize {
        crate::utils::fs_size_calculator::payload_size(self.block_size)
    }
}

use log::{debug, info};

use super::{BlockId, FileDescriptor, FileName, Inode, TinyFs};
use crate::{disk::DiskProvider, utils::time_util::Timestamp, FsError, Result};

/// what `file_info` reports about an open file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u32,
    /// data blocks in the content chain, the inode block not counted
    pub blocks: u32,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
    pub accessed_at: Timestamp,
    pub read_only: bool,
}

/// what `statfs` reports about the mounted volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStats {
    pub block_size: u32,
    pub total_blocks: u32,
    pub free_blocks: u32,
    pub files: u32,
}

impl<P: DiskProvider> TinyFs<P> {
    /// the inode block behind `fd`, checking the mount first
    fn inode_of(&self, fd: FileDescriptor) -> Result<BlockId> {
        self.volume()?;
        Ok(self.file_table.get(fd)?.inode_block)
    }

    /// open the file `name`, creating an empty one if it does not exist
    ///
    /// Opening the same name twice hands out two descriptors with their own
    /// cursors on one inode.
    pub fn open(&mut self, name: &str) -> Result<FileDescriptor> {
        let (volume, file_table) = self.parts_mut()?;
        let name = FileName::new(name)?;
        if !file_table.has_free_slot() {
            return Err(FsError::TooManyOpenFiles);
        }
        let inode_block = volume.create_if_absent(&name)?;
        let fd = file_table.allocate(inode_block)?;
        debug!("opened {name} as descriptor {fd}");
        Ok(fd)
    }

    pub fn close(&mut self, fd: FileDescriptor) -> Result<()> {
        self.volume()?;
        self.file_table.release(fd)
    }

    /// replace the whole content of the file and rewind its cursor
    pub fn write(&mut self, fd: FileDescriptor, bytes: &[u8]) -> Result<()> {
        let (volume, file_table) = self.parts_mut()?;
        let open_file = file_table.get_mut(fd)?;
        volume.replace(open_file.inode_block, bytes)?;
        open_file.cursor = 0;
        Ok(())
    }

    /// the byte under the cursor, the cursor moves on only if there was one
    pub fn read_byte(&mut self, fd: FileDescriptor) -> Result<u8> {
        let (volume, file_table) = self.parts_mut()?;
        let open_file = file_table.get_mut(fd)?;
        let byte = volume.read_byte_at(open_file.inode_block, open_file.cursor)?;
        open_file.cursor += 1;
        Ok(byte)
    }

    /// overwrite the byte under the cursor and move past it
    pub fn write_byte(&mut self, fd: FileDescriptor, byte: u8) -> Result<()> {
        let (volume, file_table) = self.parts_mut()?;
        let open_file = file_table.get_mut(fd)?;
        volume.write_byte_at(open_file.inode_block, open_file.cursor, byte)?;
        open_file.cursor += 1;
        Ok(())
    }

    /// move the cursor, past the end is allowed and fails on the next read
    pub fn seek(&mut self, fd: FileDescriptor, offset: u64) -> Result<()> {
        self.volume()?;
        self.file_table.get_mut(fd)?.cursor = offset;
        Ok(())
    }

    /// remove the file behind `fd`
    ///
    /// Its content and inode go back to the free list and every descriptor
    /// open on it is closed.
    pub fn delete(&mut self, fd: FileDescriptor) -> Result<()> {
        let (volume, file_table) = self.parts_mut()?;
        let inode_block = file_table.get(fd)?.inode_block;
        let inode: Inode = volume.read(inode_block)?;
        inode.ensure_writable()?;

        volume.release_chain(inode.content_head)?;
        volume.unlink(inode_block)?;
        volume.flush_superblock()?;
        file_table.release_inode(inode_block);
        debug!("deleted {}", inode.name);
        Ok(())
    }

    pub fn rename(&mut self, fd: FileDescriptor, new_name: &str) -> Result<()> {
        let inode_block = self.inode_of(fd)?;
        let new_name = FileName::new(new_name)?;
        self.volume_mut()?.rename(inode_block, &new_name)
    }

    /// every file name, the most recently created first
    pub fn readdir(&self) -> Result<Vec<String>> {
        Ok(self
            .volume()?
            .entries()?
            .into_iter()
            .map(|(_, inode)| inode.name.to_string())
            .collect())
    }

    pub fn file_info(&self, fd: FileDescriptor) -> Result<FileInfo> {
        let inode_block = self.inode_of(fd)?;
        let volume = self.volume()?;
        let inode: Inode = volume.read(inode_block)?;
        let blocks = volume.walk_chain(inode.content_head)?.len() as u32;
        Ok(FileInfo {
            name: inode.name.to_string(),
            size: inode.size,
            blocks,
            created_at: inode.created_at,
            modified_at: inode.modified_at,
            accessed_at: inode.accessed_at,
            read_only: inode.read_only,
        })
    }

    pub fn make_read_only(&mut self, name: &str) -> Result<()> {
        self.set_read_only(name, true)
    }

    pub fn make_read_write(&mut self, name: &str) -> Result<()> {
        self.set_read_only(name, false)
    }

    fn set_read_only(&mut self, name: &str, read_only: bool) -> Result<()> {
        let volume = self.volume_mut()?;
        let file_name = FileName::new(name)?;
        let inode_block = volume
            .find_by_name(&file_name)?
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;
        let mut inode: Inode = volume.read(inode_block)?;
        inode.read_only = read_only;
        volume.write(inode_block, &inode)?;
        info!("{name} is now {}", if read_only { "read-only" } else { "read-write" });
        Ok(())
    }

    pub fn statfs(&self) -> Result<FsStats> {
        let volume = self.volume()?;
        let superblock = volume.superblock();
        Ok(FsStats {
            block_size: superblock.block_size,
            total_blocks: superblock.total_blocks,
            free_blocks: superblock.free_block_count,
            files: volume.walk_chain(superblock.root_inode)?.len() as u32,
        })
    }
}

//! the free list: a LIFO stack of unused blocks threaded through the blocks
//! themselves and rooted in the superblock
use log::debug;

use super::{BlockId, FreeBlock, Volume};
use crate::{disk::BlockDevice, utils::traits::BlockCodec, FsError, Result};

impl<D: BlockDevice> Volume<D> {
    /// push `block_id` onto the front of the free list
    ///
    /// Whatever the block held is overwritten. The superblock is only
    /// changed in memory, callers flush it when their operation is done.
    pub(crate) fn release(&mut self, block_id: BlockId) -> Result<()> {
        let head = self.superblock().free_list_head;
        self.write(block_id, &FreeBlock::new(head))?;
        let superblock = self.superblock_mut();
        superblock.free_list_head = Some(block_id);
        superblock.free_block_count += 1;
        debug!("released block {block_id}");
        Ok(())
    }

    /// pop the block at the front of the free list
    ///
    /// The caller must overwrite the returned block before using it.
    pub(crate) fn acquire(&mut self) -> Result<BlockId> {
        let block_id = self
            .superblock()
            .free_list_head
            .ok_or(FsError::OutOfSpace { needed: 1, free: 0 })?;
        let free_block: FreeBlock = self.read(block_id)?;
        let superblock = self.superblock_mut();
        superblock.free_list_head = free_block.next();
        superblock.free_block_count = superblock.free_block_count.saturating_sub(1);
        debug!("acquired block {block_id}");
        Ok(block_id)
    }

    /// release every block of the chain starting at `head`, in chain order
    pub(crate) fn release_chain(&mut self, head: Option<BlockId>) -> Result<()> {
        for block_id in self.walk_chain(head)? {
            self.release(block_id)?;
        }
        Ok(())
    }
}

//! file contents: a chain of data blocks from `Inode::content_head`
use log::debug;

use super::{BlockId, DataBlock, Inode, Volume};
use crate::{
    disk::BlockDevice,
    utils::{fs_size_calculator, traits::BlockCodec},
    FsError, Result,
};

impl<D: BlockDevice> Volume<D> {
    /// replace the whole content of a file with `bytes`
    ///
    /// The old chain goes back to the free list first. If the new content
    /// cannot fit even then, nothing is touched.
    pub(crate) fn replace(&mut self, inode_block: BlockId, bytes: &[u8]) -> Result<()> {
        let mut inode: Inode = self.read(inode_block)?;
        inode.ensure_writable()?;

        let payload_size = self.payload_size();
        let blocks_needed = fs_size_calculator::blocks_needed(bytes.len(), payload_size);
        let old_chain = self.walk_chain(inode.content_head)?;
        let free = self.superblock().free_block_count as usize + old_chain.len();
        let size = u32::try_from(bytes.len()).ok().filter(|_| blocks_needed <= free);
        let Some(size) = size else {
            return Err(FsError::OutOfSpace {
                needed: u32::try_from(blocks_needed).unwrap_or(u32::MAX),
                free: free as u32,
            });
        };

        for block_id in old_chain {
            self.release(block_id)?;
        }

        // tail first, so every block already knows its successor when written
        let mut next = None;
        for chunk in bytes.chunks(payload_size).rev() {
            let block_id = self.acquire()?;
            self.write(block_id, &DataBlock::new(next, chunk))?;
            next = Some(block_id);
        }
        debug!(
            "wrote {} bytes in {blocks_needed} blocks to file {}",
            bytes.len(),
            inode.name
        );

        inode.size = size;
        inode.content_head = next;
        inode.update_modified_at();
        self.write(inode_block, &inode)?;
        self.flush_superblock()
    }

    /// the data block holding byte `offset` of a file, and the byte's index in it
    fn locate(&self, inode_block: BlockId, inode: &Inode, offset: u64) -> Result<(BlockId, usize)> {
        if offset >= inode.size as u64 {
            return Err(FsError::EndOfFile);
        }
        let payload_size = self.payload_size() as u64;
        let block_index = offset / payload_size;
        let mut block_id = inode
            .content_head
            .ok_or_else(|| FsError::corrupt(inode_block, "non-empty file without content"))?;
        for _ in 0..block_index {
            let data: DataBlock = self.read(block_id)?;
            block_id = data.next().ok_or_else(|| {
                FsError::corrupt(block_id, format!("content of {} ends early", inode.name))
            })?;
        }
        Ok((block_id, (offset % payload_size) as usize))
    }

    /// byte `offset` of a file, walking the chain from its head
    pub(crate) fn read_byte_at(&mut self, inode_block: BlockId, offset: u64) -> Result<u8> {
        let mut inode: Inode = self.read(inode_block)?;
        let (block_id, index) = self.locate(inode_block, &inode, offset)?;
        let data: DataBlock = self.read(block_id)?;
        inode.update_accessed_at();
        self.write(inode_block, &inode)?;
        Ok(data.payload[index])
    }

    /// overwrite byte `offset` of a file in place, files never grow this way
    pub(crate) fn write_byte_at(&mut self, inode_block: BlockId, offset: u64, byte: u8) -> Result<()> {
        let mut inode: Inode = self.read(inode_block)?;
        inode.ensure_writable()?;
        let (block_id, index) = self.locate(inode_block, &inode, offset)?;
        let mut data: DataBlock = self.read(block_id)?;
        data.payload[index] = byte;
        self.write(block_id, &data)?;
        inode.update_modified_at();
        self.write(inode_block, &inode)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        fs::{BlockId, DataBlock, FileName, Inode},
        utils::init_test_environment::init_test_environment,
        FsError,
    };

    fn content(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_replace_builds_forward_chain() {
        let mut fs = init_test_environment("forward", 10240);
        let volume = fs.volume_mut().unwrap();
        let file = volume.create_if_absent(&FileName::new("A").unwrap()).unwrap();
        let bytes = content(540);
        volume.replace(file, &bytes).unwrap();

        let inode: Inode = volume.read(file).unwrap();
        assert_eq!(inode.size, 540);
        let chain = volume.walk_chain(inode.content_head).unwrap();
        assert_eq!(chain.len(), 3);

        let mut read_back = Vec::new();
        for block_id in &chain {
            let data: DataBlock = volume.read(*block_id).unwrap();
            read_back.extend_from_slice(&data.payload);
        }
        assert_eq!(&read_back[..540], &bytes[..]);
        // the remainder block is zero padded
        assert!(read_back[540..].iter().all(|b| *b == 0));
        assert_eq!(volume.superblock().free_block_count, 35);
    }

    #[test]
    fn test_exact_multiple_allocates_no_extra_block() {
        let mut fs = init_test_environment("multiple", 10240);
        let volume = fs.volume_mut().unwrap();
        let file = volume.create_if_absent(&FileName::new("B").unwrap()).unwrap();
        let bytes = content(2 * 252);
        volume.replace(file, &bytes).unwrap();

        let inode: Inode = volume.read(file).unwrap();
        let chain = volume.walk_chain(inode.content_head).unwrap();
        assert_eq!(chain.len(), 2);
        let last: DataBlock = volume.read(chain[1]).unwrap();
        assert_eq!(&last.payload[..], &bytes[252..]);
        assert_eq!(volume.read_byte_at(file, 503).unwrap(), bytes[503]);
    }

    #[test]
    fn test_zero_length_write_allocates_nothing() {
        let mut fs = init_test_environment("empty", 10240);
        let volume = fs.volume_mut().unwrap();
        let file = volume.create_if_absent(&FileName::new("E").unwrap()).unwrap();
        volume.replace(file, &content(300)).unwrap();
        volume.replace(file, &[]).unwrap();

        let inode: Inode = volume.read(file).unwrap();
        assert_eq!(inode.size, 0);
        assert_eq!(inode.content_head, None);
        assert_eq!(volume.superblock().free_block_count, 38);
        assert!(matches!(volume.read_byte_at(file, 0), Err(FsError::EndOfFile)));
    }

    #[test]
    fn test_out_of_space_keeps_old_content() {
        // superblock, one inode and three data blocks
        let mut fs = init_test_environment("full", 5 * 256);
        let volume = fs.volume_mut().unwrap();
        let file = volume.create_if_absent(&FileName::new("F").unwrap()).unwrap();
        let old = content(10);
        volume.replace(file, &old).unwrap();

        // the old block counts as free, 3 fit, 4 don't
        assert!(matches!(
            volume.replace(file, &content(4 * 252)),
            Err(FsError::OutOfSpace { needed: 4, free: 3 })
        ));
        assert_eq!(volume.read_byte_at(file, 9).unwrap(), old[9]);

        volume.replace(file, &content(3 * 252)).unwrap();
        assert_eq!(volume.superblock().free_block_count, 0);
    }

    #[test]
    fn test_read_byte_updates_access_time_only() {
        let mut fs = init_test_environment("atime", 10240);
        let volume = fs.volume_mut().unwrap();
        let file = volume.create_if_absent(&FileName::new("T").unwrap()).unwrap();
        volume.replace(file, b"xyz").unwrap();
        let mut inode: Inode = volume.read(file).unwrap();
        inode.accessed_at = Default::default();
        volume.write(file, &inode).unwrap();

        assert_eq!(volume.read_byte_at(file, 1).unwrap(), b'y');
        let after: Inode = volume.read(file).unwrap();
        assert!(after.accessed_at > inode.accessed_at);
        assert_eq!(after.modified_at, inode.modified_at);
        assert!(matches!(volume.read_byte_at(file, 3), Err(FsError::EndOfFile)));
    }

    #[test]
    fn test_write_byte_in_place() {
        let mut fs = init_test_environment("patch", 10240);
        let volume = fs.volume_mut().unwrap();
        let file = volume.create_if_absent(&FileName::new("P").unwrap()).unwrap();
        let mut bytes = content(600);
        volume.replace(file, &bytes).unwrap();
        let free = volume.superblock().free_block_count;

        volume.write_byte_at(file, 300, 0xEE).unwrap();
        bytes[300] = 0xEE;
        for offset in [0u64, 251, 252, 300, 599] {
            assert_eq!(
                volume.read_byte_at(file, offset).unwrap(),
                bytes[offset as usize]
            );
        }
        assert_eq!(volume.superblock().free_block_count, free);
        assert!(matches!(
            volume.write_byte_at(file, 600, 1),
            Err(FsError::EndOfFile)
        ));
    }

    #[test]
    fn test_read_only_file_refuses_replace() {
        let mut fs = init_test_environment("readonly", 10240);
        let volume = fs.volume_mut().unwrap();
        let file: BlockId = volume.create_if_absent(&FileName::new("R").unwrap()).unwrap();
        let mut inode: Inode = volume.read(file).unwrap();
        inode.read_only = true;
        volume.write(file, &inode).unwrap();

        assert!(matches!(volume.replace(file, b"no"), Err(FsError::ReadOnly(_))));
        assert!(matches!(
            volume.write_byte_at(file, 0, 1),
            Err(FsError::ReadOnly(_))
        ));
    }
}

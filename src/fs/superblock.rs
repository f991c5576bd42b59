use serde::{Deserialize, Serialize};

use super::{block::pointer, BlockId, BlockKind};
use crate::utils::traits::{BlockCodec, SerializeIntoBlock};

/// The superblock of this filesystem, always block 0
///
/// The copy held by a mounted session is the working copy; it is written
/// back after every operation that changes it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SuperBlock {
    /// first block of the inode chain
    #[serde(with = "pointer")]
    pub root_inode: Option<BlockId>,
    /// first block of the free list
    #[serde(with = "pointer")]
    pub free_list_head: Option<BlockId>,
    pub free_block_count: u32,
    pub total_blocks: u32,
    pub block_size: u32,
}

impl SuperBlock {
    /// an empty volume: no files and, until blocks are released onto it,
    /// an empty free list
    pub fn new(total_blocks: u32, block_size: u32) -> Self {
        Self {
            root_inode: None,
            free_list_head: None,
            free_block_count: 0,
            total_blocks,
            block_size,
        }
    }
}

impl SerializeIntoBlock for SuperBlock {}

impl BlockCodec for SuperBlock {
    const KIND: BlockKind = BlockKind::SuperBlock;

    fn next(&self) -> Option<BlockId> {
        None
    }

    fn encode_body(&self, body: &mut [u8]) -> Result<(), String> {
        self.serialize_into(body).map(|_| ())
    }

    fn decode_body(_next: Option<BlockId>, body: &[u8]) -> Result<Self, String> {
        Self::deserialize_from(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{PointerWidth, MAGIC};

    #[test]
    fn test_superblock_layout() {
        let mut superblock = SuperBlock::new(40, 256);
        superblock.root_inode = Some(5);
        superblock.free_block_count = 35;
        let mut block = vec![0u8; 256];
        superblock.encode_into(&mut block, PointerWidth::Narrow).unwrap();

        assert_eq!(&block[..4], &[1, MAGIC, 0xFF, 0]);
        assert_eq!(&block[4..8], &5i32.to_le_bytes());
        assert_eq!(&block[8..12], &(-1i32).to_le_bytes());
        assert_eq!(&block[12..16], &35u32.to_le_bytes());
        assert_eq!(&block[16..20], &40u32.to_le_bytes());
        assert_eq!(&block[20..24], &256u32.to_le_bytes());
        assert!(block[24..].iter().all(|b| *b == 0));

        assert_eq!(
            SuperBlock::decode_from(&block, PointerWidth::Narrow).unwrap(),
            superblock
        );
    }

    #[test]
    fn test_wide_superblock_reads_as_narrow() {
        let superblock = SuperBlock::new(400, 256);
        let mut block = vec![0u8; 256];
        superblock.encode_into(&mut block, PointerWidth::Wide).unwrap();
        assert_eq!(&block[..4], &[1, MAGIC, 0xFF, 0xFF]);
        assert_eq!(
            SuperBlock::decode_from(&block, PointerWidth::Narrow).unwrap(),
            superblock
        );
    }

    #[test]
    fn test_negative_pointer_is_rejected() {
        let mut block = vec![0u8; 64];
        SuperBlock::new(40, 256)
            .encode_into(&mut block, PointerWidth::Narrow)
            .unwrap();
        block[4..8].copy_from_slice(&(-7i32).to_le_bytes());
        assert!(SuperBlock::decode_from(&block, PointerWidth::Narrow).is_err());
    }
}

//! what does our filesystem look like in the memory

use log::warn;

use super::{
    BlockHeader, BlockId, FileTable, FsConfig, PointerWidth, SuperBlock, MAX_BLOCKS,
    SUPERBLOCK_ID,
};
use crate::{
    disk::{BlockDevice, DiskProvider},
    utils::{fs_size_calculator, traits::BlockCodec},
    FsError, Result,
};

/// an opened volume: the device plus the working copy of its superblock
///
/// The width of header pointers is fixed by the block count.
#[derive(Debug)]
pub struct Volume<D> {
    name: String,
    disk: D,
    superblock: SuperBlock,
    width: PointerWidth,
}

impl<D: BlockDevice> Volume<D> {
    pub(crate) fn new(name: &str, disk: D, superblock: SuperBlock) -> Self {
        Self {
            name: name.to_string(),
            disk,
            width: PointerWidth::for_volume(superblock.total_blocks),
            superblock,
        }
    }

    /// adopt the superblock stored in block 0 of `disk`
    pub(crate) fn load(name: &str, disk: D) -> Result<Self> {
        let mut buf = vec![0u8; disk.block_size()];
        disk.read_block(SUPERBLOCK_ID, &mut buf)?;
        // the superblock's link is always none, which reads the same under both widths
        let superblock = decode::<SuperBlock>(SUPERBLOCK_ID, &buf, PointerWidth::Narrow)?;
        if superblock.block_size as usize != disk.block_size() {
            return Err(corrupt(
                SUPERBLOCK_ID,
                format!(
                    "volume was formatted with {} byte blocks, mounted with {}",
                    superblock.block_size,
                    disk.block_size()
                ),
            ));
        }
        if superblock.total_blocks as u64 > MAX_BLOCKS
            || superblock.free_block_count >= superblock.total_blocks
        {
            return Err(corrupt(
                SUPERBLOCK_ID,
                format!(
                    "superblock claims {} free of {} blocks",
                    superblock.free_block_count, superblock.total_blocks
                ),
            ));
        }
        if superblock.total_blocks > disk.block_count() {
            return Err(corrupt(
                SUPERBLOCK_ID,
                format!(
                    "superblock claims {} blocks, the device holds {}",
                    superblock.total_blocks,
                    disk.block_count()
                ),
            ));
        }
        Ok(Self::new(name, disk, superblock))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn superblock(&self) -> &SuperBlock {
        &self.superblock
    }

    #[inline]
    pub(crate) fn superblock_mut(&mut self) -> &mut SuperBlock {
        &mut self.superblock
    }

    pub fn block_size(&self) -> usize {
        self.disk.block_size()
    }

    pub fn payload_size(&self) -> usize {
        fs_size_calculator::payload_size(self.block_size())
    }

    pub fn pointer_width(&self) -> PointerWidth {
        self.width
    }

    pub(crate) fn into_disk(self) -> D {
        self.disk
    }
}

/// typed block I/O
impl<D: BlockDevice> Volume<D> {
    fn check_in_range(&self, block_id: BlockId) -> Result<()> {
        if block_id == SUPERBLOCK_ID || block_id >= self.superblock.total_blocks {
            return Err(corrupt(
                block_id,
                format!(
                    "pointer outside blocks 1..{}",
                    self.superblock.total_blocks
                ),
            ));
        }
        Ok(())
    }

    fn read_raw(&self, block_id: BlockId) -> Result<Vec<u8>> {
        self.check_in_range(block_id)?;
        let mut buf = vec![0u8; self.block_size()];
        self.disk.read_block(block_id, &mut buf)?;
        Ok(buf)
    }

    /// read block `block_id` as a `T`, anything else there is corruption
    pub(crate) fn read<T: BlockCodec>(&self, block_id: BlockId) -> Result<T> {
        decode(block_id, &self.read_raw(block_id)?, self.width)
    }

    /// only the header, whatever kind of block it is
    pub(crate) fn read_header(&self, block_id: BlockId) -> Result<BlockHeader> {
        let buf = self.read_raw(block_id)?;
        BlockHeader::decode_from(&buf, self.width).map_err(|reason| corrupt(block_id, reason))
    }

    pub(crate) fn write<T: BlockCodec>(&mut self, block_id: BlockId, block: &T) -> Result<()> {
        self.check_in_range(block_id)?;
        self.write_unchecked(block_id, block)
    }

    fn write_unchecked<T: BlockCodec>(&mut self, block_id: BlockId, block: &T) -> Result<()> {
        let mut buf = vec![0u8; self.block_size()];
        block
            .encode_into(&mut buf, self.width)
            .map_err(|reason| FsError::Encode { block: block_id, reason })?;
        self.disk.write_block(block_id, &buf)
    }

    /// write the working superblock back to block 0
    pub(crate) fn flush_superblock(&mut self) -> Result<()> {
        let superblock = self.superblock.clone();
        self.write_unchecked(SUPERBLOCK_ID, &superblock)
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        self.disk.flush()
    }

    /// every block of the chain starting at `head`, in chain order
    ///
    /// A chain longer than the volume must loop back on itself.
    pub(crate) fn walk_chain(&self, head: Option<BlockId>) -> Result<Vec<BlockId>> {
        let mut chain = Vec::new();
        let mut next = head;
        while let Some(block_id) = next {
            if chain.len() >= self.superblock.total_blocks as usize {
                return Err(corrupt(block_id, "chain loops back on itself"));
            }
            chain.push(block_id);
            next = self.read_header(block_id)?.next;
        }
        Ok(chain)
    }
}

fn corrupt(block_id: BlockId, reason: impl Into<String>) -> FsError {
    let error = FsError::corrupt(block_id, reason);
    warn!("{error}");
    error
}

fn decode<T: BlockCodec>(block_id: BlockId, buf: &[u8], width: PointerWidth) -> Result<T> {
    T::decode_from(buf, width).map_err(|reason| corrupt(block_id, reason))
}

/// one filesystem session: at most one mounted volume and its open files
///
/// it has the following layout:
/// - a provider to create and open volumes by name
/// - the mounted volume, if any
/// - the open file table
pub struct TinyFs<P: DiskProvider> {
    pub(crate) provider: P,
    pub(crate) config: FsConfig,
    pub(crate) volume: Option<Volume<P::Disk>>,
    pub(crate) file_table: FileTable,
}

impl<P: DiskProvider> TinyFs<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, FsConfig::default())
    }

    pub fn with_config(provider: P, config: FsConfig) -> Self {
        Self {
            provider,
            config,
            volume: None,
            file_table: FileTable::new(config.open_file_limit),
        }
    }
}

/// get the provider, config and mounted [Volume] of this session
impl<P: DiskProvider> TinyFs<P> {
    #[inline]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[inline]
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    #[inline]
    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.volume.is_some()
    }

    #[inline]
    pub fn volume(&self) -> Result<&Volume<P::Disk>> {
        self.volume.as_ref().ok_or(FsError::NotMounted)
    }

    #[inline]
    pub(crate) fn volume_mut(&mut self) -> Result<&mut Volume<P::Disk>> {
        self.volume.as_mut().ok_or(FsError::NotMounted)
    }

    /// the mounted volume and the file table, borrowed together
    #[inline]
    pub(crate) fn parts_mut(&mut self) -> Result<(&mut Volume<P::Disk>, &mut FileTable)> {
        let volume = self.volume.as_mut().ok_or(FsError::NotMounted)?;
        Ok((volume, &mut self.file_table))
    }
}

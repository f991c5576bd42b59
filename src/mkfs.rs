//! create our filesystem
use byte_unit::{Byte, ByteUnit};
use log::{debug, info};

use crate::{
    disk::{BlockDevice, DiskProvider},
    fs::{BlockId, SuperBlock, TinyFs, Volume, MAX_BLOCKS},
    utils::fs_size_calculator,
    FsError, Result,
};

/// lay an empty filesystem over every block of `disk`
/// # Params
/// - `name`: the volume name, only used for logging
/// - `disk`: an opened device, its old content is overwritten
///
/// # Return
/// the superblock written to block 0, and the device handed back
pub fn mkfs<D>(name: &str, disk: D) -> Result<(SuperBlock, D)>
where
    D: BlockDevice,
{
    let total_blocks = disk.block_count();
    if total_blocks as u64 > MAX_BLOCKS {
        return Err(FsError::InvalidSize(format!(
            "device holds {total_blocks} blocks, at most {MAX_BLOCKS} are addressable"
        )));
    }
    let block_size = disk.block_size() as u32;
    let mut volume = Volume::new(name, disk, SuperBlock::new(total_blocks, block_size));
    // from the top down, so the lowest blocks are handed out first
    for block_id in (1..total_blocks).rev() {
        volume.release(block_id)?;
    }
    volume.flush_superblock()?;
    volume.flush()?;
    debug!("{name} uses {:?} block pointers", volume.pointer_width());
    let superblock = volume.superblock().clone();
    Ok((superblock, volume.into_disk()))
}

/// check a requested volume size against the block size
fn check_volume_size(size_bytes: u64, block_size: usize) -> Result<BlockId> {
    let blocks = fs_size_calculator::total_blocks(size_bytes, block_size);
    let display = |bytes: u64| Byte::from_bytes(bytes as _).get_appropriate_unit(true);
    if blocks == 0 {
        return Err(FsError::InvalidSize(format!(
            "volume size {} is smaller than one block of {}",
            display(size_bytes),
            Byte::from_bytes(block_size as _).get_adjusted_unit(ByteUnit::B)
        )));
    }
    if blocks > MAX_BLOCKS {
        return Err(FsError::InvalidSize(format!(
            "volume size {} needs {blocks} blocks, at most {MAX_BLOCKS} are addressable (at most {})",
            display(size_bytes),
            display(MAX_BLOCKS * block_size as u64)
        )));
    }
    Ok(blocks as BlockId)
}

impl<P: DiskProvider> TinyFs<P> {
    /// create a new filesystem named `name` of `size_bytes` bytes
    ///
    /// The volume is left unmounted.
    pub fn format(&mut self, name: &str, size_bytes: u64) -> Result<()> {
        if self.is_mounted() {
            return Err(FsError::AlreadyMounted);
        }
        self.config.validate()?;
        let block_size = self.config.block_size;
        let total_blocks = check_volume_size(size_bytes, block_size)?;

        let disk = self.provider.create(name, size_bytes, block_size)?;
        let (superblock, disk) = mkfs(name, disk)?;
        self.provider.close(disk)?;
        info!(
            "formatted {name}: {total_blocks} blocks of {block_size} bytes, {} free",
            superblock.free_block_count
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        disk::{ImageFiles, MemoryDisks},
        fs::{FreeBlock, PointerWidth, DEFAULT_DISK_SIZE, MAGIC},
    };

    #[test]
    fn test_mkfs() {
        let mut fs = TinyFs::new(MemoryDisks::new());
        fs.format("disk", DEFAULT_DISK_SIZE).unwrap();
        assert!(!fs.is_mounted());

        let image = fs.provider().image("disk").unwrap();
        let image = image.borrow();
        assert_eq!(image.len(), 10240);
        assert_eq!(&image[..4], &[1, MAGIC, 0xFF, 0]);
        assert_eq!(&image[4..8], &(-1i32).to_le_bytes());
        assert_eq!(&image[8..12], &1i32.to_le_bytes());
        assert_eq!(&image[12..16], &39u32.to_le_bytes());
        assert_eq!(&image[16..20], &40u32.to_le_bytes());
        // block 39 ends the free list
        assert_eq!(&image[39 * 256..39 * 256 + 4], &[4, MAGIC, 0xFF, 0]);
        assert_eq!(&image[256..260], &[4, MAGIC, 2, 0]);
    }

    #[test]
    fn test_mkfs_rejects_bad_sizes() {
        let mut fs = TinyFs::new(MemoryDisks::new());
        assert!(matches!(
            fs.format("disk", 255),
            Err(FsError::InvalidSize(_))
        ));
        assert!(matches!(
            fs.format("disk", 256 * (MAX_BLOCKS + 1)),
            Err(FsError::InvalidSize(_))
        ));
        assert!(fs.provider().image("disk").is_none());
        fs.format("disk", 255 * 256).unwrap();
        fs.format("disk", 256 * 256).unwrap();
    }

    #[test]
    fn test_mkfs_wide_pointers() {
        let mut fs = TinyFs::new(MemoryDisks::new());
        fs.format("big", 400 * 256).unwrap();
        {
            let image = fs.provider().image("big").unwrap();
            let image = image.borrow();
            assert_eq!(&image[..4], &[1, MAGIC, 0xFF, 0xFF]);
            assert_eq!(&image[12..16], &399u32.to_le_bytes());
            assert_eq!(&image[16..20], &400u32.to_le_bytes());
            // block 300 links to 301 in two little-endian bytes
            assert_eq!(&image[300 * 256..300 * 256 + 4], &[4, MAGIC, 0x2D, 0x01]);
            assert_eq!(&image[399 * 256..399 * 256 + 4], &[4, MAGIC, 0xFF, 0xFF]);
        }

        fs.mount("big").unwrap();
        let volume = fs.volume().unwrap();
        assert_eq!(volume.pointer_width(), PointerWidth::Wide);
        let chain = volume.walk_chain(volume.superblock().free_list_head).unwrap();
        assert_eq!(chain, (1..400).collect::<Vec<BlockId>>());
    }

    #[test]
    fn test_single_block_volume_has_no_free_blocks() {
        let mut fs = TinyFs::new(MemoryDisks::new());
        fs.format("one", 256).unwrap();
        fs.mount("one").unwrap();
        let superblock = fs.volume().unwrap().superblock();
        assert_eq!(superblock.free_block_count, 0);
        assert_eq!(superblock.free_list_head, None);
    }

    #[test]
    fn test_mkfs_on_image_file() -> anyhow::Result<()> {
        let dir = std::env::temp_dir();
        let name = format!("tinyfs_mkfs_test_{}.img", std::process::id());
        let mut fs = TinyFs::new(ImageFiles::new(&dir));
        fs.format(&name, DEFAULT_DISK_SIZE)?;

        fs.mount(&name)?;
        let volume = fs.volume()?;
        assert_eq!(volume.superblock().total_blocks, 40);
        assert_eq!(volume.superblock().free_block_count, 39);
        assert!(volume.read::<FreeBlock>(39).is_ok());
        fs.unmount()?;

        std::fs::remove_file(dir.join(&name))?;
        Ok(())
    }
}

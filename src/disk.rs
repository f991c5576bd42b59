//! block devices the filesystem can live on
//!
//! The filesystem only ever moves whole blocks. A [DiskProvider] creates and
//! opens named volumes, a [BlockDevice] is one opened volume.
use log::debug;
use memmap2::MmapMut;
use std::{
    cell::RefCell,
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{Error, ErrorKind},
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{fs::BlockId, utils::fs_size_calculator, Result};

pub trait BlockDevice {
    /// bytes per block
    fn block_size(&self) -> usize;

    fn block_count(&self) -> BlockId;

    /// read block `block_id` into `buf`, which is exactly one block long
    fn read_block(&self, block_id: BlockId, buf: &mut [u8]) -> Result<()>;

    /// write `buf`, exactly one block long, to block `block_id`
    fn write_block(&mut self, block_id: BlockId, buf: &[u8]) -> Result<()>;

    /// push cached writes down to the backing store
    fn flush(&mut self) -> Result<()>;
}

/// creates and opens named volumes
pub trait DiskProvider {
    type Disk: BlockDevice;

    /// create a zero-filled volume of `size_bytes / block_size` blocks,
    /// replacing any volume with the same name
    fn create(&mut self, name: &str, size_bytes: u64, block_size: usize) -> Result<Self::Disk>;

    /// open an existing volume
    fn open(&mut self, name: &str, block_size: usize) -> Result<Self::Disk>;

    fn close(&mut self, mut disk: Self::Disk) -> Result<()> {
        disk.flush()
    }
}

/// byte range of `block_id`, or an error when it lies past the device
fn block_range(
    block_id: BlockId,
    block_size: usize,
    block_count: BlockId,
    buf_len: usize,
) -> Result<std::ops::Range<usize>> {
    if block_id >= block_count {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("block {block_id} is out of range, the device has {block_count} blocks"),
        )
        .into());
    }
    if buf_len != block_size {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("buffer of {buf_len} bytes for a block of {block_size} bytes"),
        )
        .into());
    }
    let start = block_id as usize * block_size;
    Ok(start..start + block_size)
}

fn image_block_count(len: u64, block_size: usize) -> Result<BlockId> {
    let blocks = fs_size_calculator::total_blocks(len, block_size);
    if blocks == 0 {
        return Err(Error::new(
            ErrorKind::UnexpectedEof,
            format!("an image of {len} bytes holds no block of {block_size} bytes"),
        )
        .into());
    }
    BlockId::try_from(blocks).map_err(|e| Error::new(ErrorKind::InvalidInput, e).into())
}

/// image files on the host filesystem, names are paths relative to `root`
#[derive(Debug, Clone, Default)]
pub struct ImageFiles {
    root: PathBuf,
}

impl ImageFiles {
    pub fn new<P>(root: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn map(file: File, block_size: usize) -> Result<ImageFile> {
        let block_count = image_block_count(file.metadata()?.len(), block_size)?;
        // Safety
        // the image must not be truncated by another process while mapped,
        // see https://docs.rs/memmap2/0.5.10/memmap2/struct.MmapMut.html
        let map = unsafe { MmapMut::map_mut(&file)? };
        Ok(ImageFile {
            _file: file,
            map,
            block_size,
            block_count,
        })
    }
}

impl DiskProvider for ImageFiles {
    type Disk = ImageFile;

    fn create(&mut self, name: &str, size_bytes: u64, block_size: usize) -> Result<ImageFile> {
        let path = self.path_of(name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        // all other region are set to zero using `set_len` method
        let len = fs_size_calculator::total_blocks(size_bytes, block_size) * block_size as u64;
        file.set_len(len)?;
        debug!("created image {} of {len} bytes", path.display());
        Self::map(file, block_size)
    }

    fn open(&mut self, name: &str, block_size: usize) -> Result<ImageFile> {
        let path = self.path_of(name);
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        debug!("opened image {}", path.display());
        Self::map(file, block_size)
    }
}

/// a memory-mapped image file
#[derive(Debug)]
pub struct ImageFile {
    _file: File,
    map: MmapMut,
    block_size: usize,
    block_count: BlockId,
}

impl BlockDevice for ImageFile {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn block_count(&self) -> BlockId {
        self.block_count
    }

    fn read_block(&self, block_id: BlockId, buf: &mut [u8]) -> Result<()> {
        let range = block_range(block_id, self.block_size, self.block_count, buf.len())?;
        buf.copy_from_slice(&self.map[range]);
        Ok(())
    }

    fn write_block(&mut self, block_id: BlockId, buf: &[u8]) -> Result<()> {
        let range = block_range(block_id, self.block_size, self.block_count, buf.len())?;
        self.map[range].copy_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.map.flush()?)
    }
}

type SharedImage = Rc<RefCell<Vec<u8>>>;

/// named in-memory volumes that survive being closed and opened again
///
/// Clones are handles to the same set of volumes.
#[derive(Debug, Clone, Default)]
pub struct MemoryDisks {
    images: Rc<RefCell<HashMap<String, SharedImage>>>,
}

impl MemoryDisks {
    pub fn new() -> Self {
        Self::default()
    }

    /// raw bytes of a volume, for inspecting or damaging it from outside
    pub fn image(&self, name: &str) -> Option<SharedImage> {
        self.images.borrow().get(name).cloned()
    }

    pub fn insert_image(&mut self, name: &str, bytes: Vec<u8>) {
        self.images
            .borrow_mut()
            .insert(name.to_string(), Rc::new(RefCell::new(bytes)));
    }
}

impl DiskProvider for MemoryDisks {
    type Disk = MemoryDisk;

    fn create(&mut self, name: &str, size_bytes: u64, block_size: usize) -> Result<MemoryDisk> {
        let len = fs_size_calculator::total_blocks(size_bytes, block_size) * block_size as u64;
        self.insert_image(name, vec![0u8; len as usize]);
        self.open(name, block_size)
    }

    fn open(&mut self, name: &str, block_size: usize) -> Result<MemoryDisk> {
        let image = self.image(name).ok_or_else(|| {
            Error::new(ErrorKind::NotFound, format!("no memory disk named {name:?}"))
        })?;
        let block_count = image_block_count(image.borrow().len() as u64, block_size)?;
        Ok(MemoryDisk {
            image,
            block_size,
            block_count,
        })
    }
}

/// one opened in-memory volume, writes land in the shared image directly
#[derive(Debug)]
pub struct MemoryDisk {
    image: SharedImage,
    block_size: usize,
    block_count: BlockId,
}

impl BlockDevice for MemoryDisk {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn block_count(&self) -> BlockId {
        self.block_count
    }

    fn read_block(&self, block_id: BlockId, buf: &mut [u8]) -> Result<()> {
        let range = block_range(block_id, self.block_size, self.block_count, buf.len())?;
        buf.copy_from_slice(&self.image.borrow()[range]);
        Ok(())
    }

    fn write_block(&mut self, block_id: BlockId, buf: &[u8]) -> Result<()> {
        let range = block_range(block_id, self.block_size, self.block_count, buf.len())?;
        self.image.borrow_mut()[range].copy_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

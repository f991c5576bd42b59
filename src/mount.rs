//! mount and unmount a volume
use log::info;

use crate::{
    disk::DiskProvider,
    fs::{TinyFs, Volume},
    FsError, Result,
};

impl<P: DiskProvider> TinyFs<P> {
    /// open the volume `name` and adopt its superblock
    ///
    /// Every descriptor from an earlier mount becomes invalid, even when the
    /// same volume is mounted again.
    pub fn mount(&mut self, name: &str) -> Result<()> {
        if self.is_mounted() {
            return Err(FsError::AlreadyMounted);
        }
        self.config.validate()?;
        let disk = self.provider.open(name, self.config.block_size)?;
        let volume = Volume::load(name, disk)?;
        info!(
            "mounted {name}: {} of {} blocks free",
            volume.superblock().free_block_count,
            volume.superblock().total_blocks
        );
        self.file_table.clear();
        self.volume = Some(volume);
        Ok(())
    }

    /// close the mounted volume
    ///
    /// Open descriptors keep their slots but fail with `NotMounted` until the
    /// next mount clears the table.
    pub fn unmount(&mut self) -> Result<()> {
        let volume = self.volume.take().ok_or(FsError::NotMounted)?;
        let name = volume.name().to_string();
        self.provider.close(volume.into_disk())?;
        info!("unmounted {name}");
        Ok(())
    }
}

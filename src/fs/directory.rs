//! the flat directory: every inode linked into one chain from
//! `SuperBlock::root_inode`, newest first
use log::debug;

use super::{BlockId, FileName, Inode, Volume};
use crate::{disk::BlockDevice, FsError, Result};

impl<D: BlockDevice> Volume<D> {
    /// every inode, walking from the root
    pub(crate) fn entries(&self) -> Result<Vec<(BlockId, Inode)>> {
        let mut entries = Vec::new();
        for block_id in self.walk_chain(self.superblock().root_inode)? {
            entries.push((block_id, self.read(block_id)?));
        }
        Ok(entries)
    }

    /// the inode named `name`, the one closest to the root if there are several
    pub(crate) fn find_by_name(&self, name: &FileName) -> Result<Option<BlockId>> {
        let mut next = self.superblock().root_inode;
        let mut steps = 0;
        while let Some(block_id) = next {
            if steps >= self.superblock().total_blocks {
                return Err(FsError::corrupt(block_id, "inode chain loops back on itself"));
            }
            let inode: Inode = self.read(block_id)?;
            if inode.name == *name {
                return Ok(Some(block_id));
            }
            next = inode.next();
            steps += 1;
        }
        Ok(None)
    }

    /// the inode named `name`, pushed to the front of the chain if it is new
    pub(crate) fn create_if_absent(&mut self, name: &FileName) -> Result<BlockId> {
        if let Some(block_id) = self.find_by_name(name)? {
            return Ok(block_id);
        }
        let block_id = self.acquire()?;
        let inode = Inode::new(*name, self.superblock().root_inode);
        self.write(block_id, &inode)?;
        self.superblock_mut().root_inode = Some(block_id);
        self.flush_superblock()?;
        debug!("created file {name} in inode block {block_id}");
        Ok(block_id)
    }

    /// take the inode out of the chain and give its block back to the free list
    pub(crate) fn unlink(&mut self, inode_block: BlockId) -> Result<()> {
        let inode: Inode = self.read(inode_block)?;
        if self.superblock().root_inode == Some(inode_block) {
            self.superblock_mut().root_inode = inode.next();
        } else {
            let predecessor = self
                .entries()?
                .into_iter()
                .find(|(_, entry)| entry.next() == Some(inode_block));
            let Some((predecessor_block, mut predecessor)) = predecessor else {
                return Err(FsError::NotFound(format!("inode block {inode_block}")));
            };
            predecessor.set_next(inode.next());
            self.write(predecessor_block, &predecessor)?;
        }
        self.release(inode_block)?;
        debug!("unlinked file {} from inode block {inode_block}", inode.name);
        Ok(())
    }

    /// overwrite the name in place
    ///
    /// Nothing stops two files from ending up with the same name this way,
    /// lookups then find the one closest to the root.
    pub(crate) fn rename(&mut self, inode_block: BlockId, new_name: &FileName) -> Result<()> {
        let mut inode: Inode = self.read(inode_block)?;
        inode.name = *new_name;
        inode.update_modified_at();
        self.write(inode_block, &inode)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        fs::{FileName, FreeBlock, Inode},
        utils::init_test_environment::init_test_environment,
        FsError,
    };

    fn name(name: &str) -> FileName {
        FileName::new(name).unwrap()
    }

    #[test]
    fn test_create_pushes_to_front() {
        let mut fs = init_test_environment("front", 10240);
        let volume = fs.volume_mut().unwrap();
        let a = volume.create_if_absent(&name("a")).unwrap();
        let b = volume.create_if_absent(&name("b")).unwrap();
        assert_eq!(volume.superblock().root_inode, Some(b));

        let names: Vec<String> = volume
            .entries()
            .unwrap()
            .iter()
            .map(|(_, inode)| inode.name.to_string())
            .collect();
        assert_eq!(names, ["b", "a"]);
        let b_inode: Inode = volume.read(b).unwrap();
        assert_eq!(b_inode.next(), Some(a));
        assert_eq!(b_inode.size, 0);
        assert_eq!(b_inode.content_head, None);
    }

    #[test]
    fn test_create_existing_name_returns_same_inode() {
        let mut fs = init_test_environment("existing", 10240);
        let volume = fs.volume_mut().unwrap();
        let first = volume.create_if_absent(&name("same")).unwrap();
        let free = volume.superblock().free_block_count;
        let second = volume.create_if_absent(&name("same")).unwrap();
        assert_eq!(first, second);
        assert_eq!(volume.superblock().free_block_count, free);
    }

    #[test]
    fn test_find_by_name() {
        let mut fs = init_test_environment("find", 10240);
        let volume = fs.volume_mut().unwrap();
        let a = volume.create_if_absent(&name("a")).unwrap();
        volume.create_if_absent(&name("b")).unwrap();
        assert_eq!(volume.find_by_name(&name("a")).unwrap(), Some(a));
        assert_eq!(volume.find_by_name(&name("zzz")).unwrap(), None);
    }

    #[test]
    fn test_unlink_head_middle_and_tail() {
        let mut fs = init_test_environment("unlink", 10240);
        let volume = fs.volume_mut().unwrap();
        let a = volume.create_if_absent(&name("a")).unwrap();
        let b = volume.create_if_absent(&name("b")).unwrap();
        let c = volume.create_if_absent(&name("c")).unwrap();
        let d = volume.create_if_absent(&name("d")).unwrap();
        // chain is d -> c -> b -> a

        volume.unlink(c).unwrap();
        let d_inode: Inode = volume.read(d).unwrap();
        assert_eq!(d_inode.next(), Some(b));
        assert!(volume.read::<FreeBlock>(c).is_ok());

        volume.unlink(d).unwrap();
        assert_eq!(volume.superblock().root_inode, Some(b));

        volume.unlink(a).unwrap();
        let b_inode: Inode = volume.read(b).unwrap();
        assert_eq!(b_inode.next(), None);

        volume.unlink(b).unwrap();
        assert_eq!(volume.superblock().root_inode, None);
        assert_eq!(volume.superblock().free_block_count, 39);
    }

    #[test]
    fn test_unlink_inode_outside_the_chain() {
        let mut fs = init_test_environment("stray", 10240);
        let volume = fs.volume_mut().unwrap();
        volume.create_if_absent(&name("a")).unwrap();
        let stray = volume.acquire().unwrap();
        volume.write(stray, &Inode::new(name("stray"), None)).unwrap();
        assert!(matches!(volume.unlink(stray), Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_rename_allows_duplicates() {
        let mut fs = init_test_environment("dupes", 10240);
        let volume = fs.volume_mut().unwrap();
        let a = volume.create_if_absent(&name("a")).unwrap();
        let b = volume.create_if_absent(&name("b")).unwrap();
        volume.rename(a, &name("b")).unwrap();
        // closest to the root wins
        assert_eq!(volume.find_by_name(&name("b")).unwrap(), Some(b));
        assert_eq!(volume.find_by_name(&name("a")).unwrap(), None);
    }
}

use crate::{disk::MemoryDisks, fs::TinyFs};

/// a session with a freshly formatted in-memory volume already mounted
pub fn init_test_environment(disk_name: &str, size_bytes: u64) -> TinyFs<MemoryDisks> {
    let mut fs = TinyFs::new(MemoryDisks::new());
    fs.format(disk_name, size_bytes)
        .expect("Failed to format test volume");
    fs.mount(disk_name).expect("Failed to mount test volume");
    fs
}

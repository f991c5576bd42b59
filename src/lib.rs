pub mod cli_interface;
pub mod disk;
mod error;
mod fs;
pub mod mkfs;
pub mod mount;
pub mod utils;
pub use error::{FsError, Result};
pub use fs::*;

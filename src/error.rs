//! errors reported by the filesystem
use thiserror::Error;

use crate::fs::{BlockId, FileDescriptor};

/// every failure a filesystem operation can report
///
/// Operations never roll back: whatever was written before the failure
/// stays on the volume.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FsError {
    #[error("no volume is mounted")]
    NotMounted,
    #[error("a volume is already mounted")]
    AlreadyMounted,
    #[error("block {block} is corrupt: {reason}")]
    CorruptVolume { block: BlockId, reason: String },
    #[error("invalid volume size: {0}")]
    InvalidSize(String),
    #[error("invalid file name {0:?}")]
    InvalidName(String),
    #[error("invalid file descriptor {0}")]
    InvalidDescriptor(FileDescriptor),
    #[error("the open file table is full")]
    TooManyOpenFiles,
    #[error("not enough free blocks: {needed} needed, {free} free")]
    OutOfSpace { needed: u32, free: u32 },
    #[error("end of file reached")]
    EndOfFile,
    #[error("{0} not found")]
    NotFound(String),
    #[error("file {0:?} is read only")]
    ReadOnly(String),
    #[error("failed to encode block {block}: {reason}")]
    Encode { block: BlockId, reason: String },
    #[error("block device error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FsError>;

impl FsError {
    pub(crate) fn corrupt(block: BlockId, reason: impl Into<String>) -> Self {
        FsError::CorruptVolume {
            block,
            reason: reason.into(),
        }
    }
}

//! This module contains functions to calculate the size of different fs components

use crate::fs::BLOCK_HEADER_SIZE;

/// calculate usable bytes of a data block
/// # Arguments
/// - `block_size`: the size of a block
/// # Return
/// the payload size, block size minus the common header
/// # Example
/// ```
/// use tinyfs::utils::fs_size_calculator::payload_size;
/// assert_eq!(payload_size(256), 252);
/// ```
pub const fn payload_size(block_size: usize) -> usize {
    block_size - BLOCK_HEADER_SIZE
}

/// calculate how many data blocks hold `len` bytes
/// # Arguments
/// - `len`: the content length
/// - `payload_size`: usable bytes per data block
/// # Return
/// the number of blocks, an exact multiple of `payload_size` needs no extra block
/// # Example
/// ```
/// use tinyfs::utils::fs_size_calculator::blocks_needed;
/// assert_eq!(blocks_needed(540, 252), 3);
/// assert_eq!(blocks_needed(504, 252), 2);
/// assert_eq!(blocks_needed(0, 252), 0);
/// ```
pub const fn blocks_needed(len: usize, payload_size: usize) -> usize {
    len.div_ceil(payload_size)
}

/// calculate how many blocks fit a volume
/// # Arguments
/// - `size_bytes`: the requested volume size
/// - `block_size`: the size of a block
/// # Return
/// the block count, a trailing partial block is dropped
/// # Example
/// ```
/// use tinyfs::utils::fs_size_calculator::total_blocks;
/// assert_eq!(total_blocks(10240, 256), 40);
/// assert_eq!(total_blocks(10300, 256), 40);
/// ```
pub const fn total_blocks(size_bytes: u64, block_size: usize) -> u64 {
    size_bytes / block_size as u64
}

use serde::{de::DeserializeOwned, Serialize};

use crate::fs::{BlockHeader, BlockId, BlockKind, PointerWidth, BLOCK_HEADER_SIZE};

/// Trait for typed views over one raw block
///
/// A view only describes what follows the common header; the header is
/// written and checked here, with the pointer width of the volume.
/// Errors are plain reasons; the caller knows which block it was handling
/// and wraps them into [FsError](crate::FsError).
pub trait BlockCodec: Sized {
    /// the block type every encoded view of `Self` carries
    const KIND: BlockKind;

    /// the chain link stored in the header
    fn next(&self) -> Option<BlockId>;

    /// encode into `body`, the zero-filled rest of the block past the header
    fn encode_body(&self, body: &mut [u8]) -> Result<(), String>;

    fn decode_body(next: Option<BlockId>, body: &[u8]) -> Result<Self, String>;

    /// encode header and body into `block`, which is exactly one block long
    fn encode_into(&self, block: &mut [u8], width: PointerWidth) -> Result<(), String> {
        BlockHeader::new(Self::KIND, self.next()).encode_into(block, width)?;
        self.encode_body(&mut block[BLOCK_HEADER_SIZE..])
    }

    /// decode a whole block, anything but a `KIND` block with our magic fails
    fn decode_from(block: &[u8], width: PointerWidth) -> Result<Self, String> {
        let header = BlockHeader::decode_from(block, width)?;
        header.verify(Self::KIND)?;
        Self::decode_body(header.next, &block[BLOCK_HEADER_SIZE..])
    }
}

/// Trait for fixed-width bodies whose fields sit back to back
/// # Note
/// `bincode`'s legacy configuration writes integers little-endian at their
/// full width and arrays without a length prefix, which is exactly the
/// on-disk layout.
pub trait SerializeIntoBlock: Serialize + DeserializeOwned {
    /// serialize into the front of `block`
    /// # Returns
    /// The number of bytes written if successful
    fn serialize_into(&self, block: &mut [u8]) -> Result<usize, String> {
        let config = bincode::config::legacy();
        bincode::serde::encode_into_slice(self, block, config).map_err(|e| e.to_string())
    }

    /// deserialize from the front of `block`
    fn deserialize_from(block: &[u8]) -> Result<Self, String> {
        let config = bincode::config::legacy();
        bincode::serde::decode_from_slice(block, config)
            .map(|(object, _bytes_read)| object)
            .map_err(|e| e.to_string())
    }
}

//! the common block header and the two views that carry nothing else:
//! data blocks and free blocks
use super::{BlockId, BLOCK_HEADER_SIZE, MAGIC, MAX_NARROW_BLOCKS};
use crate::utils::traits::BlockCodec;

/// tag stored in the first byte of every block
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlockKind {
    SuperBlock = 1,
    Inode = 2,
    Data = 3,
    Free = 4,
}

impl From<BlockKind> for u8 {
    fn from(kind: BlockKind) -> Self {
        kind as u8
    }
}

impl TryFrom<u8> for BlockKind {
    type Error = String;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(BlockKind::SuperBlock),
            2 => Ok(BlockKind::Inode),
            3 => Ok(BlockKind::Data),
            4 => Ok(BlockKind::Free),
            other => Err(format!("unknown block type {other}")),
        }
    }
}

/// how wide the `next` pointer of a block header is on one volume
///
/// Small volumes keep the one-byte pointer with `0xFF` as none. Volumes of
/// more than [MAX_NARROW_BLOCKS] blocks use bytes 2 and 3 as a little-endian
/// `u16`, `0xFFFF` being none.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerWidth {
    Narrow,
    Wide,
}

impl PointerWidth {
    const NARROW_NONE: u8 = 0xFF;
    const WIDE_NONE: u16 = 0xFFFF;

    pub fn for_volume(total_blocks: BlockId) -> Self {
        if total_blocks as u64 <= MAX_NARROW_BLOCKS {
            PointerWidth::Narrow
        } else {
            PointerWidth::Wide
        }
    }

    fn encode(self, next: Option<BlockId>, raw: &mut [u8]) -> Result<(), String> {
        match self {
            PointerWidth::Narrow => {
                raw[0] = match next {
                    None => Self::NARROW_NONE,
                    Some(id) => u8::try_from(id)
                        .ok()
                        .filter(|raw| *raw != Self::NARROW_NONE)
                        .ok_or_else(|| format!("block {id} does not fit a one byte pointer"))?,
                };
                raw[1] = 0;
            }
            PointerWidth::Wide => {
                let id = match next {
                    None => Self::WIDE_NONE,
                    Some(id) => u16::try_from(id)
                        .ok()
                        .filter(|raw| *raw != Self::WIDE_NONE)
                        .ok_or_else(|| format!("block {id} does not fit a two byte pointer"))?,
                };
                raw.copy_from_slice(&id.to_le_bytes());
            }
        }
        Ok(())
    }

    fn decode(self, raw: &[u8]) -> Option<BlockId> {
        match self {
            // byte 3 is reserved
            PointerWidth::Narrow => match raw[0] {
                Self::NARROW_NONE => None,
                id => Some(id as BlockId),
            },
            PointerWidth::Wide => match u16::from_le_bytes([raw[0], raw[1]]) {
                Self::WIDE_NONE => None,
                id => Some(id as BlockId),
            },
        }
    }
}

/// first four bytes of every block: type, magic number and `next`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub kind: BlockKind,
    pub magic: u8,
    /// next block of whichever chain this block belongs to
    pub next: Option<BlockId>,
}

impl BlockHeader {
    pub fn new(kind: BlockKind, next: Option<BlockId>) -> Self {
        Self {
            kind,
            magic: MAGIC,
            next,
        }
    }

    pub fn encode_into(&self, block: &mut [u8], width: PointerWidth) -> Result<(), String> {
        if block.len() < BLOCK_HEADER_SIZE {
            return Err(format!("a block of {} bytes cannot hold a header", block.len()));
        }
        block[0] = self.kind.into();
        block[1] = self.magic;
        width.encode(self.next, &mut block[2..BLOCK_HEADER_SIZE])
    }

    pub fn decode_from(block: &[u8], width: PointerWidth) -> Result<Self, String> {
        if block.len() < BLOCK_HEADER_SIZE {
            return Err(format!("a block of {} bytes cannot hold a header", block.len()));
        }
        Ok(Self {
            kind: BlockKind::try_from(block[0])?,
            magic: block[1],
            next: width.decode(&block[2..BLOCK_HEADER_SIZE]),
        })
    }

    /// check magic number and block type against what the reader expects
    pub fn verify(&self, expected: BlockKind) -> Result<(), String> {
        if self.magic != MAGIC {
            return Err(format!(
                "bad magic number {:#04x}, expected {MAGIC:#04x}",
                self.magic
            ));
        }
        if self.kind != expected {
            return Err(format!(
                "found a {:?} block where a {expected:?} block was expected",
                self.kind
            ));
        }
        Ok(())
    }
}

/// `i32` block pointers of the superblock and inodes, `-1` meaning none
pub(crate) mod pointer {
    use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serializer};

    use crate::fs::BlockId;

    const NONE: i32 = -1;

    pub fn serialize<S: Serializer>(ptr: &Option<BlockId>, s: S) -> Result<S::Ok, S::Error> {
        let raw = match *ptr {
            None => NONE,
            Some(id) => i32::try_from(id).map_err(S::Error::custom)?,
        };
        s.serialize_i32(raw)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<BlockId>, D::Error> {
        match i32::deserialize(d)? {
            NONE => Ok(None),
            raw => BlockId::try_from(raw)
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid block pointer {raw}"))),
        }
    }
}

/// one link of a file's content chain
///
/// Data blocks don't know which inode owns them, ownership is only chain
/// membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    next: Option<BlockId>,
    pub payload: Vec<u8>,
}

impl DataBlock {
    pub fn new(next: Option<BlockId>, payload: &[u8]) -> Self {
        Self {
            next,
            payload: payload.to_vec(),
        }
    }
}

impl BlockCodec for DataBlock {
    const KIND: BlockKind = BlockKind::Data;

    fn next(&self) -> Option<BlockId> {
        self.next
    }

    fn encode_body(&self, body: &mut [u8]) -> Result<(), String> {
        if self.payload.len() > body.len() {
            return Err(format!(
                "payload of {} bytes does not fit {} bytes",
                self.payload.len(),
                body.len()
            ));
        }
        body[..self.payload.len()].copy_from_slice(&self.payload);
        Ok(())
    }

    fn decode_body(next: Option<BlockId>, body: &[u8]) -> Result<Self, String> {
        Ok(Self::new(next, body))
    }
}

/// one link of the free list, everything past the header is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
    next: Option<BlockId>,
}

impl FreeBlock {
    pub fn new(next: Option<BlockId>) -> Self {
        Self { next }
    }
}

impl BlockCodec for FreeBlock {
    const KIND: BlockKind = BlockKind::Free;

    fn next(&self) -> Option<BlockId> {
        self.next
    }

    fn encode_body(&self, _body: &mut [u8]) -> Result<(), String> {
        Ok(())
    }

    fn decode_body(next: Option<BlockId>, _body: &[u8]) -> Result<Self, String> {
        Ok(Self::new(next))
    }
}

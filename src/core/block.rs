//! Heap block records
//!
//! A block record describes one contiguous region managed by the kernel heap
//! allocator. The allocator dumps its block list in two layouts that share the
//! same 18 field bytes:
//!
//! ```text
//! offset  len  field
//!      0    8  size         (LE u64)
//!      8    1  is_free      (bool byte)
//!      9    8  address      (LE u64)
//!     17    1  is_reusable  (bool byte)
//!     18   14  reserved     (raw heap.raw dumps only)
//! ```

use serde::{Deserialize, Serialize};

/// Size of one record in a raw `heap.raw` dump
pub const RAW_RECORD_SIZE: usize = 0x20;

/// Size of one record in a framed serial dump (no reserved tail)
pub const FRAMED_RECORD_SIZE: usize = 18;

const SIZE_OFFSET: usize = 0;
const FREE_OFFSET: usize = 8;
const ADDRESS_OFFSET: usize = 9;
const REUSABLE_OFFSET: usize = 17;

/// Common view over anything describing an address interval on the heap
///
/// Implemented by decoded [`BlockRecord`]s and by rows loaded from a tabular
/// block list, so the adjacency analysis works on either.
pub trait HeapBlock {
    /// Start address of the block
    fn address(&self) -> u64;

    /// Number of bytes the block spans
    fn size(&self) -> u64;

    /// Whether the block sits on a free list
    fn is_free(&self) -> bool;

    /// Whether the allocator may hand the block out again without merging
    fn is_reusable(&self) -> bool {
        false
    }

    /// Exclusive end of `[address, end)`, saturating at `u64::MAX`
    fn end(&self) -> u64 {
        self.address().saturating_add(self.size())
    }

    /// Check if `address` falls inside this block
    fn contains_address(&self, address: u64) -> bool {
        address >= self.address() && address < self.end()
    }

    /// Check if the two blocks share a boundary (either side)
    fn is_adjacent<B: HeapBlock + ?Sized>(&self, other: &B) -> bool
    where
        Self: Sized,
    {
        self.end() == other.address() || other.end() == self.address()
    }
}

/// One decoded block of allocator metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockRecord {
    pub size: u64,
    pub is_free: bool,
    pub address: u64,
    pub is_reusable: bool,
}

impl BlockRecord {
    pub fn new(address: u64, size: u64, is_free: bool, is_reusable: bool) -> Self {
        BlockRecord {
            size,
            is_free,
            address,
            is_reusable,
        }
    }

    /// Exclusive end address, or `None` if `address + size` overflows
    pub fn checked_end(&self) -> Option<u64> {
        self.address.checked_add(self.size)
    }

    /// Decode the shared 18 field bytes.
    ///
    /// Flag bytes are returned untouched so callers can apply the flag rule of
    /// their dump layout.
    pub(crate) fn fields_from_bytes(bytes: &[u8; FRAMED_RECORD_SIZE]) -> RawFields {
        let mut size = [0u8; 8];
        size.copy_from_slice(&bytes[SIZE_OFFSET..SIZE_OFFSET + 8]);

        let mut address = [0u8; 8];
        address.copy_from_slice(&bytes[ADDRESS_OFFSET..ADDRESS_OFFSET + 8]);

        RawFields {
            size: u64::from_le_bytes(size),
            free: bytes[FREE_OFFSET],
            address: u64::from_le_bytes(address),
            reusable: bytes[REUSABLE_OFFSET],
        }
    }

    /// Decode a raw dump record (flags are true when nonzero)
    pub fn from_raw_bytes(bytes: &[u8; RAW_RECORD_SIZE]) -> Self {
        let mut head = [0u8; FRAMED_RECORD_SIZE];
        head.copy_from_slice(&bytes[..FRAMED_RECORD_SIZE]);
        let fields = Self::fields_from_bytes(&head);

        BlockRecord {
            size: fields.size,
            is_free: fields.free != 0,
            address: fields.address,
            is_reusable: fields.reusable != 0,
        }
    }

    /// Decode a framed serial record (flags are true only when exactly 1)
    pub fn from_framed_bytes(bytes: &[u8; FRAMED_RECORD_SIZE]) -> Self {
        let fields = Self::fields_from_bytes(bytes);

        BlockRecord {
            size: fields.size,
            is_free: fields.free == 1,
            address: fields.address,
            is_reusable: fields.reusable == 1,
        }
    }

    /// Serialize to the 18-byte framed layout
    pub fn to_framed_bytes(&self) -> [u8; FRAMED_RECORD_SIZE] {
        let mut bytes = [0u8; FRAMED_RECORD_SIZE];

        bytes[SIZE_OFFSET..SIZE_OFFSET + 8].copy_from_slice(&self.size.to_le_bytes());
        bytes[FREE_OFFSET] = self.is_free as u8;
        bytes[ADDRESS_OFFSET..ADDRESS_OFFSET + 8].copy_from_slice(&self.address.to_le_bytes());
        bytes[REUSABLE_OFFSET] = self.is_reusable as u8;

        bytes
    }

    /// Serialize to the 32-byte raw layout with a zeroed reserved tail
    pub fn to_raw_bytes(&self) -> [u8; RAW_RECORD_SIZE] {
        let mut bytes = [0u8; RAW_RECORD_SIZE];
        bytes[..FRAMED_RECORD_SIZE].copy_from_slice(&self.to_framed_bytes());
        bytes
    }
}

impl HeapBlock for BlockRecord {
    fn address(&self) -> u64 {
        self.address
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn is_free(&self) -> bool {
        self.is_free
    }

    fn is_reusable(&self) -> bool {
        self.is_reusable
    }
}

impl std::fmt::Display for BlockRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "size: {} free: {} addr: {:#x} can reuse: {}",
            self.size, self.is_free, self.address, self.is_reusable
        )
    }
}

/// Undecoded field values of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawFields {
    pub size: u64,
    pub free: u8,
    pub address: u64,
    pub reusable: u8,
}

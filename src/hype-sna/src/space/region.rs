//! Address ranges owned by blocks

use serde::Serialize;

/// Half-open virtual range `[start, end)` owned by one block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub start: u32,
    /// Exclusive end; may equal 2^32 for a block ending at the top of memory
    pub end: u64,
    /// Index of the owning block in the address space
    pub block: usize,
}

impl Region {
    pub fn size(&self) -> usize {
        (self.end - u64::from(self.start)) as usize
    }

    #[inline]
    pub fn contains(&self, address: u32) -> bool {
        address >= self.start && u64::from(address) < self.end
    }

    /// Local offset of `address`, if inside
    pub fn offset_of(&self, address: u32) -> Option<usize> {
        self.contains(address)
            .then(|| (address - self.start) as usize)
    }
}

/// A virtual address resolved to its owning block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub address: u32,
    /// Index of the owning block in the address space
    pub block: usize,
    /// Offset into the block's decompressed bytes
    pub offset: usize,
    /// Bytes left in the block from `offset`
    pub remaining: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_bounds() {
        let region = Region {
            start: 0x1000_0000,
            end: 0x1000_0010,
            block: 0,
        };
        assert_eq!(region.size(), 16);
        assert!(region.contains(0x1000_0000));
        assert!(region.contains(0x1000_000F));
        assert!(!region.contains(0x1000_0010));
        assert!(!region.contains(0x0FFF_FFFF));
        assert_eq!(region.offset_of(0x1000_0004), Some(4));
        assert_eq!(region.offset_of(0x1000_0010), None);
    }

    #[test]
    fn test_region_at_top_of_memory() {
        let region = Region {
            start: 0xFFFF_FFF0,
            end: 1 << 32,
            block: 3,
        };
        assert!(region.contains(u32::MAX));
        assert_eq!(region.size(), 16);
    }
}

//! Address Source Trait
//!
//! Read access to a laid-out address space. Record decoders depend on this
//! trait rather than on a concrete block list.

use byteorder::{ByteOrder, LE};

use super::{Region, Resolved};
use crate::block::Block;
use crate::pointer::Word;
use crate::{Error, Result};

/// Anything that can answer "which block owns this virtual address"
pub trait AddressSource: Send + Sync {
    /// Blocks in layout order
    fn blocks(&self) -> &[Block];

    /// Regions in layout order, one per block
    fn regions(&self) -> &[Region];

    /// Find the region containing the given address
    ///
    /// The default is a linear scan; implementors with many blocks should
    /// override it.
    fn find_region(&self, address: u32) -> Option<&Region> {
        self.regions().iter().find(|r| r.contains(address))
    }

    /// Resolve an address to its block and local offset
    fn resolve(&self, address: u32) -> Result<Resolved> {
        let region = self
            .find_region(address)
            .ok_or(Error::UnresolvedAddress(address))?;
        let offset = (address - region.start) as usize;
        Ok(Resolved {
            address,
            block: region.block,
            offset,
            remaining: region.size() - offset,
        })
    }

    /// Bytes from `address` to the end of its block
    fn tail(&self, address: u32) -> Result<&[u8]> {
        let resolved = self.resolve(address)?;
        Ok(&self.blocks()[resolved.block].data[resolved.offset..])
    }

    /// Exactly `len` bytes at `address` for a record of the named kind
    fn read_span(&self, kind: &'static str, address: u32, len: usize) -> Result<&[u8]> {
        let tail = self.tail(address)?;
        if tail.len() < len {
            return Err(Error::TruncatedRecord {
                kind,
                address,
                needed: len,
                available: tail.len(),
            });
        }
        Ok(&tail[..len])
    }

    fn read_u32(&self, address: u32) -> Result<u32> {
        Ok(LE::read_u32(self.read_span("u32", address, 4)?))
    }

    /// Read and classify a 32-bit field
    fn read_word(&self, address: u32) -> Result<Word> {
        self.read_u32(address).map(Word::classify)
    }

    /// NUL-terminated string at `address`, cut at `max_len` bytes or the block end
    fn read_cstring(&self, address: u32, max_len: usize) -> Result<String> {
        let tail = self.tail(address)?;
        let text = tail.split(|&b| b == 0).next().unwrap_or_default();
        Ok(String::from_utf8_lossy(&text[..text.len().min(max_len)]).into_owned())
    }
}

//! Typed record layouts
//!
//! Each record is a fixed-size little-endian layout read from a resolved
//! virtual address. Pointer fields are returned as classified [`Word`]s and
//! never followed here; following them is the caller's decision.

mod behavior;
mod brain;
mod dsgvar;
mod mind;
mod model;
mod node;
mod perso;
mod scene;
mod script;

pub use behavior::Behavior;
pub use brain::Brain;
pub use dsgvar::{DsgVarInfo, DsgVarTable, DsgVarType, DsgVarValue, DsgVariable, RefKind};
pub use mind::Mind;
pub use model::Model;
pub use node::{NodeKind, ScriptNode, ScriptTree, ScriptTreeNode};
pub use perso::{Character, StandardGame};
pub use scene::{SceneGraphNode, Spawner, SPAWNER_SIZE};
pub use script::{Macro, Script};

pub(crate) use dsgvar::read_table as read_dsg_table;
pub(crate) use node::read_tree as read_script_tree;
pub(crate) use scene::read_spawners;

use byteorder::{ByteOrder, LE};
use tracing::warn;

use crate::pointer::Word;
use crate::space::AddressSource;
use crate::{Error, Result};

/// A fixed-size record layout
pub trait Record: Sized {
    /// Name used in errors and listings
    const KIND: &'static str;

    /// Size in bytes
    const SIZE: usize;

    /// Parse from exactly [`Self::SIZE`] bytes located at `address`
    fn parse(address: u32, bytes: &[u8]) -> Self;

    /// Parse after checking the slice is long enough
    fn from_bytes(address: u32, bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::TruncatedRecord {
                kind: Self::KIND,
                address,
                needed: Self::SIZE,
                available: bytes.len(),
            });
        }
        Ok(Self::parse(address, &bytes[..Self::SIZE]))
    }
}

/// Sequential little-endian field reader over one record's bytes
pub(crate) struct FieldReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn u8(&mut self) -> u8 {
        let v = self.bytes[self.pos];
        self.pos += 1;
        v
    }

    pub(crate) fn u16(&mut self) -> u16 {
        let v = LE::read_u16(&self.bytes[self.pos..]);
        self.pos += 2;
        v
    }

    pub(crate) fn u32(&mut self) -> u32 {
        let v = LE::read_u32(&self.bytes[self.pos..]);
        self.pos += 4;
        v
    }

    pub(crate) fn word(&mut self) -> Word {
        Word::classify(self.u32())
    }

    pub(crate) fn bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    pub(crate) fn skip(&mut self, n: usize) {
        self.pos += n;
    }
}

/// A count-prefixed array decoded entry by entry
#[derive(Debug)]
pub struct ArrayDecode<T> {
    pub address: u32,
    /// Entry count the caller asked for
    pub requested: usize,
    pub items: Vec<T>,
    /// Set when the owning block ended before `requested` entries
    pub truncated: Option<Error>,
}

impl<T> ArrayDecode<T> {
    pub fn is_complete(&self) -> bool {
        self.truncated.is_none()
    }
}

/// Decode one record at `address`
pub(crate) fn decode<T, S>(source: &S, address: u32) -> Result<T>
where
    T: Record,
    S: AddressSource + ?Sized,
{
    let bytes = source.read_span(T::KIND, address, T::SIZE)?;
    Ok(T::parse(address, bytes))
}

/// Decode up to `count` consecutive records starting at `address`
///
/// Entries that would run past the owning block are dropped and reported in
/// `truncated`. An unresolved start address fails the whole call.
pub(crate) fn decode_array<T, S>(source: &S, address: u32, count: usize) -> Result<ArrayDecode<T>>
where
    T: Record,
    S: AddressSource + ?Sized,
{
    if count == 0 {
        return Ok(ArrayDecode {
            address,
            requested: 0,
            items: Vec::new(),
            truncated: None,
        });
    }

    let tail = source.tail(address)?;
    let fit = tail.len() / T::SIZE;
    let n = count.min(fit);

    let items = tail
        .chunks_exact(T::SIZE)
        .take(n)
        .enumerate()
        .map(|(i, chunk)| T::parse(address.wrapping_add((i * T::SIZE) as u32), chunk))
        .collect();

    let truncated = (n < count).then(|| {
        let stop = address.wrapping_add((n * T::SIZE) as u32);
        warn!(
            kind = T::KIND,
            address = format_args!("0x{:08x}", address),
            requested = count,
            decoded = n,
            "Array runs past end of block"
        );
        Error::TruncatedRecord {
            kind: T::KIND,
            address: stop,
            needed: T::SIZE,
            available: tail.len() - n * T::SIZE,
        }
    });

    Ok(ArrayDecode {
        address,
        requested: count,
        items,
        truncated,
    })
}

/// Serialize record addresses as `0x`-prefixed hex
pub(crate) fn hex_u32<S: serde::Serializer>(value: &u32, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&format!("0x{:08x}", value))
}

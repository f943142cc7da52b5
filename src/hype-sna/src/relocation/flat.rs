//! Flat `(offset, value)` patch tables

use byteorder::{ByteOrder, LE};
use serde::Serialize;

use crate::{Error, Result};

/// Bytes per flat entry
pub const FLAT_ENTRY_SIZE: usize = 8;

/// Overwrite the 4 bytes at virtual address `offset` with `value`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatchEntry {
    pub offset: u32,
    pub value: u32,
}

impl PatchEntry {
    pub const fn new(offset: u32, value: u32) -> Self {
        Self { offset, value }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatTable {
    entries: Vec<PatchEntry>,
}

impl FlatTable {
    pub fn new(entries: Vec<PatchEntry>) -> Self {
        Self { entries }
    }

    /// Parse a table spanning the whole byte slice
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % FLAT_ENTRY_SIZE != 0 {
            return Err(Error::MalformedPatchTable(format!(
                "length {} is not a multiple of {}",
                bytes.len(),
                FLAT_ENTRY_SIZE
            )));
        }

        let entries = bytes
            .chunks_exact(FLAT_ENTRY_SIZE)
            .map(|chunk| PatchEntry {
                offset: LE::read_u32(&chunk[0..4]),
                value: LE::read_u32(&chunk[4..8]),
            })
            .collect();

        Ok(Self { entries })
    }

    /// Parse exactly `count` entries from the head of `bytes`
    ///
    /// Bytes past the declared entries are ignored.
    pub fn parse_counted(bytes: &[u8], count: usize) -> Result<Self> {
        let needed = count
            .checked_mul(FLAT_ENTRY_SIZE)
            .ok_or_else(|| Error::MalformedPatchTable(format!("count {} overflows", count)))?;
        if bytes.len() < needed {
            return Err(Error::MalformedPatchTable(format!(
                "declares {} entries ({} bytes) but only {} bytes present",
                count,
                needed,
                bytes.len()
            )));
        }
        Self::parse(&bytes[..needed])
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * FLAT_ENTRY_SIZE);
        for entry in &self.entries {
            out.extend_from_slice(&entry.offset.to_le_bytes());
            out.extend_from_slice(&entry.value.to_le_bytes());
        }
        out
    }

    pub fn push(&mut self, entry: PatchEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[PatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<PatchEntry> for FlatTable {
    fn from_iter<I: IntoIterator<Item = PatchEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let table: FlatTable = [
            PatchEntry::new(0x1000_0004, 0x1000_0010),
            PatchEntry::new(0x1000_0020, 7),
        ]
        .into_iter()
        .collect();
        let bytes = table.to_bytes();
        assert_eq!(bytes.len(), 16);

        let parsed = FlatTable::parse(&bytes).unwrap();
        assert_eq!(parsed, table);
        assert_eq!(parsed.entries()[1].value, 7);
    }

    #[test]
    fn test_ragged_length_is_malformed() {
        let err = FlatTable::parse(&[0u8; 13]).unwrap_err();
        assert!(matches!(err, Error::MalformedPatchTable(_)));
        assert!(FlatTable::parse(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_parse_counted() {
        let mut bytes = FlatTable::new(vec![PatchEntry::new(1, 2), PatchEntry::new(3, 4)]).to_bytes();
        bytes.extend_from_slice(&[0xEE; 5]);

        let one = FlatTable::parse_counted(&bytes, 1).unwrap();
        assert_eq!(one.entries(), &[PatchEntry::new(1, 2)]);
        assert_eq!(FlatTable::parse_counted(&bytes, 2).unwrap().len(), 2);
        assert!(matches!(
            FlatTable::parse_counted(&bytes, 3),
            Err(Error::MalformedPatchTable(_))
        ));
    }
}

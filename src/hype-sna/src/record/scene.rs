use serde::Serialize;

use super::{hex_u32, FieldReader, Record};
use crate::pointer::Word;
use crate::space::AddressSource;
use crate::Result;

/// Bytes per spawner entry
pub const SPAWNER_SIZE: usize = 0x20;

/// Scene graph root: points at the spawner list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneGraphNode {
    #[serde(serialize_with = "hex_u32")]
    pub address: u32,
    pub spawners: Word,
}

impl Record for SceneGraphNode {
    const KIND: &'static str = "SceneGraphNode";
    const SIZE: usize = 4;

    fn parse(address: u32, bytes: &[u8]) -> Self {
        let mut r = FieldReader::new(bytes);
        Self {
            address,
            spawners: r.word(),
        }
    }
}

/// One entry of a spawner list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spawner {
    #[serde(serialize_with = "hex_u32")]
    pub address: u32,
    /// Non-zero for live entries; zero ends the list
    pub tag: u32,
    pub perso: Word,
    pub reserved: [u32; 6],
}

impl Record for Spawner {
    const KIND: &'static str = "Spawner";
    const SIZE: usize = SPAWNER_SIZE;

    fn parse(address: u32, bytes: &[u8]) -> Self {
        let mut r = FieldReader::new(bytes);
        Self {
            address,
            tag: r.u32(),
            perso: r.word(),
            reserved: std::array::from_fn(|_| r.u32()),
        }
    }
}

/// Read spawners from `address` until a zero tag or the end of the block
pub(crate) fn read_spawners<S>(source: &S, address: u32) -> Result<Vec<Spawner>>
where
    S: AddressSource + ?Sized,
{
    let tail = source.tail(address)?;
    Ok(tail
        .chunks_exact(SPAWNER_SIZE)
        .enumerate()
        .map(|(i, chunk)| Spawner::parse(address.wrapping_add((i * SPAWNER_SIZE) as u32), chunk))
        .take_while(|s| s.tag != 0)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{session_from, Image};

    #[test]
    fn test_spawner_list_stops_at_zero_tag() {
        let mut image = Image::new(SPAWNER_SIZE * 4);
        image.put_u32(0, 1).put_u32(4, 0x1000_0100);
        image.put_u32(0x20, 2).put_u32(0x24, 0);
        image.put_u32(0x60, 3).put_u32(0x64, 0x1000_0200);
        let session = session_from(&[image.bytes]);

        let spawners = read_spawners(&session, 0x1000_0000).unwrap();
        assert_eq!(spawners.len(), 2);
        assert_eq!(spawners[0].perso, Word::Pointer(0x1000_0100));
        assert!(spawners[1].perso.is_null());
        assert_eq!(spawners[1].address, 0x1000_0020);
    }

    #[test]
    fn test_spawner_list_stops_at_block_end() {
        let mut image = Image::new(SPAWNER_SIZE + 8);
        image.put_u32(0, 9).put_u32(SPAWNER_SIZE, 9);
        let session = session_from(&[image.bytes]);
        assert_eq!(read_spawners(&session, 0x1000_0000).unwrap().len(), 1);
    }
}

use serde::Serialize;

use super::{hex_u32, FieldReader, Record};
use crate::pointer::Word;

/// Per-character AI state: model, current intelligences and variables
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mind {
    #[serde(serialize_with = "hex_u32")]
    pub address: u32,
    pub ai_model: Word,
    pub intelligence_normal: Word,
    pub intelligence_reflex: Word,
    /// Instance variable table
    pub dsg_mem: Word,
    pub name: Word,
    pub flags: [u8; 4],
}

impl Record for Mind {
    const KIND: &'static str = "Mind";
    const SIZE: usize = 24;

    fn parse(address: u32, bytes: &[u8]) -> Self {
        let mut r = FieldReader::new(bytes);
        Self {
            address,
            ai_model: r.word(),
            intelligence_normal: r.word(),
            intelligence_reflex: r.word(),
            dsg_mem: r.word(),
            name: r.word(),
            flags: r.bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Image;

    #[test]
    fn test_parse_mind() {
        let mut image = Image::new(24);
        image
            .put_u32(0, 0x1000_0300)
            .put_u32(12, 0x1000_0400)
            .put(20, &[1, 0, 2, 0]);
        let mind = Mind::parse(0x1000_0010, &image.bytes);
        assert_eq!(mind.ai_model, Word::Pointer(0x1000_0300));
        assert_eq!(mind.dsg_mem, Word::Pointer(0x1000_0400));
        assert!(mind.intelligence_normal.is_null());
        assert_eq!(mind.flags, [1, 0, 2, 0]);
    }
}

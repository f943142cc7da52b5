use serde::Serialize;

use super::{hex_u32, FieldReader, Record};
use crate::pointer::Word;

/// One normal or reflex behavior entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Behavior {
    #[serde(serialize_with = "hex_u32")]
    pub address: u32,
    pub name: Word,
    pub scripts: Word,
    pub script_count: u32,
    pub schedule: Word,
    pub flags: u32,
    pub flag_bytes: [u8; 4],
}

impl Record for Behavior {
    const KIND: &'static str = "Behavior";
    const SIZE: usize = 0x1C;

    fn parse(address: u32, bytes: &[u8]) -> Self {
        let mut r = FieldReader::new(bytes);
        let behavior = Self {
            address,
            name: r.word(),
            scripts: r.word(),
            script_count: r.u32(),
            schedule: r.word(),
            flags: r.u32(),
            flag_bytes: r.bytes(),
        };
        // Trailing 4 bytes are reserved
        r.skip(4);
        behavior
    }
}

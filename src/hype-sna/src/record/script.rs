use serde::Serialize;

use super::{hex_u32, FieldReader, Record};
use crate::pointer::Word;

/// Script list entry pointing at the first node of a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Script {
    #[serde(serialize_with = "hex_u32")]
    pub address: u32,
    pub root: Word,
    pub flag: u8,
}

impl Record for Script {
    const KIND: &'static str = "Script";
    const SIZE: usize = 8;

    fn parse(address: u32, bytes: &[u8]) -> Self {
        let mut r = FieldReader::new(bytes);
        Self {
            address,
            root: r.word(),
            flag: r.u8(),
        }
    }
}

/// Macro entry; names are not stored on this platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Macro {
    #[serde(serialize_with = "hex_u32")]
    pub address: u32,
    pub script: Word,
    pub script_current: Word,
}

impl Record for Macro {
    const KIND: &'static str = "Macro";
    const SIZE: usize = 8;

    fn parse(address: u32, bytes: &[u8]) -> Self {
        let mut r = FieldReader::new(bytes);
        Self {
            address,
            script: r.word(),
            script_current: r.word(),
        }
    }
}

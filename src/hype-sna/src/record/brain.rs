use serde::Serialize;

use super::{hex_u32, FieldReader, Record};
use crate::pointer::Word;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Brain {
    #[serde(serialize_with = "hex_u32")]
    pub address: u32,
    pub mind: Word,
    pub reserved: [u32; 2],
}

impl Record for Brain {
    const KIND: &'static str = "Brain";
    const SIZE: usize = 12;

    fn parse(address: u32, bytes: &[u8]) -> Self {
        let mut r = FieldReader::new(bytes);
        Self {
            address,
            mind: r.word(),
            reserved: [r.u32(), r.u32()],
        }
    }
}

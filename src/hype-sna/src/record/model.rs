use serde::Serialize;

use super::{hex_u32, FieldReader, Record};
use crate::pointer::Word;

/// An AI model shared by all characters of one kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Model {
    #[serde(serialize_with = "hex_u32")]
    pub address: u32,
    pub name: Word,
    pub behavior_count: u32,
    pub behaviors: Word,
    pub reflex_count: u32,
    pub reflexes: Word,
    pub macro_count: u32,
    pub macros: Word,
    /// Default variable table
    pub dsg_vars: Word,
    pub flags: u32,
}

impl Record for Model {
    const KIND: &'static str = "Model";
    const SIZE: usize = 36;

    fn parse(address: u32, bytes: &[u8]) -> Self {
        let mut r = FieldReader::new(bytes);
        Self {
            address,
            name: r.word(),
            behavior_count: r.u32(),
            behaviors: r.word(),
            reflex_count: r.u32(),
            reflexes: r.word(),
            macro_count: r.u32(),
            macros: r.word(),
            dsg_vars: r.word(),
            flags: r.u32(),
        }
    }
}

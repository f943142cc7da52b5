//! Fixture helpers shared by unit tests

use byteorder::{ByteOrder, LE};

use crate::container::{load, LoadOptions};
use crate::relocation::RelocationTable;
use crate::space::{AddressSpace, Session};
use crate::writer::ContainerWriter;
use crate::HeaderLayout;

/// Seal a session over stored full-layout blocks
pub(crate) fn session_from(blocks: &[Vec<u8>]) -> Session {
    let mut writer = ContainerWriter::new(HeaderLayout::Full);
    for data in blocks {
        writer.push_stored(data);
    }
    let report = load(&writer.finish(), &LoadOptions::default());
    AddressSpace::layout(report.blocks)
        .unwrap()
        .seal(&RelocationTable::default())
}

/// Seal a session over stored boot-layout blocks, given as
/// `(serialized_base, data)` pairs
pub(crate) fn boot_session_from(blocks: &[(u32, Vec<u8>)]) -> Session {
    let mut writer = ContainerWriter::new(HeaderLayout::Boot);
    for (local_id, (serialized_base, data)) in blocks.iter().enumerate() {
        writer
            .push_boot(*serialized_base, 0, local_id as u8, data, false)
            .unwrap();
    }
    let report = load(&writer.finish(), &LoadOptions::new(HeaderLayout::Boot));
    AddressSpace::layout(report.blocks)
        .unwrap()
        .seal(&RelocationTable::default())
}

/// Little-endian byte image built field by field
#[derive(Default)]
pub(crate) struct Image {
    pub bytes: Vec<u8>,
}

impl Image {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            bytes: vec![0u8; size],
        }
    }

    pub(crate) fn put_u32(&mut self, offset: usize, value: u32) -> &mut Self {
        LE::write_u32(&mut self.bytes[offset..offset + 4], value);
        self
    }

    pub(crate) fn put_u16(&mut self, offset: usize, value: u16) -> &mut Self {
        LE::write_u16(&mut self.bytes[offset..offset + 2], value);
        self
    }

    pub(crate) fn put(&mut self, offset: usize, bytes: &[u8]) -> &mut Self {
        self.bytes[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }
}
